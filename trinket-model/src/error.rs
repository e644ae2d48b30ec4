//! Error types for layout parsing and registry operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Errors that can occur while loading slot layouts.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The declarative source is not valid JSON for a layout.
    #[error("layout parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A layout file or directory could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The definition resolves to zero slots.
    #[error("layout for `{key}` defines no slots")]
    NoSlots { key: String },

    /// The definition asks for more slots than a group may hold.
    #[error("layout for `{key}` defines {count} slots (max {max})", max = crate::layout::MAX_SLOTS)]
    TooManySlots { key: String, count: usize },

    /// A group key is empty or malformed.
    #[error("invalid group key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    /// An allow-list entry or classification is not a valid item/tag key.
    #[error("invalid item reference in `{key}`: {source}")]
    InvalidItem {
        key: String,
        #[source]
        source: trinket_types::Error,
    },
}
