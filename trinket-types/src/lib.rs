//! Core type definitions for Trinket.
//!
//! This crate defines the plain data types shared by every layer of the
//! equipment engine:
//! - Owner identifiers (UUID v7) and namespaced item/tag keys
//! - [`ItemStack`], the opaque "zero or one stack of an item" value
//! - [`CapabilityRecord`] / [`GroupRecord`], the versioned binary compound
//!   written to disk and pushed to remote mirrors
//! - [`Digest`], the SHA-256 used to detect unchanged records
//!
//! Game rules (groups, layouts, validation) live in `trinket-model`; this
//! crate knows nothing about them.

mod digest;
mod ids;
mod item;
mod record;

pub use digest::Digest;
pub use ids::{ItemId, OwnerId, TagKey};
pub use item::ItemStack;
pub use record::{CapabilityRecord, GroupRecord, RECORD_VERSION};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("record encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("record decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("unsupported record version {found} (newest known is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },
}
