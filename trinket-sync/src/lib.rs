//! Diff-aware synchronization of equipment state to remote mirrors.
//!
//! The authoritative side pushes; the remote side only applies. There is no
//! merge: the latest push for an owner (or one of its groups) wins.
//!
//! ## Components
//!
//! - **Protocol**: the [`SyncMessage`] envelope and its payloads
//! - **Engine**: digest comparison and pushes through a [`SyncTransport`]
//! - **Mirror**: applies received messages to local mirror capabilities

mod config;
mod engine;
mod error;
mod mirror;
pub mod protocol;
mod tracker;
pub mod transport;

pub use config::SyncConfig;
pub use engine::{SyncEngine, SyncOutcome};
pub use error::{SyncError, SyncResult};
pub use mirror::RemoteMirror;
pub use protocol::{SyncMessage, SyncPayload};
pub use tracker::DigestTracker;
pub use transport::{ChannelTransport, SyncTransport};
