//! Host-side integration for Trinket.
//!
//! [`Sessions`] ties the capability cache, the persistence worker and the
//! sync engine to owner lifecycle events. The `trinket` binary built from
//! this crate inspects and repairs record files offline.

mod config;
mod error;
pub mod report;
mod session;

pub use config::HostConfig;
pub use error::{SessionError, SessionResult};
pub use session::Sessions;
