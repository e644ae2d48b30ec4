//! Transport abstraction.
//!
//! The engine only needs a reliable, ordered, per-owner channel. Framing
//! and retry are the implementor's concern.

use tokio::sync::mpsc;

use crate::error::{SyncError, SyncResult};
use crate::protocol::SyncMessage;

pub trait SyncTransport: Send + Sync {
    /// Hands a message to the remote side. An error means it was not sent.
    fn send(&self, message: SyncMessage) -> SyncResult<()>;
}

/// Transport backed by an unbounded tokio channel, for in-process mirrors.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<SyncMessage>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SyncMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SyncTransport for ChannelTransport {
    fn send(&self, message: SyncMessage) -> SyncResult<()> {
        self.tx.send(message).map_err(|_| SyncError::ChannelClosed)
    }
}

pub mod mock {
    //! Recording transport for tests.

    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::SyncTransport;
    use crate::error::{SyncError, SyncResult};
    use crate::protocol::SyncMessage;

    #[derive(Debug, Default)]
    pub struct MockTransport {
        sent: Mutex<Vec<SyncMessage>>,
        failing: AtomicBool,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every following send fail until reset.
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn sent(&self) -> Vec<SyncMessage> {
            self.sent.lock().clone()
        }

        pub fn sent_count(&self) -> usize {
            self.sent.lock().len()
        }

        pub fn take(&self) -> Vec<SyncMessage> {
            std::mem::take(&mut *self.sent.lock())
        }
    }

    impl SyncTransport for MockTransport {
        fn send(&self, message: SyncMessage) -> SyncResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(SyncError::Transport("mock transport offline".into()));
            }
            self.sent.lock().push(message);
            Ok(())
        }
    }
}
