//! Process-wide "session ended" signal.
//!
//! Views subscribe for as long as they are mounted; dropping the watch
//! unsubscribes. Watches only observe events emitted after they were
//! created, so an unmounted view never receives a stale logout.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

/// Why the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The backend rejected the stored credential.
    Unauthorized,
    /// The user signed out.
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEnded {
    pub reason: EndReason,
}

const CHANNEL_CAPACITY: usize = 16;

/// Broadcast subject for session lifecycle events.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEnded>,
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Delivers `event` to every live watch. Never blocks; a send with no
    /// listeners is dropped.
    pub fn emit(&self, event: SessionEnded) {
        let delivered = self.tx.send(event).unwrap_or(0);
        tracing::debug!(?event.reason, listeners = delivered, "session ended");
    }

    /// Starts watching for session events.
    pub fn subscribe(&self) -> SessionWatch {
        SessionWatch {
            rx: self.tx.subscribe(),
        }
    }

    /// Number of live watches.
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A subscription to [`SessionEvents`], released on drop.
#[derive(Debug)]
pub struct SessionWatch {
    rx: broadcast::Receiver<SessionEnded>,
}

impl SessionWatch {
    /// Drains pending events without waiting and returns the latest one.
    pub fn try_next(&mut self) -> Option<SessionEnded> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(event) => latest = Some(event),
                Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => return latest,
            }
        }
    }

    /// Waits for the next event. Returns `None` once every sender is gone.
    pub async fn next(&mut self) -> Option<SessionEnded> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
