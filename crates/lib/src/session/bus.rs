//! Primary cross-instance notification endpoint.
//!
//! The [`LogoutBus`] is the in-process analog of a named broadcast
//! channel: the application creates one bus and hands it to every client
//! instance, and a logout signal sent by any instance reaches all others
//! attached to the same bus. Attachment happens once, at coordinator
//! construction; a bus that has been closed refuses new attachments,
//! which pushes the coordinator onto the shared-storage fallback.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::broadcast;

use super::{error::SessionError, medium::LogoutSignal};

/// Capacity of the signal channel. Logout signals are rare and idempotent
/// on the receiving side, so a small buffer is plenty.
const BUS_CAPACITY: usize = 16;

/// Process-wide broadcast endpoint for logout signals.
///
/// Cloning yields another handle onto the same bus.
#[derive(Debug, Clone)]
pub struct LogoutBus {
    inner: Arc<BusInner>,
}

#[derive(Debug)]
struct BusInner {
    sender: broadcast::Sender<LogoutSignal>,
    closed: AtomicBool,
}

impl LogoutBus {
    /// Creates a new, open bus.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BUS_CAPACITY);
        Self {
            inner: Arc::new(BusInner {
                sender,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Closes the bus. Instances already attached keep exchanging signals;
    /// later attachment attempts fail and fall back to shared storage.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    /// Returns whether the bus has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Subscribes to the raw signal stream. Only signals sent after the
    /// call are delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<LogoutSignal> {
        self.inner.sender.subscribe()
    }

    #[cfg(test)]
    pub(crate) fn receiver_count(&self) -> usize {
        self.inner.sender.receiver_count()
    }

    /// Attaches a send/receive endpoint, the capability probe performed at
    /// coordinator construction.
    pub(crate) fn attach(&self) -> Result<BusEndpoint, SessionError> {
        if self.is_closed() {
            return Err(SessionError::BusClosed);
        }
        Ok(BusEndpoint {
            sender: self.inner.sender.clone(),
        })
    }
}

impl Default for LogoutBus {
    fn default() -> Self {
        Self::new()
    }
}

/// An attached endpoint on a [`LogoutBus`], held by a coordinator's
/// selected medium.
#[derive(Debug, Clone)]
pub(crate) struct BusEndpoint {
    sender: broadcast::Sender<LogoutSignal>,
}

impl BusEndpoint {
    /// Sends one signal to every attached instance.
    pub(crate) fn send(&self, signal: LogoutSignal) {
        // A lone instance broadcasts into the void; that is not an error.
        let _ = self.sender.send(signal);
    }

    /// Subscribes this endpoint to incoming signals.
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<LogoutSignal> {
        self.sender.subscribe()
    }
}
