//! Medium selection and the cross-instance receive path.
//!
//! A coordinator reaches other instances through exactly one medium,
//! chosen once at construction: the [`LogoutBus`] when it can be attached,
//! otherwise the [`SharedStorage`] sentinel protocol, otherwise nothing
//! (a standalone instance). Selection is never revisited and a failed bus
//! probe is never retried.
//!
//! Loop prevention is structural: the receive path calls back into the
//! coordinator's local notification only, so a received signal can never
//! be sent again. Signals carry the emitting instance's id, and each
//! receive path drops its own echoes; a signal reaches every instance
//! except the one that sent it.

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    bus::{BusEndpoint, LogoutBus},
    storage::{SharedStorage, StorageEvent},
};

/// Wire form of the logout signal, shared by both media.
pub const LOGOUT_TAG: &str = "logout";

/// Sentinel key used by the shared-storage fallback.
pub const LOGOUT_KEY: &str = "chantier-hub:logout";

/// Cross-instance logout signal. Carries no payload beyond its tag; the
/// origin exists so an instance can drop its own echo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoutSignal {
    /// Instance that emitted the signal, when known.
    pub origin: Option<Uuid>,
}

/// The medium selected for a coordinator at construction time.
#[derive(Debug)]
pub(crate) enum NotifyMedium {
    /// Primary: broadcast over the shared [`LogoutBus`].
    Bus(BusEndpoint),
    /// Fallback: sentinel write-then-remove in [`SharedStorage`].
    Storage(SharedStorage),
    /// Standalone instance; signals go nowhere.
    None,
}

impl NotifyMedium {
    /// Probes the primary, falling back permanently on failure.
    pub(crate) fn select(bus: Option<&LogoutBus>, storage: Option<&SharedStorage>) -> Self {
        if let Some(bus) = bus {
            match bus.attach() {
                Ok(endpoint) => return NotifyMedium::Bus(endpoint),
                Err(e) => {
                    warn!(error = %e, "logout bus unavailable, using shared-storage fallback");
                }
            }
        }
        match storage {
            Some(storage) => NotifyMedium::Storage(storage.clone()),
            None => NotifyMedium::None,
        }
    }

    /// Stable name of the selected medium, for logs and diagnostics.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            NotifyMedium::Bus(_) => "bus",
            NotifyMedium::Storage(_) => "storage",
            NotifyMedium::None => "none",
        }
    }

    /// Sends one logout signal to every other attached instance.
    pub(crate) fn send(&self, origin: Uuid) {
        match self {
            NotifyMedium::Bus(endpoint) => endpoint.send(LogoutSignal {
                origin: Some(origin),
            }),
            NotifyMedium::Storage(storage) => {
                // Sentinel protocol: the write is the signal, the removal
                // keeps the area clean. Receivers ignore the removal event.
                storage.set_tagged(LOGOUT_KEY, LOGOUT_TAG, Some(origin));
                storage.remove_tagged(LOGOUT_KEY, Some(origin));
            }
            NotifyMedium::None => {
                debug!("no notification medium attached, logout signal dropped");
            }
        }
    }

    /// Opens the receive side of the medium, if it has one. `own` is the
    /// instance id whose echoes the watch drops.
    pub(crate) fn watch(&self, own: Uuid) -> Option<LogoutWatch> {
        let source = match self {
            NotifyMedium::Bus(endpoint) => WatchSource::Bus(endpoint.subscribe()),
            NotifyMedium::Storage(storage) => WatchSource::Storage(storage.events()),
            NotifyMedium::None => return None,
        };
        Some(LogoutWatch { own, source })
    }
}

/// Receive side of a selected medium.
#[derive(Debug)]
pub(crate) struct LogoutWatch {
    own: Uuid,
    source: WatchSource,
}

#[derive(Debug)]
enum WatchSource {
    Bus(broadcast::Receiver<LogoutSignal>),
    Storage(broadcast::Receiver<StorageEvent>),
}

impl LogoutWatch {
    /// Waits for the next logout signal from another instance.
    ///
    /// Returns `None` once the medium is gone. A lagged receiver rejoins
    /// at the stream tail; dropped signals are acceptable, a wedged
    /// receive loop is not.
    pub(crate) async fn recv(&mut self) -> Option<LogoutSignal> {
        loop {
            let candidate = match &mut self.source {
                WatchSource::Bus(rx) => match rx.recv().await {
                    Ok(signal) => Some(signal),
                    Err(RecvError::Closed) => return None,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "logout receiver lagged, rejoining stream");
                        None
                    }
                },
                WatchSource::Storage(rx) => match rx.recv().await {
                    Ok(event) if is_logout_write(&event) => Some(LogoutSignal {
                        origin: event.origin,
                    }),
                    Ok(_) => None,
                    Err(RecvError::Closed) => return None,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "storage event receiver lagged, rejoining stream");
                        None
                    }
                },
            };
            match candidate {
                Some(signal) if signal.origin == Some(self.own) => continue,
                Some(signal) => return Some(signal),
                None => continue,
            }
        }
    }
}

/// The sentinel write event is the signal; its paired removal is not.
fn is_logout_write(event: &StorageEvent) -> bool {
    event.key == LOGOUT_KEY && event.new_value.as_deref() == Some(LOGOUT_TAG)
}
