//! Session coordination across concurrent client instances.
//!
//! One application session can be open in several client instances at
//! once. This module keeps them agreed on whether the session still
//! exists: a [`SessionCoordinator`] fans session-expiry events out to
//! local subscribers and propagates logout signals to every other
//! instance through a notification medium selected once at construction
//! (the [`LogoutBus`] when available, the [`SharedStorage`] sentinel
//! protocol otherwise).

mod bus;
mod error;
mod medium;
mod storage;

pub use bus::LogoutBus;
pub use error::SessionError;
pub use medium::{LOGOUT_KEY, LOGOUT_TAG, LogoutSignal};
pub use storage::{SharedStorage, StorageEvent};

use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::sync::Notify;
use tracing::{debug, error, info};
use uuid::Uuid;

use medium::{LogoutWatch, NotifyMedium};

type Callback = Arc<dyn Fn() + Send + Sync + 'static>;

struct Subscriber {
    id: u64,
    callback: Callback,
}

/// Coordinates session-expiry notification for one client instance.
///
/// Cloning yields another handle onto the same coordinator; all clones
/// share one subscriber registry and one selected medium. Subscribers are
/// invoked synchronously, in registration order, and a subscriber that
/// panics never prevents the rest from running.
#[derive(Clone)]
pub struct SessionCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    /// Identifies this instance on the wire so its own echoes are dropped.
    instance_id: Uuid,
    subscribers: Mutex<Vec<Subscriber>>,
    next_subscriber_id: AtomicU64,
    medium: NotifyMedium,
    /// Wakes the receive loop when the last strong handle drops.
    shutdown: Arc<Notify>,
}

impl SessionCoordinator {
    /// Start building a coordinator. A coordinator built with no medium
    /// attached works standalone; its emissions stay local.
    pub fn builder() -> SessionCoordinatorBuilder {
        SessionCoordinatorBuilder {
            bus: None,
            storage: None,
        }
    }

    /// Registers `callback` to run on every session-expiry notification.
    ///
    /// Callbacks run in registration order. The registration lasts until
    /// the returned subscription is cancelled or dropped.
    #[must_use = "dropping the subscription immediately cancels it"]
    pub fn subscribe<F>(&self, callback: F) -> SessionSubscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.inner.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut subscribers = self.inner.subscribers.lock().unwrap();
            subscribers.push(Subscriber {
                id,
                callback: Arc::new(callback),
            });
        }
        debug!(subscriber = id, "session subscriber registered");
        SessionSubscription {
            id,
            coordinator: Arc::downgrade(&self.inner),
        }
    }

    /// Announces that the server no longer recognizes the session.
    ///
    /// Local subscribers run first, synchronously and in registration
    /// order; afterwards one logout signal goes out to the other
    /// instances.
    pub fn emit_session_expired(&self) {
        info!("session expired, notifying subscribers");
        notify_subscribers(&self.inner);
        self.inner.medium.send(self.inner.instance_id);
    }

    /// Announces a deliberate logout to the other instances.
    ///
    /// Local subscribers are not invoked; the caller has already handled
    /// its own state transition.
    pub fn emit_logout(&self) {
        debug!("propagating logout to other instances");
        self.inner.medium.send(self.inner.instance_id);
    }

    /// Stable name of the medium selected at construction (`"bus"`,
    /// `"storage"` or `"none"`), for logs and diagnostics.
    pub fn medium_kind(&self) -> &'static str {
        self.inner.medium.kind()
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().unwrap().len()
    }
}

impl std::fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("instance_id", &self.inner.instance_id)
            .field("medium", &self.inner.medium.kind())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl CoordinatorInner {
    fn remove_subscriber(&self, id: u64) {
        let mut subscribers = self.subscribers.lock().unwrap();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        if subscribers.len() < before {
            debug!(subscriber = id, "session subscriber removed");
        }
    }
}

impl Drop for CoordinatorInner {
    fn drop(&mut self) {
        // notify_one stores a permit, so a loop that has not been polled
        // yet still sees the shutdown.
        self.shutdown.notify_one();
    }
}

/// Runs every registered callback against a snapshot of the registry.
///
/// Snapshotting keeps reentrant subscribe/cancel calls from affecting the
/// in-flight notification; they apply to later emissions. Panics are
/// contained per callback.
fn notify_subscribers(inner: &CoordinatorInner) {
    let snapshot: Vec<Callback> = {
        let subscribers = inner.subscribers.lock().unwrap();
        subscribers.iter().map(|s| s.callback.clone()).collect()
    };
    for callback in snapshot {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback())) {
            error!(
                "session subscriber panicked: {}",
                panic_message(payload.as_ref())
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

/// Builder selecting the cross-instance medium for a coordinator.
#[derive(Debug, Default)]
pub struct SessionCoordinatorBuilder {
    bus: Option<LogoutBus>,
    storage: Option<SharedStorage>,
}

impl SessionCoordinatorBuilder {
    /// Offer the primary broadcast medium.
    pub fn bus(mut self, bus: &LogoutBus) -> Self {
        self.bus = Some(bus.clone());
        self
    }

    /// Offer the shared-storage fallback medium.
    pub fn storage(mut self, storage: &SharedStorage) -> Self {
        self.storage = Some(storage.clone());
        self
    }

    /// Probes the offered media and builds the coordinator. The selection
    /// made here is permanent for the coordinator's lifetime.
    pub fn build(self) -> SessionCoordinator {
        let instance_id = Uuid::new_v4();
        let medium = NotifyMedium::select(self.bus.as_ref(), self.storage.as_ref());
        info!(instance = %instance_id, medium = medium.kind(), "session coordinator ready");

        let watch = medium.watch(instance_id);
        let shutdown = Arc::new(Notify::new());
        let inner = Arc::new(CoordinatorInner {
            instance_id,
            subscribers: Mutex::new(Vec::new()),
            next_subscriber_id: AtomicU64::new(0),
            medium,
            shutdown: shutdown.clone(),
        });
        if let Some(watch) = watch {
            spawn_receive_loop(watch, Arc::downgrade(&inner), shutdown);
        }
        SessionCoordinator { inner }
    }
}

/// Forwards incoming signals to local subscribers.
///
/// The loop holds only a weak handle; dropping the last coordinator
/// clone fires the shutdown permit, so the loop exits without waiting
/// for another signal. It deliberately has no path back into the
/// medium, so a received signal is never re-sent.
fn spawn_receive_loop(mut watch: LogoutWatch, inner: Weak<CoordinatorInner>, shutdown: Arc<Notify>) {
    let task = async move {
        loop {
            tokio::select! {
                signal = watch.recv() => match signal {
                    Some(signal) => match inner.upgrade() {
                        Some(inner) => {
                            debug!(origin = ?signal.origin, "logout signal received");
                            notify_subscribers(&inner);
                        }
                        None => break,
                    },
                    None => break,
                },
                _ = shutdown.notified() => break,
            }
        }
    };

    // Spawn in the current runtime, or create one if needed
    if tokio::runtime::Handle::try_current().is_ok() {
        tokio::spawn(task);
    } else {
        std::thread::spawn(|| {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(task);
        });
    }
}

/// Opaque registration token returned by [`SessionCoordinator::subscribe`].
///
/// Cancellation is idempotent; cancelling an already-cancelled
/// subscription has no effect. Dropping the token cancels it.
#[derive(Debug)]
pub struct SessionSubscription {
    id: u64,
    coordinator: Weak<CoordinatorInner>,
}

impl SessionSubscription {
    /// Removes the registration. Later calls are no-ops.
    pub fn cancel(&self) {
        if let Some(inner) = self.coordinator.upgrade() {
            inner.remove_subscriber(self.id);
        }
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
