//! Consecutive-failure state behind the session-loss heuristic.

use std::sync::Mutex;

/// Default number of consecutive unauthorized responses that mark the
/// session as lost. One stray 401 (a race with logout in another
/// instance, a just-rotated cookie) stays quiet; two in a row do not.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 2;

/// Counts consecutive unauthorized responses on session-bearing paths.
///
/// Any successful response ends the streak. Reaching the threshold trips
/// the tracker, which restarts its count and leaves the reaction to the
/// caller.
#[derive(Debug)]
pub(crate) struct FailureTracker {
    threshold: u32,
    consecutive: Mutex<u32>,
}

impl FailureTracker {
    /// Creates a tracker tripping at `threshold`, clamped to at least 1.
    pub(crate) fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            consecutive: Mutex::new(0),
        }
    }

    /// Records a qualifying unauthorized response. Returns `true` when the
    /// streak reaches the threshold; the count restarts the moment it
    /// trips.
    pub(crate) fn record_unauthorized(&self) -> bool {
        let mut consecutive = self.consecutive.lock().unwrap();
        *consecutive += 1;
        if *consecutive >= self.threshold {
            *consecutive = 0;
            true
        } else {
            false
        }
    }

    /// Records a successful response, ending any streak.
    pub(crate) fn record_success(&self) {
        *self.consecutive.lock().unwrap() = 0;
    }

    #[cfg(test)]
    fn current(&self) -> u32 {
        *self.consecutive.lock().unwrap()
    }
}
