//! Blocking delays.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::trace;

/// Something that can block the calling thread for a while.
pub trait Sleeper: std::fmt::Debug + Send {
    /// Block for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        trace!(?duration, "Sleeping");
        std::thread::sleep(duration);
    }
}

/// Records requested delays instead of sleeping.
///
/// Clones share the same record, so keep one clone and hand the other to
/// the connection.
///
/// # Examples
///
/// ```
/// use numerous_throttle::{RecordingSleeper, Sleeper};
/// use std::time::Duration;
///
/// let sleeper = RecordingSleeper::default();
/// let handle = sleeper.clone();
/// sleeper.sleep(Duration::from_secs(3));
/// assert_eq!(handle.sleeps(), vec![Duration::from_secs(3)]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    /// Every delay requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Sum of all requested delays.
    pub fn total(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(duration);
    }
}
