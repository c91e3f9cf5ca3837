//! How long a lock acquisition may wait.

use std::time::{Duration, Instant};

/// Waiting policy for every lock acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockWait {
    /// Wait indefinitely.
    Blocking,
    /// Fail immediately if the lock is unavailable.
    NonBlocking,
    /// Wait up to the given duration, then fail with `LockTimeout`.
    Timeout(Duration),
}

impl Default for LockWait {
    fn default() -> Self {
        LockWait::Timeout(Duration::from_secs(10))
    }
}

impl From<Duration> for LockWait {
    fn from(timeout: Duration) -> Self {
        LockWait::Timeout(timeout)
    }
}

impl LockWait {
    /// Interpret a timeout in seconds: `None` blocks, zero (or less) never waits.
    ///
    /// A timeout too long for a `Duration` waits indefinitely.
    pub fn from_secs(secs: Option<f64>) -> Self {
        match secs {
            None => LockWait::Blocking,
            Some(s) if s.is_nan() || s <= 0.0 => LockWait::NonBlocking,
            Some(s) => match Duration::try_from_secs_f64(s) {
                Ok(d) => LockWait::Timeout(d),
                Err(_) => LockWait::Blocking,
            },
        }
    }

    /// The duration reported when a wait under this policy fails.
    pub fn reported_timeout(&self) -> Duration {
        match self {
            LockWait::Timeout(d) => *d,
            LockWait::Blocking | LockWait::NonBlocking => Duration::ZERO,
        }
    }

    /// Start the clock for a sequence of acquisitions sharing one budget.
    pub fn start(self) -> Deadline {
        let at = match self {
            LockWait::Timeout(d) => Instant::now().checked_add(d),
            _ => None,
        };
        Deadline { wait: self, at }
    }
}

/// A wait budget shared by several consecutive acquisitions.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    wait: LockWait,
    at: Option<Instant>,
}

impl Deadline {
    /// The policy for the next acquisition: whatever is left of the budget.
    ///
    /// An exhausted timeout degrades to a single non-blocking attempt.
    pub fn remaining(&self) -> LockWait {
        match (self.wait, self.at) {
            (LockWait::Timeout(_), Some(at)) => {
                let left = at.saturating_duration_since(Instant::now());
                if left.is_zero() {
                    LockWait::NonBlocking
                } else {
                    LockWait::Timeout(left)
                }
            }
            (other, _) => other,
        }
    }

    /// The policy this budget was started from.
    pub fn policy(&self) -> LockWait {
        self.wait
    }
}
