//! Cooperative stop signal shared by the dispatcher and producer.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// One-shot flag that can be waited on with a deadline.
///
/// Raising it wakes every thread parked in [`wait_until`](Self::wait_until),
/// so a producer sleeping between emissions reacts immediately.
#[derive(Debug, Default)]
pub struct StopSignal {
    raised: Mutex<bool>,
    cond: Condvar,
}

impl StopSignal {
    /// Create a signal in the lowered state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Returns `false` if it was already raised.
    pub fn raise(&self) -> bool {
        let mut raised = self.raised.lock();
        if *raised {
            return false;
        }
        *raised = true;
        self.cond.notify_all();
        true
    }

    /// Whether the signal has been raised.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        *self.raised.lock()
    }

    /// Park until `deadline` or until raised. Returns `true` if raised.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let mut raised = self.raised.lock();
        while !*raised {
            if self.cond.wait_until(&mut raised, deadline).timed_out() {
                break;
            }
        }
        *raised
    }

    /// Park for at most `timeout`. Returns `true` if raised.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        self.wait_until(Instant::now() + timeout)
    }
}
