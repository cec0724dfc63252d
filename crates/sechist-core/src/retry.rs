//! Bounded retry with fixed backoff.

use std::time::Duration;

use tracing::warn;

use crate::domain::Result;

/// Blocking delay seam. Production code sleeps the thread; tests inject a
/// recording fake so retry and pacing logic runs instantly.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Run `op`, retrying up to `extra_attempts` more times on error with a
/// fixed `backoff` between attempts. After exhaustion the last error is
/// returned unchanged.
pub fn with_retry<T>(
    extra_attempts: u32,
    backoff: Duration,
    sleeper: &dyn Sleeper,
    mut op: impl FnMut() -> Result<T>,
) -> Result<T> {
    let mut failures = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if failures < extra_attempts => {
                failures += 1;
                warn!(
                    error = %e,
                    backoff_secs = backoff.as_secs(),
                    attempt = failures,
                    "query failed, retrying after backoff"
                );
                sleeper.sleep(backoff);
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Sleeper;
    use std::cell::RefCell;
    use std::time::Duration;

    /// Records requested delays instead of sleeping.
    pub struct RecordingSleeper {
        pub delays: RefCell<Vec<Duration>>,
    }

    impl RecordingSleeper {
        pub fn new() -> Self {
            RecordingSleeper {
                delays: RefCell::new(Vec::new()),
            }
        }
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.delays.borrow_mut().push(duration);
        }
    }
}
