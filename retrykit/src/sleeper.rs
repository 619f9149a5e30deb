//! Sleep capability used by back-off policies.

use parking_lot::Mutex;
use std::fmt;
use std::time::Duration;

/// Pauses the calling thread.
pub trait Sleeper: Send + Sync + fmt::Debug {
    /// Pause for `millis` milliseconds.
    fn sleep(&self, millis: u64);
}

/// Sleeper that blocks the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, millis: u64) {
        std::thread::sleep(Duration::from_millis(millis));
    }
}

/// Sleeper that records every requested pause and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    back_offs: Mutex<Vec<u64>>,
}

impl RecordingSleeper {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded pauses, oldest first.
    pub fn back_offs(&self) -> Vec<u64> {
        self.back_offs.lock().clone()
    }

    /// The most recent pause.
    pub fn last_back_off(&self) -> Option<u64> {
        self.back_offs.lock().last().copied()
    }

    /// Number of recorded pauses.
    pub fn count(&self) -> usize {
        self.back_offs.lock().len()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, millis: u64) {
        self.back_offs.lock().push(millis);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_recording_sleeper() {
        let sleeper = RecordingSleeper::new();
        assert_eq!(sleeper.last_back_off(), None);

        sleeper.sleep(10);
        sleeper.sleep(20);

        assert_eq!(sleeper.back_offs(), vec![10, 20]);
        assert_eq!(sleeper.last_back_off(), Some(20));
        assert_eq!(sleeper.count(), 2);
    }

    #[test]
    fn test_thread_sleeper_blocks() {
        let start = Instant::now();
        ThreadSleeper.sleep(5);
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
