//! Millisecond clock anchored at cache construction
//!
//! Readings are the Unix time at construction plus monotonic elapsed time,
//! so deadlines never move when the wall clock is stepped.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy)]
pub(crate) struct Clock {
    origin: Instant,
    epoch_millis: u64,
}

impl Clock {
    pub(crate) fn new() -> Self {
        let epoch_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self {
            origin: Instant::now(),
            epoch_millis,
        }
    }

    /// Reading at construction
    pub(crate) fn start_millis(&self) -> u64 {
        self.epoch_millis
    }

    #[inline]
    pub(crate) fn now_millis(&self) -> u64 {
        self.epoch_millis + self.origin.elapsed().as_millis() as u64
    }
}
