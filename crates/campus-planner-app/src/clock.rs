//! Source of the current instant.

use std::cell::Cell;
use time::{Duration, OffsetDateTime};

/// Provides "now" to the task store and derived views.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<OffsetDateTime>,
}

impl ManualClock {
    /// Start at `now`.
    pub const fn new(now: OffsetDateTime) -> Self {
        Self { now: Cell::new(now) }
    }

    /// Move forward (or backward) by `by`.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Jump to `now`.
    pub fn set(&self, now: OffsetDateTime) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> OffsetDateTime {
        (**self).now()
    }
}
