//! Wall-Clock Source
//!
//! Validation bounds timestamps against "now", and records carry a
//! last-updated time. Both read the clock through this trait so tests
//! can pin time.

use chrono::{DateTime, TimeZone, Utc};

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;

    /// Current time as epoch milliseconds.
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    millis: i64,
}

impl FixedClock {
    /// Freeze the clock at the given epoch milliseconds.
    pub fn at_millis(millis: i64) -> Self {
        Self { millis }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.millis)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    fn now_millis(&self) -> i64 {
        self.millis
    }
}
