//! Reasonable-time window for match timestamps.

use thiserror::Error;

/// No match predates this instant (epoch ms): the spectator network's launch.
pub const SYSTEM_EPOCH_MILLIS: i64 = 1_200_000_000_000;

/// How far past "now" a timestamp may lie (7 days, in ms).
pub const MAX_FUTURE_SKEW_MILLIS: i64 = 7 * 24 * 60 * 60 * 1000;

/// A timestamp outside the reasonable window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimeError {
    /// Negative epoch milliseconds.
    #[error("time {0} is negative")]
    Negative(i64),
    /// Before the system epoch.
    #[error("time {0} is before the system epoch")]
    BeforeEpoch(i64),
    /// More than a week after now.
    #[error("time {time} is more than a week after now ({now})")]
    TooFarInFuture {
        /// Offending timestamp.
        time: i64,
        /// Clock reading it was checked against.
        now: i64,
    },
}

/// Check that `time` lies inside the window relative to `now`.
pub fn check_reasonable_time(time: i64, now: i64) -> Result<(), TimeError> {
    if time < 0 {
        return Err(TimeError::Negative(time));
    }
    if time < SYSTEM_EPOCH_MILLIS {
        return Err(TimeError::BeforeEpoch(time));
    }
    if time > now.saturating_add(MAX_FUTURE_SKEW_MILLIS) {
        return Err(TimeError::TooFarInFuture { time, now });
    }
    Ok(())
}
