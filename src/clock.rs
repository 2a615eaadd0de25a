//! Wall-clock access, isolated behind a trait.

use crate::types::Timestamp;
use chrono::Utc;

/// How far behind wall-clock `current_adjusted_timestamp` backs off, so the
/// initial scan does not skip blocks whose timestamps drifted slightly
/// ahead of the local clock.
pub const SAFETY_MARGIN_SECONDS: i64 = 3600;

/// External collaborator: wall-clock access, kept behind a trait so tests
/// can supply a fixed time instead of reading the real clock.
pub trait Clock: Send + Sync {
    /// Current UNIX time minus a small safety margin.
    fn current_adjusted_timestamp(&self) -> Timestamp;
}

/// Default [`Clock`] backed by the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn current_adjusted_timestamp(&self) -> Timestamp {
        let now = Utc::now().timestamp();
        (now - SAFETY_MARGIN_SECONDS).max(0) as Timestamp
    }
}

/// A clock that always reports the same timestamp. Useful for tests that
/// need `current_adjusted_timestamp` to be deterministic.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn current_adjusted_timestamp(&self) -> Timestamp {
        self.0
    }
}
