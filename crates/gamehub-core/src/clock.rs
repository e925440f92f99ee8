//! Clock abstraction for deterministic timestamps.

use chrono::{DateTime, Utc};

/// Source of "now" for progress writes (`earned_at`, `created_at`).
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
