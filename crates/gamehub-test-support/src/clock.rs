//! Test clock: deterministic `Clock` implementation for tests.

use chrono::{DateTime, Utc};
use gamehub_core::clock::Clock;

/// A clock frozen at one instant, so `earned_at` assertions are exact.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
