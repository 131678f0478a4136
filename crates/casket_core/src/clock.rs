//! Clock capability for deterministic tombstone timestamps.
//!
//! # Responsibility
//! - Isolate "current time" behind a trait so the tombstone stamper never
//!   reads ambient process time directly.
//!
//! # Invariants
//! - Stamped values are derived only from `Clock::now`; two runs with the
//!   same clock produce identical stamps.

use chrono::{Local, NaiveDateTime};

/// Source of the current date-time used when stamping timestamp flags.
pub trait Clock {
    /// Returns the current local date-time.
    fn now(&self) -> NaiveDateTime;
}

/// Wall-clock implementation used in production paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to one instant.
///
/// Used by tests and by callers that need replayable cascade output.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, FixedClock};
    use chrono::NaiveDate;

    #[test]
    fn fixed_clock_returns_pinned_instant() {
        let instant = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|date| date.and_hms_opt(12, 30, 0))
            .expect("valid fixture date");
        let clock = FixedClock(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.now(), clock.now());
    }
}
