//! Source of the reference instant used by recency-based signals.

use chrono::{DateTime, Utc};

/// Provide the current time.
///
/// Signals never read the wall clock directly; the engine asks its clock
/// once per request so every candidate is scored against the same instant.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use savour_core::{Clock, FixedClock};
///
/// let instant = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
/// assert_eq!(FixedClock::new(instant).now(), instant);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    /// Freeze the clock at `instant`.
    #[must_use]
    pub const fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
