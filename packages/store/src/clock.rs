//! Wall-clock access and the as-of rule for date-scoped requests.

use chrono::{NaiveDate, NaiveDateTime};

/// Source of "now" in the city's local time.
pub trait Clock: Send + Sync {
    /// The current local date-time.
    fn now(&self) -> NaiveDateTime;

    /// The current local date.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// The system clock, in the host's local timezone.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// A clock frozen at one instant.
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// The instant to request outages for when `date` is selected.
///
/// Past days are requested as of their last second (23:59:59) so the
/// snapshot covers the whole day; today and later are requested as of
/// `now`.
#[must_use]
pub fn as_of_for(date: NaiveDate, now: NaiveDateTime) -> NaiveDateTime {
    if date < now.date() {
        date.and_hms_opt(23, 59, 59).unwrap_or(now)
    } else {
        now
    }
}
