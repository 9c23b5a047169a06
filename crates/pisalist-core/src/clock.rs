//! Time source for the services.
//!
//! Calendar-day views ("today", the trailing timeline) are evaluated in the
//! clock's UTC offset, so the clock returns an offset-aware instant rather
//! than a bare UTC one.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveTime, TimeZone, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }
}

/// Wall clock in the host's local offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let now = Local::now();
        now.with_timezone(now.offset())
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Local midnight of the day containing `at`, as a UTC instant.
pub fn start_of_day(at: DateTime<FixedOffset>) -> DateTime<Utc> {
    let midnight = at.date_naive().and_time(NaiveTime::MIN);
    let as_utc = midnight - Duration::seconds(i64::from(at.offset().local_minus_utc()));
    Utc.from_utc_datetime(&as_utc)
}

/// `[start, end)` of the calendar day containing `at`.
pub fn day_bounds(at: DateTime<FixedOffset>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_of_day(at);
    (start, start + Duration::days(1))
}
