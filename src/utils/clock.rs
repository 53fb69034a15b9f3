// src/utils/clock.rs
//! Time source for the validity date.
//!
//! "Today" is the only expiry mechanism a signed URL has, so it is passed in
//! explicitly instead of being read from the wall clock deep inside the
//! message builder.

use chrono::{FixedOffset, Local, NaiveDate, Utc};

/// Format of the validity date inside canonical messages.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Source of the current calendar day.
pub trait Clock: Send + Sync {
    /// Returns the current calendar day in the server's time zone.
    fn today(&self) -> NaiveDate;

    /// Returns today's date rendered as `YYYY-MM-DD`.
    fn today_string(&self) -> String {
        self.today().format(DATE_FORMAT).to_string()
    }
}

/// Wall clock, read either at a fixed UTC offset or in the host's local
/// time zone (which follows daylight saving).
#[derive(Clone, Copy, Debug)]
pub enum SystemClock {
    Fixed(FixedOffset),
    Local,
}

impl SystemClock {
    /// Builds a clock for the given offset from UTC, in minutes.
    ///
    /// Returns `None` when the offset is outside ±24h.
    pub fn with_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(SystemClock::Fixed)
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        match self {
            SystemClock::Fixed(offset) => Utc::now().with_timezone(offset).date_naive(),
            SystemClock::Local => Local::now().date_naive(),
        }
    }
}

/// Clock pinned to a single day. Used to simulate dates in tests and tools.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
