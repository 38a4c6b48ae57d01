//! Injected time source.
//!
//! Streak math never reads the wall clock itself; `today` is always passed in.
//! The engine only asks a [`Clock`] for creation timestamps.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Current local calendar day.
    fn today(&self) -> NaiveDate;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

/// Wall clock; days follow the machine's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Settable clock for tests and for replaying a specific day.
///
/// Each call to [`now`](Clock::now) advances the instant by one millisecond so
/// records created back to back still have distinct, ordered timestamps.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
    today: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        let now = today
            .and_hms_opt(12, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or_else(Utc::now);
        Self {
            now: Mutex::new(now),
            today: Mutex::new(today),
        }
    }

    /// Move to another day (noon UTC on that date).
    pub fn set_today(&self, today: NaiveDate) {
        if let Some(noon) = today.and_hms_opt(12, 0, 0) {
            *self.now.lock().unwrap_or_else(|e| e.into_inner()) = noon.and_utc();
        }
        *self.today.lock().unwrap_or_else(|e| e.into_inner()) = today;
    }

    pub fn set_now(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        let current = *now;
        *now = current + Duration::milliseconds(1);
        current
    }

    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap_or_else(|e| e.into_inner())
    }
}
