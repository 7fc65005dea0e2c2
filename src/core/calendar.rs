use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;

/// Civil-time policy for naming dated directories.
///
/// Upstream figures are published with a reporting lag, so the sources
/// fetched today describe `today - lag_days` in the provider's timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingCalendar {
    timezone: Tz,
    lag_days: u32,
}

impl Default for ReportingCalendar {
    fn default() -> Self {
        Self::new(chrono_tz::America::Montreal, 1)
    }
}

impl ReportingCalendar {
    pub fn new(timezone: Tz, lag_days: u32) -> Self {
        Self { timezone, lag_days }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn lag_days(&self) -> u32 {
        self.lag_days
    }

    pub fn today_at(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    pub fn report_date_at(&self, now: DateTime<Utc>) -> NaiveDate {
        let today = self.today_at(now);
        today
            .checked_sub_days(Days::new(u64::from(self.lag_days)))
            .unwrap_or(today)
    }

    pub fn today(&self) -> NaiveDate {
        self.today_at(Utc::now())
    }

    pub fn report_date(&self) -> NaiveDate {
        self.report_date_at(Utc::now())
    }
}
