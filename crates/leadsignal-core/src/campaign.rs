//! Campaign calendar: maps wall-clock instants onto campaign weeks.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

/// A fixed-length campaign anchored at `start` (week 1, day 1).
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignCalendar {
    pub start: NaiveDate,
    pub timezone: Tz,
    pub total_weeks: u32,
}

impl CampaignCalendar {
    /// Calendar date of `now` in the campaign timezone.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    /// `clamp(ceil((days_since_start + 1) / 7), 1, total_weeks)`.
    ///
    /// Dates before the start clamp to week 1, dates after the last week clamp
    /// to the final week.
    pub fn week_for_date(&self, date: NaiveDate) -> u32 {
        let days_since_start = (date - self.start).num_days();
        let week = ((days_since_start + 1) as f64 / 7.0).ceil() as i64;
        week.clamp(1, i64::from(self.total_weeks.max(1))) as u32
    }

    pub fn current_week(&self, now: DateTime<Utc>) -> u32 {
        self.week_for_date(self.local_date(now))
    }

    /// First day (inclusive) of a trailing window of `days` days ending today.
    pub fn window_start(&self, now: DateTime<Utc>, days: i64) -> NaiveDate {
        self.local_date(now) - Duration::days(days)
    }
}
