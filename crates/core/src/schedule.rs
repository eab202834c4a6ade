//! Daily run schedule for background jobs.
//!
//! Schedules use the cron field order `minute hour day month weekday`, but
//! only daily schedules are supported: the last three fields must be `*`.
//! `@daily` and `@midnight` are accepted as aliases for `0 0 * * *`. All
//! times are UTC.

use chrono::{Duration, NaiveTime};

use crate::error::CoreError;
use crate::types::Timestamp;

/// A once-a-day fire time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    pub hour: u32,
    pub minute: u32,
}

impl DailySchedule {
    pub const MIDNIGHT: Self = Self { hour: 0, minute: 0 };

    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        if matches!(trimmed, "@daily" | "@midnight") {
            return Ok(Self::MIDNIGHT);
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(CoreError::Validation(format!(
                "Invalid schedule '{raw}': expected 5 fields (minute hour * * *)"
            )));
        }
        if fields[2..].iter().any(|f| *f != "*") {
            return Err(CoreError::Validation(format!(
                "Invalid schedule '{raw}': only daily schedules (minute hour * * *) are supported"
            )));
        }

        let minute = parse_field(fields[0], 59, "minute", raw)?;
        let hour = parse_field(fields[1], 23, "hour", raw)?;
        Ok(Self { hour, minute })
    }

    /// First fire time strictly after `now`.
    pub fn next_after(&self, now: Timestamp) -> Timestamp {
        let fire_time = NaiveTime::from_hms_opt(self.hour, self.minute, 0)
            .unwrap_or_default();
        let today = now.date_naive().and_time(fire_time).and_utc();
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }
}

fn parse_field(field: &str, max: u32, name: &str, raw: &str) -> Result<u32, CoreError> {
    field
        .parse::<u32>()
        .ok()
        .filter(|v| *v <= max)
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Invalid schedule '{raw}': {name} must be a number between 0 and {max}"
            ))
        })
}
