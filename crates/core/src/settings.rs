//! Setting keys, defaults, and typed value parsing.
//!
//! Settings are stored as strings with a declared value type. Every key the
//! queue depends on has a default so the system works before any rows are
//! seeded.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::schedule::DailySchedule;

// ---------------------------------------------------------------------------
// Keys and defaults
// ---------------------------------------------------------------------------

/// Maximum active tickets per service date.
pub const KEY_MAX_TICKETS_PER_DAY: &str = "queue.max_tickets_per_day";
/// Days terminal tickets are kept before the cleanup job deletes them.
pub const KEY_CLEANUP_RETENTION_DAYS: &str = "queue.cleanup_retention_days";
/// Master switch for the daily enforcement job.
pub const KEY_CLEANUP_ENABLED: &str = "queue.cleanup_enabled";
/// Cron-like schedule for the daily enforcement job.
pub const KEY_CLEANUP_SCHEDULE: &str = "queue.cleanup_schedule";

pub const DEFAULT_MAX_TICKETS_PER_DAY: i64 = 10;
pub const DEFAULT_CLEANUP_RETENTION_DAYS: i64 = 7;
pub const DEFAULT_CLEANUP_ENABLED: bool = true;
pub const DEFAULT_CLEANUP_SCHEDULE: &str = "0 0 * * *";

pub const CATEGORY_QUEUE: &str = "queue";

// ---------------------------------------------------------------------------
// Value types
// ---------------------------------------------------------------------------

pub const TYPE_INT: &str = "int";
pub const TYPE_STRING: &str = "string";
pub const TYPE_BOOL: &str = "bool";
pub const TYPE_FLOAT: &str = "float";

pub const VALID_TYPES: &[&str] = &[TYPE_INT, TYPE_STRING, TYPE_BOOL, TYPE_FLOAT];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingType {
    Int,
    String,
    Bool,
    Float,
}

impl SettingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => TYPE_INT,
            Self::String => TYPE_STRING,
            Self::Bool => TYPE_BOOL,
            Self::Float => TYPE_FLOAT,
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            TYPE_INT => Ok(Self::Int),
            TYPE_STRING => Ok(Self::String),
            TYPE_BOOL => Ok(Self::Bool),
            TYPE_FLOAT => Ok(Self::Float),
            other => Err(CoreError::Validation(format!(
                "Unknown setting type: '{other}'. Valid types: {}",
                VALID_TYPES.join(", ")
            ))),
        }
    }

    /// Check that `raw` parses as this type.
    pub fn validate_value(&self, raw: &str) -> Result<(), CoreError> {
        let ok = match self {
            Self::Int => parse_int(raw).is_some(),
            Self::Bool => parse_bool(raw).is_some(),
            Self::Float => parse_float(raw).is_some(),
            Self::String => true,
        };
        if ok {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "Value '{raw}' is not a valid {}",
                self.as_str()
            )))
        }
    }
}

impl fmt::Display for SettingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for SettingType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

pub fn parse_int(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

pub fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accepts `true/false`, `1/0`, `yes/no`, `on/off` (case-insensitive).
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Seed definitions
// ---------------------------------------------------------------------------

/// Declaration of a setting the system knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingDefinition {
    pub key: &'static str,
    pub default_value: &'static str,
    pub value_type: SettingType,
    pub category: &'static str,
    pub description: &'static str,
}

/// Settings the queue depends on. Mirrored by the seed migration.
pub const QUEUE_SETTINGS: &[SettingDefinition] = &[
    SettingDefinition {
        key: KEY_MAX_TICKETS_PER_DAY,
        default_value: "10",
        value_type: SettingType::Int,
        category: CATEGORY_QUEUE,
        description: "Maximum active tickets per service date",
    },
    SettingDefinition {
        key: KEY_CLEANUP_RETENTION_DAYS,
        default_value: "7",
        value_type: SettingType::Int,
        category: CATEGORY_QUEUE,
        description: "Days to keep completed, canceled and no-show tickets",
    },
    SettingDefinition {
        key: KEY_CLEANUP_ENABLED,
        default_value: "true",
        value_type: SettingType::Bool,
        category: CATEGORY_QUEUE,
        description: "Run the daily queue cleanup and capacity job",
    },
    SettingDefinition {
        key: KEY_CLEANUP_SCHEDULE,
        default_value: DEFAULT_CLEANUP_SCHEDULE,
        value_type: SettingType::String,
        category: CATEGORY_QUEUE,
        description: "When the daily queue job runs (minute hour * * *, UTC)",
    },
];

/// Look up a known setting definition by key.
pub fn find_definition(key: &str) -> Option<&'static SettingDefinition> {
    QUEUE_SETTINGS.iter().find(|d| d.key == key)
}

/// Validate a new value for `key` against its declared type and, for the
/// queue keys, their allowed range.
pub fn validate_setting_value(
    key: &str,
    value_type: SettingType,
    raw: &str,
) -> Result<(), CoreError> {
    value_type.validate_value(raw)?;
    match key {
        KEY_MAX_TICKETS_PER_DAY => {
            if parse_int(raw).is_some_and(|v| v < 1) {
                return Err(CoreError::Validation(format!(
                    "{KEY_MAX_TICKETS_PER_DAY} must be at least 1"
                )));
            }
        }
        KEY_CLEANUP_RETENTION_DAYS => {
            if parse_int(raw).is_some_and(|v| v < 0) {
                return Err(CoreError::Validation(format!(
                    "{KEY_CLEANUP_RETENTION_DAYS} must not be negative"
                )));
            }
        }
        KEY_CLEANUP_SCHEDULE => {
            DailySchedule::parse(raw)?;
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_round_trip() {
        for s in VALID_TYPES {
            assert_eq!(SettingType::parse(s).unwrap().as_str(), *s);
        }
        assert!(SettingType::parse("json").is_err());
    }

    #[test]
    fn bool_parsing_is_lenient() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn int_and_float_parsing() {
        assert_eq!(parse_int(" 12 "), Some(12));
        assert_eq!(parse_int("12.5"), None);
        assert_eq!(parse_float("2.5"), Some(2.5));
        assert_eq!(parse_float("inf"), None);
    }

    #[test]
    fn validate_value_by_type() {
        assert!(SettingType::Int.validate_value("5").is_ok());
        assert!(SettingType::Int.validate_value("five").is_err());
        assert!(SettingType::Bool.validate_value("no").is_ok());
        assert!(SettingType::Float.validate_value("abc").is_err());
        assert!(SettingType::String.validate_value("anything").is_ok());
    }

    #[test]
    fn seed_defaults_match_constants() {
        let max = find_definition(KEY_MAX_TICKETS_PER_DAY).unwrap();
        assert_eq!(parse_int(max.default_value), Some(DEFAULT_MAX_TICKETS_PER_DAY));

        let retention = find_definition(KEY_CLEANUP_RETENTION_DAYS).unwrap();
        assert_eq!(
            parse_int(retention.default_value),
            Some(DEFAULT_CLEANUP_RETENTION_DAYS)
        );

        let enabled = find_definition(KEY_CLEANUP_ENABLED).unwrap();
        assert_eq!(parse_bool(enabled.default_value), Some(DEFAULT_CLEANUP_ENABLED));

        for def in QUEUE_SETTINGS {
            assert!(def.value_type.validate_value(def.default_value).is_ok());
        }
    }

    #[test]
    fn queue_keys_have_range_checks() {
        assert!(validate_setting_value(KEY_MAX_TICKETS_PER_DAY, SettingType::Int, "5").is_ok());
        assert!(validate_setting_value(KEY_MAX_TICKETS_PER_DAY, SettingType::Int, "0").is_err());
        assert!(
            validate_setting_value(KEY_CLEANUP_RETENTION_DAYS, SettingType::Int, "-1").is_err()
        );
        assert!(
            validate_setting_value(KEY_CLEANUP_SCHEDULE, SettingType::String, "30 3 * * *").is_ok()
        );
        assert!(
            validate_setting_value(KEY_CLEANUP_SCHEDULE, SettingType::String, "hourly").is_err()
        );
        assert!(validate_setting_value("ui.theme", SettingType::String, "dark").is_ok());
    }

    #[test]
    fn unknown_key_has_no_definition() {
        assert!(find_definition("queue.nonexistent").is_none());
    }
}
