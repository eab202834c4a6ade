/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Tickets are grouped by calendar day; time of day is never stored.
pub type ServiceDate = chrono::NaiveDate;
