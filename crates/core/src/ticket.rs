//! Ticket status constants, state machine, and queue arithmetic.
//!
//! A ticket is one customer's place in a single day's service queue. The
//! rules here are pure: the repository layer persists tickets, and the queue
//! services combine these rules with store reads and writes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::ServiceDate;

// ---------------------------------------------------------------------------
// Status constants
// ---------------------------------------------------------------------------

/// Ticket issued, customer has not been called yet.
pub const STATUS_WAITING: &str = "waiting";
/// Customer has been called to the service desk.
pub const STATUS_CALLED: &str = "called";
/// A mechanic is working on the vehicle.
pub const STATUS_IN_SERVICE: &str = "in_service";
/// Service finished.
pub const STATUS_COMPLETED: &str = "completed";
/// Ticket was canceled by the customer, staff, or the enforcement job.
pub const STATUS_CANCELED: &str = "canceled";
/// Customer did not show up after being called.
pub const STATUS_NO_SHOW: &str = "no_show";

/// All valid ticket statuses.
pub const VALID_STATUSES: &[&str] = &[
    STATUS_WAITING,
    STATUS_CALLED,
    STATUS_IN_SERVICE,
    STATUS_COMPLETED,
    STATUS_CANCELED,
    STATUS_NO_SHOW,
];

/// Fixed average service duration used for wait estimates.
pub const AVERAGE_SERVICE_MINUTES: i64 = 30;

/// Wire format for service dates in requests and query strings.
pub const SERVICE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Marker appended to the notes of tickets canceled by the enforcement job.
pub const AUTO_CANCEL_MARKER: &str = "[auto-canceled]";

// ---------------------------------------------------------------------------
// TicketStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Waiting,
    Called,
    InService,
    Completed,
    Canceled,
    NoShow,
}

/// Statuses that hold a slot against the daily cap.
pub const ACTIVE_STATUSES: [TicketStatus; 3] = [
    TicketStatus::Waiting,
    TicketStatus::Called,
    TicketStatus::InService,
];

/// Statuses eligible for retention cleanup.
pub const TERMINAL_STATUSES: [TicketStatus; 3] = [
    TicketStatus::Completed,
    TicketStatus::Canceled,
    TicketStatus::NoShow,
];

impl TicketStatus {
    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => STATUS_WAITING,
            Self::Called => STATUS_CALLED,
            Self::InService => STATUS_IN_SERVICE,
            Self::Completed => STATUS_COMPLETED,
            Self::Canceled => STATUS_CANCELED,
            Self::NoShow => STATUS_NO_SHOW,
        }
    }

    /// Parse from a string, returning an error for unknown statuses.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            STATUS_WAITING => Ok(Self::Waiting),
            STATUS_CALLED => Ok(Self::Called),
            STATUS_IN_SERVICE => Ok(Self::InService),
            STATUS_COMPLETED => Ok(Self::Completed),
            STATUS_CANCELED => Ok(Self::Canceled),
            STATUS_NO_SHOW => Ok(Self::NoShow),
            other => Err(CoreError::Validation(format!(
                "Unknown ticket status: '{other}'. Valid statuses: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }

    /// Whether a ticket in this status counts against the daily cap.
    pub fn consumes_capacity(&self) -> bool {
        ACTIVE_STATUSES.contains(self)
    }

    /// Whether no further transitions are possible from this status.
    pub fn is_terminal(&self) -> bool {
        TERMINAL_STATUSES.contains(self)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for TicketStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Operator or customer action applied to a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketEvent {
    Call,
    StartService,
    CompleteService,
    MarkNoShow,
    Cancel,
}

impl TicketEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::StartService => "start_service",
            Self::CompleteService => "complete_service",
            Self::MarkNoShow => "mark_no_show",
            Self::Cancel => "cancel",
        }
    }
}

/// Apply `event` to a ticket currently in `from`, returning the new status.
///
/// Transition table:
/// - `waiting`  --Call-->            `called`
/// - `called`   --StartService-->    `in_service`
/// - `in_service` --CompleteService--> `completed`
/// - `called`   --MarkNoShow-->      `no_show`
/// - `waiting` / `called` / `in_service` --Cancel--> `canceled`
///
/// Anything else is rejected with [`CoreError::InvalidTransition`] naming the
/// precondition.
pub fn transition(from: TicketStatus, event: TicketEvent) -> Result<TicketStatus, CoreError> {
    use TicketStatus::*;

    let rejected = |msg: &str| -> Result<TicketStatus, CoreError> {
        Err(CoreError::InvalidTransition(msg.to_string()))
    };

    match (event, from) {
        (TicketEvent::Call, Waiting) => Ok(Called),
        (TicketEvent::Call, _) => rejected("can only call customers in waiting status"),

        (TicketEvent::StartService, Called) => Ok(InService),
        (TicketEvent::StartService, _) => {
            rejected("customer must be called before starting service")
        }

        (TicketEvent::CompleteService, InService) => Ok(Completed),
        (TicketEvent::CompleteService, _) => rejected("service must be in progress to complete"),

        (TicketEvent::MarkNoShow, Called) => Ok(NoShow),
        (TicketEvent::MarkNoShow, _) => rejected("can only mark no-show for called customers"),

        (TicketEvent::Cancel, Waiting | Called | InService) => Ok(Canceled),
        (TicketEvent::Cancel, Completed) => rejected("cannot cancel completed service"),
        (TicketEvent::Cancel, Canceled | NoShow) => rejected(
            "can only cancel tickets that are waiting, called, or in service",
        ),
    }
}

/// Check whether `event` is allowed from `from` without building an error.
pub fn can_apply(from: TicketStatus, event: TicketEvent) -> bool {
    transition(from, event).is_ok()
}

// ---------------------------------------------------------------------------
// Capacity
// ---------------------------------------------------------------------------

/// Slot usage for one service date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub available: bool,
    pub remaining: i64,
    pub active: i64,
    pub max_per_day: i64,
}

/// Count active tickets among `statuses` and compare against the cap.
pub fn compute_availability<I>(statuses: I, max_per_day: i64) -> Availability
where
    I: IntoIterator<Item = TicketStatus>,
{
    let active = statuses
        .into_iter()
        .filter(TicketStatus::consumes_capacity)
        .count() as i64;

    Availability {
        available: active < max_per_day,
        remaining: (max_per_day - active).max(0),
        active,
        max_per_day,
    }
}

/// Next queue number for a date: one past the highest number ever issued
/// that still exists. Deleting lower numbers never causes reuse.
pub fn next_queue_number<I>(existing: I) -> i32
where
    I: IntoIterator<Item = i32>,
{
    existing.into_iter().max().unwrap_or(0) + 1
}

/// Reject a freshly allocated queue number that exceeds the daily cap.
pub fn validate_queue_number(queue_number: i32, max_per_day: i64) -> Result<(), CoreError> {
    if i64::from(queue_number) > max_per_day {
        return Err(CoreError::CapacityExceeded { max: max_per_day });
    }
    Ok(())
}

/// Pick the waiting tickets to cancel when more than `max_per_day` are
/// waiting. Tickets are ordered by queue number and the earliest arrivals
/// keep their place; everything after the first `max_per_day` is returned.
pub fn select_excess_waiting<T, F>(mut waiting: Vec<T>, max_per_day: i64, queue_number: F) -> Vec<T>
where
    F: Fn(&T) -> i32,
{
    let keep = usize::try_from(max_per_day.max(0)).unwrap_or(usize::MAX);
    if waiting.len() <= keep {
        return Vec::new();
    }
    waiting.sort_by_key(|t| queue_number(t));
    waiting.split_off(keep)
}

/// Append the auto-cancellation audit marker to a ticket's notes.
pub fn auto_cancel_note(existing: Option<&str>, max_per_day: i64) -> String {
    let marker = format!("{AUTO_CANCEL_MARKER} daily limit of {max_per_day} tickets exceeded");
    match existing.map(str::trim) {
        Some(notes) if !notes.is_empty() => format!("{notes}\n{marker}"),
        _ => marker,
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Parse a `YYYY-MM-DD` service date.
pub fn parse_service_date(raw: &str) -> Result<ServiceDate, CoreError> {
    ServiceDate::parse_from_str(raw.trim(), SERVICE_DATE_FORMAT).map_err(|_| {
        CoreError::Validation(format!(
            "Invalid service date '{raw}'. Expected format YYYY-MM-DD"
        ))
    })
}

/// Terminal tickets whose service date is strictly before this day are
/// purged by the retention cleanup.
pub fn retention_cutoff(today: ServiceDate, retention_days: i64) -> ServiceDate {
    today - chrono::Duration::days(retention_days.max(0))
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Customer-facing view of a ticket's place in the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueProgress {
    pub queue_number: i32,
    pub status: TicketStatus,
    pub currently_serving: Option<i32>,
    pub waiting_ahead: i64,
    pub estimated_wait_minutes: i64,
    pub message: String,
}

/// Compute progress for the ticket `(queue_number, status)` given every
/// ticket sharing its service date as `(queue_number, status)` pairs.
pub fn compute_progress(
    queue_number: i32,
    status: TicketStatus,
    same_day: &[(i32, TicketStatus)],
) -> QueueProgress {
    let currently_serving = same_day
        .iter()
        .filter(|(_, s)| *s == TicketStatus::InService)
        .map(|(n, _)| *n)
        .min();

    let waiting_ahead = same_day
        .iter()
        .filter(|(n, s)| {
            *n < queue_number && matches!(s, TicketStatus::Waiting | TicketStatus::Called)
        })
        .count() as i64;

    let estimated_wait_minutes = match status {
        TicketStatus::InService | TicketStatus::Completed => 0,
        _ => waiting_ahead * AVERAGE_SERVICE_MINUTES,
    };

    QueueProgress {
        queue_number,
        status,
        currently_serving,
        waiting_ahead,
        estimated_wait_minutes,
        message: status_message(status.as_str(), waiting_ahead, currently_serving),
    }
}

/// Human-readable status line shown to the customer.
pub fn status_message(status: &str, waiting_ahead: i64, currently_serving: Option<i32>) -> String {
    match status {
        STATUS_WAITING => {
            let ahead = match waiting_ahead {
                0 => "You are next in line".to_string(),
                1 => "1 customer ahead of you".to_string(),
                n => format!("{n} customers ahead of you"),
            };
            match currently_serving {
                Some(n) => format!("{ahead}. Now serving number {n}"),
                None => ahead,
            }
        }
        STATUS_CALLED => "Your number has been called, please proceed to the service desk".into(),
        STATUS_IN_SERVICE => "Your vehicle is being serviced".into(),
        STATUS_COMPLETED => "Service completed, thank you for your visit".into(),
        STATUS_CANCELED => "This ticket has been canceled".into(),
        STATUS_NO_SHOW => "Marked as no-show, please take a new ticket".into(),
        _ => "Unknown ticket status".into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
