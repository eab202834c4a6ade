//! Maintenance item type/status/priority enums, guards, and cost rules.
//!
//! Items are repair tasks attached to a ticket. `initial` items are agreed
//! before service starts; `discovered` items are found by a mechanic during
//! service and wait for the customer's approval.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ticket::TicketStatus;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const TYPE_INITIAL: &str = "initial";
pub const TYPE_DISCOVERED: &str = "discovered";

pub const VALID_TYPES: &[&str] = &[TYPE_INITIAL, TYPE_DISCOVERED];

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_INSPECTED: &str = "inspected";
pub const STATUS_APPROVED: &str = "approved";
pub const STATUS_REJECTED: &str = "rejected";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_SKIPPED: &str = "skipped";

pub const VALID_STATUSES: &[&str] = &[
    STATUS_PENDING,
    STATUS_INSPECTED,
    STATUS_APPROVED,
    STATUS_REJECTED,
    STATUS_COMPLETED,
    STATUS_SKIPPED,
];

pub const PRIORITY_URGENT: &str = "urgent";
pub const PRIORITY_HIGH: &str = "high";
pub const PRIORITY_NORMAL: &str = "normal";
pub const PRIORITY_LOW: &str = "low";

pub const VALID_PRIORITIES: &[&str] = &[PRIORITY_URGENT, PRIORITY_HIGH, PRIORITY_NORMAL, PRIORITY_LOW];

/// Maximum length for an item name.
pub const MAX_NAME_LEN: usize = 200;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Initial,
    Discovered,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => TYPE_INITIAL,
            Self::Discovered => TYPE_DISCOVERED,
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            TYPE_INITIAL => Ok(Self::Initial),
            TYPE_DISCOVERED => Ok(Self::Discovered),
            other => Err(CoreError::Validation(format!(
                "Unknown item type: '{other}'. Valid types: {}",
                VALID_TYPES.join(", ")
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Inspected,
    Approved,
    Rejected,
    Completed,
    Skipped,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => STATUS_PENDING,
            Self::Inspected => STATUS_INSPECTED,
            Self::Approved => STATUS_APPROVED,
            Self::Rejected => STATUS_REJECTED,
            Self::Completed => STATUS_COMPLETED,
            Self::Skipped => STATUS_SKIPPED,
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            STATUS_PENDING => Ok(Self::Pending),
            STATUS_INSPECTED => Ok(Self::Inspected),
            STATUS_APPROVED => Ok(Self::Approved),
            STATUS_REJECTED => Ok(Self::Rejected),
            STATUS_COMPLETED => Ok(Self::Completed),
            STATUS_SKIPPED => Ok(Self::Skipped),
            other => Err(CoreError::Validation(format!(
                "Unknown item status: '{other}'. Valid statuses: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }

    /// Rejected and skipped items are never billed.
    pub fn counts_toward_cost(&self) -> bool {
        !matches!(self, Self::Rejected | Self::Skipped)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Skipped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemPriority {
    Urgent,
    High,
    #[default]
    Normal,
    Low,
}

impl ItemPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => PRIORITY_URGENT,
            Self::High => PRIORITY_HIGH,
            Self::Normal => PRIORITY_NORMAL,
            Self::Low => PRIORITY_LOW,
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            PRIORITY_URGENT => Ok(Self::Urgent),
            PRIORITY_HIGH => Ok(Self::High),
            PRIORITY_NORMAL => Ok(Self::Normal),
            PRIORITY_LOW => Ok(Self::Low),
            other => Err(CoreError::Validation(format!(
                "Unknown priority: '{other}'. Valid priorities: {}",
                VALID_PRIORITIES.join(", ")
            ))),
        }
    }
}

macro_rules! string_backed {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl TryFrom<String> for $ty {
            type Error = CoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }
    )*};
}

string_backed!(ItemType, ItemStatus, ItemPriority);

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Discovered items may only be added while the owning ticket is in service.
pub fn validate_discovery_allowed(ticket_status: TicketStatus) -> Result<(), CoreError> {
    if ticket_status != TicketStatus::InService {
        return Err(CoreError::InvalidTransition(
            "service must be in progress to add discovered items".to_string(),
        ));
    }
    Ok(())
}

/// Customers decide only on items a mechanic has inspected.
pub fn validate_can_decide(status: ItemStatus) -> Result<(), CoreError> {
    if status != ItemStatus::Inspected {
        return Err(CoreError::InvalidTransition(
            "item is not in inspected status".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_can_complete(status: ItemStatus) -> Result<(), CoreError> {
    if !matches!(status, ItemStatus::Approved | ItemStatus::Pending) {
        return Err(CoreError::InvalidTransition(
            "item must be approved or pending to complete".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_can_skip(status: ItemStatus) -> Result<(), CoreError> {
    if status != ItemStatus::Pending {
        return Err(CoreError::InvalidTransition(
            "only pending items can be skipped".to_string(),
        ));
    }
    Ok(())
}

/// Status an inspected item moves to after the customer's decision.
pub fn decision_status(approve: bool) -> ItemStatus {
    if approve {
        ItemStatus::Approved
    } else {
        ItemStatus::Rejected
    }
}

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

pub fn validate_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Item name must not be empty".to_string(),
        ));
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Item name exceeds maximum length of {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Costs and labor hours must be finite and non-negative.
pub fn validate_amount(field: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::Validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Cost aggregation
// ---------------------------------------------------------------------------

/// Estimated and actual totals for a ticket's billable items.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CostSummary {
    pub total_estimated: f64,
    pub total_actual: f64,
}

/// Sum `(status, estimated, actual)` triples, skipping rejected and skipped
/// items.
pub fn summarize_costs<I>(items: I) -> CostSummary
where
    I: IntoIterator<Item = (ItemStatus, f64, Option<f64>)>,
{
    items
        .into_iter()
        .filter(|(status, _, _)| status.counts_toward_cost())
        .fold(CostSummary::default(), |acc, (_, estimated, actual)| CostSummary {
            total_estimated: acc.total_estimated + estimated,
            total_actual: acc.total_actual + actual.unwrap_or(0.0),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_round_trip_for_all_statuses() {
        for s in VALID_STATUSES {
            assert_eq!(ItemStatus::parse(s).unwrap().as_str(), *s);
        }
        for s in VALID_TYPES {
            assert_eq!(ItemType::parse(s).unwrap().as_str(), *s);
        }
        for s in VALID_PRIORITIES {
            assert_eq!(ItemPriority::parse(s).unwrap().as_str(), *s);
        }
    }

    #[test]
    fn unknown_values_rejected() {
        assert!(ItemStatus::parse("done").is_err());
        assert!(ItemType::parse("extra").is_err());
        assert!(ItemPriority::parse("critical").is_err());
    }

    #[test]
    fn default_priority_is_normal() {
        assert_eq!(ItemPriority::default(), ItemPriority::Normal);
    }

    #[test]
    fn discovery_requires_in_service_ticket() {
        assert!(validate_discovery_allowed(TicketStatus::InService).is_ok());
        for status in [
            TicketStatus::Waiting,
            TicketStatus::Called,
            TicketStatus::Completed,
            TicketStatus::Canceled,
            TicketStatus::NoShow,
        ] {
            let err = validate_discovery_allowed(status).unwrap_err();
            assert!(err
                .to_string()
                .contains("service must be in progress to add discovered items"));
        }
    }

    #[test]
    fn only_inspected_items_can_be_decided() {
        assert!(validate_can_decide(ItemStatus::Inspected).is_ok());
        for status in [
            ItemStatus::Pending,
            ItemStatus::Approved,
            ItemStatus::Rejected,
            ItemStatus::Completed,
            ItemStatus::Skipped,
        ] {
            assert!(validate_can_decide(status).is_err(), "{status}");
        }
    }

    #[test]
    fn completion_requires_approved_or_pending() {
        assert!(validate_can_complete(ItemStatus::Approved).is_ok());
        assert!(validate_can_complete(ItemStatus::Pending).is_ok());
        for status in [
            ItemStatus::Inspected,
            ItemStatus::Rejected,
            ItemStatus::Completed,
            ItemStatus::Skipped,
        ] {
            let err = validate_can_complete(status).unwrap_err();
            assert!(err.to_string().contains("approved or pending"));
        }
    }

    #[test]
    fn only_pending_items_can_be_skipped() {
        assert!(validate_can_skip(ItemStatus::Pending).is_ok());
        assert!(validate_can_skip(ItemStatus::Approved).is_err());
    }

    #[test]
    fn decision_maps_to_status() {
        assert_eq!(decision_status(true), ItemStatus::Approved);
        assert_eq!(decision_status(false), ItemStatus::Rejected);
    }

    #[test]
    fn name_validation() {
        assert!(validate_name("Replace brake pads").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn amount_validation() {
        assert!(validate_amount("estimated_cost", 0.0).is_ok());
        assert!(validate_amount("estimated_cost", 120.5).is_ok());
        assert!(validate_amount("estimated_cost", -1.0).is_err());
        assert!(validate_amount("labor_hours", f64::NAN).is_err());
    }

    #[test]
    fn cost_excludes_rejected_and_skipped() {
        let summary = summarize_costs([
            (ItemStatus::Completed, 100.0, Some(110.0)),
            (ItemStatus::Approved, 50.0, None),
            (ItemStatus::Rejected, 400.0, None),
            (ItemStatus::Skipped, 30.0, Some(5.0)),
            (ItemStatus::Inspected, 20.0, None),
        ]);
        assert_eq!(summary.total_estimated, 170.0);
        assert_eq!(summary.total_actual, 110.0);
    }

    #[test]
    fn cost_of_nothing_is_zero() {
        assert_eq!(summarize_costs(Vec::new()), CostSummary::default());
    }
}
