//! Ticket (waiting-list entry) model and DTOs.

use bayline_core::ticket::TicketStatus;
use bayline_core::types::{DbId, ServiceDate, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `tickets` table.
///
/// `queue_number` is unique per `service_date` only and never changes after
/// creation.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Ticket {
    pub id: DbId,
    pub vehicle_id: DbId,
    pub customer_id: DbId,
    pub queue_number: i32,
    pub service_date: ServiceDate,
    pub service_type: String,
    /// Expected service duration in minutes.
    pub estimated_time: Option<i32>,
    pub notes: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: TicketStatus,
    pub called_at: Option<Timestamp>,
    pub service_start_at: Option<Timestamp>,
    pub service_end_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for issuing a new ticket. The queue number and initial status are
/// assigned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTicket {
    pub vehicle_id: DbId,
    pub customer_id: DbId,
    pub service_date: ServiceDate,
    pub service_type: String,
    pub estimated_time: Option<i32>,
    pub notes: Option<String>,
}
