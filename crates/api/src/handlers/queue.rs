//! Handlers for the `/queue` resource: tickets, availability and progress.
//!
//! Customers act on their own tickets; mechanics and admins on any.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bayline_core::error::CoreError;
use bayline_core::ticket::{parse_service_date, QueueProgress};
use bayline_core::types::{DbId, ServiceDate};
use bayline_db::models::ticket::{CreateTicket, Ticket};
use bayline_queue::lifecycle::DayAvailability;
use bayline_queue::Actor;
use chrono::Utc;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAuth, RequireStaff};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Query parameters carrying a service date. Defaults to today (UTC).
#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

/// Query parameters for `GET /queue/tickets`.
#[derive(Debug, Deserialize)]
pub struct TicketListQuery {
    pub date: Option<String>,
    /// Narrow the listing to one queue number.
    pub number: Option<i32>,
}

/// Request body for `POST /queue/tickets`.
///
/// `customer_id` is required when staff book on a customer's behalf and
/// must be omitted or match the caller otherwise.
#[derive(Debug, Deserialize)]
pub struct TakeTicketRequest {
    pub vehicle_id: DbId,
    pub customer_id: Option<DbId>,
    pub service_date: String,
    pub service_type: String,
    pub estimated_time: Option<i32>,
    pub notes: Option<String>,
}

fn resolve_date(raw: Option<&str>) -> AppResult<ServiceDate> {
    match raw {
        Some(raw) => Ok(parse_service_date(raw)?),
        None => Ok(Utc::now().date_naive()),
    }
}

// ---------------------------------------------------------------------------
// Issuance and availability
// ---------------------------------------------------------------------------

/// GET /api/v1/queue/availability?date=YYYY-MM-DD
pub async fn availability(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Query(params): Query<DateQuery>,
) -> AppResult<Json<DataResponse<DayAvailability>>> {
    let date = resolve_date(params.date.as_deref())?;
    let data = state.queue.day_availability(date).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/queue/tickets
///
/// Take the next queue number for a date. Returns 201 with the ticket, or
/// 409 `CAPACITY_EXCEEDED` when the day is full.
pub async fn take_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<TakeTicketRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Ticket>>)> {
    let service_date = parse_service_date(&input.service_date)?;

    let customer_id = match (user.actor(), input.customer_id) {
        (Actor::Customer(id), None) => id,
        (Actor::Customer(id), Some(requested)) if requested == id => id,
        (Actor::Customer(_), Some(_)) => {
            return Err(CoreError::Forbidden(
                "Customers can only take tickets for themselves".into(),
            )
            .into());
        }
        (Actor::Staff(_), Some(requested)) => requested,
        (Actor::Staff(_), None) => {
            return Err(CoreError::Validation(
                "customer_id is required when booking for a customer".into(),
            )
            .into());
        }
    };

    let ticket = state
        .queue
        .take_queue_number(CreateTicket {
            vehicle_id: input.vehicle_id,
            customer_id,
            service_date,
            service_type: input.service_type,
            estimated_time: input.estimated_time,
            notes: input.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: ticket })))
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/queue/tickets?date=YYYY-MM-DD&number=N
///
/// The day's queue in number order. Staff only.
pub async fn list_tickets(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Query(params): Query<TicketListQuery>,
) -> AppResult<Json<DataResponse<Vec<Ticket>>>> {
    let date = resolve_date(params.date.as_deref())?;
    let data: Vec<Ticket> = match params.number {
        Some(number) => state
            .queue
            .find_by_queue_number(date, number)
            .await?
            .into_iter()
            .collect(),
        None => state.queue.list_for_date(date).await?,
    };
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/queue/tickets/mine
pub async fn my_tickets(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Ticket>>>> {
    let data = state.queue.list_for_customer(user.user_id).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/queue/tickets/{id}
pub async fn get_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Ticket>>> {
    let data = state.queue.get_ticket_as(id, user.actor()).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/queue/tickets/{id}/progress
pub async fn progress(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<QueueProgress>>> {
    let data = state.queue.progress_as(id, user.actor()).await?;
    Ok(Json(DataResponse { data }))
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// POST /api/v1/queue/tickets/{id}/call
pub async fn call_customer(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Ticket>>> {
    let data = state.queue.call_customer(id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/queue/tickets/{id}/start
pub async fn start_service(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Ticket>>> {
    let data = state.queue.start_service(id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/queue/tickets/{id}/complete
pub async fn complete_service(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Ticket>>> {
    let data = state.queue.complete_service(id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/queue/tickets/{id}/no-show
pub async fn mark_no_show(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Ticket>>> {
    let data = state.queue.mark_no_show(id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/queue/tickets/{id}/cancel
///
/// Owners may cancel their own ticket; staff may cancel any.
pub async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Ticket>>> {
    let data = state.queue.cancel_as(id, user.actor()).await?;
    Ok(Json(DataResponse { data }))
}
