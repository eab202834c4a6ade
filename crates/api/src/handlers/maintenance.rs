//! Handlers for maintenance items: the ticket-scoped listing and summary
//! under `/queue/tickets/{id}/items`, and the `/maintenance-items` actions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bayline_core::types::DbId;
use bayline_db::models::maintenance_item::{
    ApproveItemsRequest, CompleteItemRequest, DiscoveredItemInput, InitialItemInput,
    ItemListParams, MaintenanceItem,
};
use bayline_queue::maintenance::InspectionSummary;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /queue/tickets/{id}/items`.
#[derive(Debug, Deserialize)]
pub struct CreateInitialItemsRequest {
    pub items: Vec<InitialItemInput>,
}

/// GET /api/v1/queue/tickets/{id}/items?status=&item_type=
pub async fn list_items(
    State(state): State<AppState>,
    user: AuthUser,
    Path(ticket_id): Path<DbId>,
    Query(params): Query<ItemListParams>,
) -> AppResult<Json<DataResponse<Vec<MaintenanceItem>>>> {
    state.queue.get_ticket_as(ticket_id, user.actor()).await?;
    let data = state.items.list_items(ticket_id, &params).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/queue/tickets/{id}/items
///
/// Record the pre-agreed items for a ticket. All are created or none.
pub async fn create_initial_items(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(ticket_id): Path<DbId>,
    Json(input): Json<CreateInitialItemsRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<MaintenanceItem>>>)> {
    let data = state
        .items
        .create_initial_items(ticket_id, input.items)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// GET /api/v1/queue/tickets/{id}/items/summary
pub async fn inspection_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Path(ticket_id): Path<DbId>,
) -> AppResult<Json<DataResponse<InspectionSummary>>> {
    state.queue.get_ticket_as(ticket_id, user.actor()).await?;
    let data = state.items.inspection_summary(ticket_id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/maintenance-items/discovered
///
/// Log an item found during service. The caller is recorded as the mechanic.
pub async fn add_discovered_item(
    State(state): State<AppState>,
    RequireStaff(mechanic): RequireStaff,
    Json(input): Json<DiscoveredItemInput>,
) -> AppResult<(StatusCode, Json<DataResponse<MaintenanceItem>>)> {
    let data = state
        .items
        .add_discovered_item(mechanic.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// POST /api/v1/maintenance-items/approve
///
/// The ticket owner approves or rejects inspected items as one batch.
pub async fn approve_items(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<ApproveItemsRequest>,
) -> AppResult<Json<DataResponse<Vec<MaintenanceItem>>>> {
    let data = state
        .items
        .approve_items(user.user_id, &input.item_ids, input.approve)
        .await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/maintenance-items/{id}/complete
pub async fn complete_item(
    State(state): State<AppState>,
    RequireStaff(_mechanic): RequireStaff,
    Path(id): Path<DbId>,
    Json(input): Json<CompleteItemRequest>,
) -> AppResult<Json<DataResponse<MaintenanceItem>>> {
    let data = state.items.complete_item(id, input.actual_cost).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/maintenance-items/{id}/skip
pub async fn skip_item(
    State(state): State<AppState>,
    RequireStaff(_mechanic): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<MaintenanceItem>>> {
    let data = state.items.skip_item(id).await?;
    Ok(Json(DataResponse { data }))
}
