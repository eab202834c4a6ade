//! Handlers for the `/admin` resource: settings and the enforcement trigger.
//!
//! All handlers require the `admin` role via [`RequireAdmin`].

use axum::extract::{Path, Query, State};
use axum::Json;
use bayline_core::types::Timestamp;
use bayline_db::models::setting::Setting;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /admin/settings`.
#[derive(Debug, Deserialize)]
pub struct ListSettingsParams {
    #[serde(default)]
    pub include_hidden: bool,
}

/// Request body for `PUT /admin/settings/{key}`.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingRequest {
    pub value: String,
}

/// Outcome of a manual enforcement pass.
#[derive(Debug, Serialize)]
pub struct EnforcementRun {
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

/// GET /api/v1/admin/settings?include_hidden=true
pub async fn list_settings(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<ListSettingsParams>,
) -> AppResult<Json<DataResponse<Vec<Setting>>>> {
    let data = state.settings.list(params.include_hidden).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/admin/settings/{key}
pub async fn get_setting(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<Setting>>> {
    let data = state.settings.get_setting(&key).await?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/admin/settings/{key}
///
/// Rejects non-editable keys (403) and values that do not fit the key's
/// declared type or range (400).
pub async fn update_setting(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(key): Path<String>,
    Json(input): Json<UpdateSettingRequest>,
) -> AppResult<Json<DataResponse<Setting>>> {
    let data = state.settings.update(&key, input.value.trim()).await?;
    tracing::info!(key = %key, admin_id = admin.user_id, "Setting changed by admin");
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/admin/queue/enforce
///
/// Run one retention and capacity pass now, outside the daily schedule.
pub async fn run_enforcement(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> AppResult<Json<DataResponse<EnforcementRun>>> {
    let started_at = Utc::now();
    tracing::info!(admin_id = admin.user_id, "Manual queue enforcement requested");
    state.enforcement.run_now().await?;
    Ok(Json(DataResponse {
        data: EnforcementRun {
            started_at,
            finished_at: Utc::now(),
        },
    }))
}
