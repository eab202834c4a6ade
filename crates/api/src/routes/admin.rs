//! Route definitions for the `/admin` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// All routes require the `admin` role (enforced by handler extractors).
///
/// ```text
/// GET    /settings            -> list_settings
/// GET    /settings/{key}      -> get_setting
/// PUT    /settings/{key}      -> update_setting
/// POST   /queue/enforce       -> run_enforcement
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(admin::list_settings))
        .route(
            "/settings/{key}",
            get(admin::get_setting).put(admin::update_setting),
        )
        .route("/queue/enforce", post(admin::run_enforcement))
}
