//! Route definitions for the `/maintenance-items` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::maintenance;
use crate::state::AppState;

/// Routes mounted at `/maintenance-items`.
///
/// ```text
/// POST   /discovered        -> add_discovered_item
/// POST   /approve           -> approve_items
/// POST   /{id}/complete     -> complete_item
/// POST   /{id}/skip         -> skip_item
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/discovered", post(maintenance::add_discovered_item))
        .route("/approve", post(maintenance::approve_items))
        .route("/{id}/complete", post(maintenance::complete_item))
        .route("/{id}/skip", post(maintenance::skip_item))
}
