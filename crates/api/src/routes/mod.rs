pub mod admin;
pub mod health;
pub mod maintenance;
pub mod queue;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /queue/availability                         day availability (auth)
/// /queue/tickets                              take (POST), list by date (staff)
/// /queue/tickets/mine                         caller's tickets
/// /queue/tickets/{id}                         fetch (owner or staff)
/// /queue/tickets/{id}/progress                queue position (owner or staff)
/// /queue/tickets/{id}/call|start|complete     transitions (staff)
/// /queue/tickets/{id}/no-show                 transition (staff)
/// /queue/tickets/{id}/cancel                  cancel (owner or staff)
/// /queue/tickets/{id}/items                   list (owner or staff), create initial (staff)
/// /queue/tickets/{id}/items/summary           inspection summary (owner or staff)
///
/// /maintenance-items/discovered               log discovered item (staff)
/// /maintenance-items/approve                  approve or reject batch (owner)
/// /maintenance-items/{id}/complete|skip       close an item (staff)
///
/// /admin/settings                             list (admin)
/// /admin/settings/{key}                       get, update (admin)
/// /admin/queue/enforce                        run enforcement now (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/queue", queue::router())
        .nest("/maintenance-items", maintenance::router())
        .nest("/admin", admin::router())
}
