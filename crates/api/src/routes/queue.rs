//! Route definitions for the `/queue` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{maintenance, queue};
use crate::state::AppState;

/// Routes mounted at `/queue`.
///
/// ```text
/// GET    /availability                 -> availability
/// POST   /tickets                      -> take_ticket
/// GET    /tickets                      -> list_tickets
/// GET    /tickets/mine                 -> my_tickets
/// GET    /tickets/{id}                 -> get_ticket
/// GET    /tickets/{id}/progress        -> progress
/// POST   /tickets/{id}/call            -> call_customer
/// POST   /tickets/{id}/start           -> start_service
/// POST   /tickets/{id}/complete        -> complete_service
/// POST   /tickets/{id}/no-show         -> mark_no_show
/// POST   /tickets/{id}/cancel          -> cancel
/// GET    /tickets/{id}/items           -> list_items
/// POST   /tickets/{id}/items           -> create_initial_items
/// GET    /tickets/{id}/items/summary   -> inspection_summary
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/availability", get(queue::availability))
        .route("/tickets", get(queue::list_tickets).post(queue::take_ticket))
        .route("/tickets/mine", get(queue::my_tickets))
        .route("/tickets/{id}", get(queue::get_ticket))
        .route("/tickets/{id}/progress", get(queue::progress))
        .route("/tickets/{id}/call", post(queue::call_customer))
        .route("/tickets/{id}/start", post(queue::start_service))
        .route("/tickets/{id}/complete", post(queue::complete_service))
        .route("/tickets/{id}/no-show", post(queue::mark_no_show))
        .route("/tickets/{id}/cancel", post(queue::cancel))
        .route(
            "/tickets/{id}/items",
            get(maintenance::list_items).post(maintenance::create_initial_items),
        )
        .route(
            "/tickets/{id}/items/summary",
            get(maintenance::inspection_summary),
        )
}
