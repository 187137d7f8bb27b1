//! Route definitions for evaluations.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::evaluations;
use crate::state::AppState;

/// Routes mounted at `/evaluations`.
///
/// ```text
/// POST   /              -> create
/// GET    /{id}          -> get_by_id
/// PUT    /{id}          -> update
/// DELETE /{id}          -> delete (soft)
/// PUT    /{id}/status   -> change_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(evaluations::create))
        .route(
            "/{id}",
            get(evaluations::get_by_id)
                .put(evaluations::update)
                .delete(evaluations::delete),
        )
        .route("/{id}/status", put(evaluations::change_status))
}
