//! Route definitions for company survey forms.

use axum::routing::get;
use axum::Router;

use crate::handlers::survey_forms;
use crate::state::AppState;

/// Routes mounted at `/companies/{company_id}/survey-forms`.
///
/// ```text
/// GET    /        -> list
/// POST   /        -> create
/// GET    /{id}    -> get_by_id
/// PUT    /{id}    -> update (whole-tree replace)
/// DELETE /{id}    -> delete (soft)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(survey_forms::list).post(survey_forms::create))
        .route(
            "/{id}",
            get(survey_forms::get_by_id)
                .put(survey_forms::update)
                .delete(survey_forms::delete),
        )
}
