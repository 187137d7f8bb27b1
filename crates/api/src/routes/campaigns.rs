//! Route definitions for campaign scoring.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::campaigns;
use crate::state::AppState;

/// Routes mounted at `/campaigns`.
///
/// ```text
/// GET    /{id}/survey-form     -> get_survey_form
/// PUT    /{id}/survey-form     -> link_survey_form
/// POST   /{id}/score-preview   -> score_preview
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}/survey-form",
            get(campaigns::get_survey_form).put(campaigns::link_survey_form),
        )
        .route("/{id}/score-preview", post(campaigns::score_preview))
}
