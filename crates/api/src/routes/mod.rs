pub mod campaigns;
pub mod evaluations;
pub mod health;
pub mod survey_forms;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /companies/{company_id}/survey-forms          list, create
/// /companies/{company_id}/survey-forms/{id}     get, replace, delete
///
/// /campaigns/{id}/survey-form                   linked form tree, link form
/// /campaigns/{id}/score-preview                 score without persisting
///
/// /evaluations                                  submit
/// /evaluations/{id}                             get, update (rescore), delete
/// /evaluations/{id}/status                      status change
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest(
            "/companies/{company_id}/survey-forms",
            survey_forms::router(),
        )
        .nest("/campaigns", campaigns::router())
        .nest("/evaluations", evaluations::router())
}
