//! Handlers for `/companies/{company_id}/survey-forms`.
//!
//! Every write runs the draft through weight distribution first; a schema
//! error is returned before anything reaches the database.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cxeval_core::distribution::validate_and_distribute;
use cxeval_core::error::CoreError;
use cxeval_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use cxeval_core::survey::{validate_draft, FinalizedSection, FormDraft, TreeSection};
use cxeval_core::types::DbId;
use cxeval_db::models::survey_form::SurveyForm;
use cxeval_db::repositories::SurveyFormRepo;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// A form row with its current section/aspect tree.
#[derive(Debug, Serialize)]
pub struct SurveyFormDetail {
    #[serde(flatten)]
    pub form: SurveyForm,
    pub total_possible: f64,
    pub sections: Vec<TreeSection>,
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "SurveyForm",
        id,
    })
}

/// Validate the draft shape, then finalize its weights.
fn finalize(draft: &FormDraft) -> AppResult<Vec<FinalizedSection>> {
    validate_draft(draft)?;
    Ok(validate_and_distribute(&draft.sections)?)
}

/// Load a form's tree from a consistent snapshot.
async fn load_detail(state: &AppState, id: DbId, company_id: DbId) -> AppResult<SurveyFormDetail> {
    let rows = SurveyFormRepo::load_tree_by_id(&state.pool, id, company_id)
        .await?
        .ok_or_else(|| not_found(id))?;
    let form = rows.form.clone();
    let tree = rows.into_form_tree()?;
    Ok(SurveyFormDetail {
        form,
        total_possible: tree.total_possible(),
        sections: tree.sections,
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/companies/{company_id}/survey-forms?limit=&offset=
pub async fn list(
    State(state): State<AppState>,
    Path(company_id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let offset = clamp_offset(params.offset);
    let forms = SurveyFormRepo::list_by_company(&state.pool, company_id, limit, offset).await?;
    Ok(Json(DataResponse { data: forms }))
}

/// POST /api/v1/companies/{company_id}/survey-forms
///
/// Distribute weights and persist the form with its whole tree.
pub async fn create(
    State(state): State<AppState>,
    Path(company_id): Path<DbId>,
    Json(draft): Json<FormDraft>,
) -> AppResult<impl IntoResponse> {
    let sections = finalize(&draft)?;
    let form =
        SurveyFormRepo::create_with_tree(&state.pool, company_id, &draft.title, &sections).await?;
    let detail = load_detail(&state, form.id, company_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: detail })))
}

/// GET /api/v1/companies/{company_id}/survey-forms/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path((company_id, id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let detail = load_detail(&state, id, company_id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// PUT /api/v1/companies/{company_id}/survey-forms/{id}
///
/// Replace the title and the whole tree. Evaluations already submitted keep
/// their recorded scores.
pub async fn update(
    State(state): State<AppState>,
    Path((company_id, id)): Path<(DbId, DbId)>,
    Json(draft): Json<FormDraft>,
) -> AppResult<impl IntoResponse> {
    let sections = finalize(&draft)?;
    SurveyFormRepo::replace_form_tree(&state.pool, id, company_id, &draft.title, &sections)
        .await?
        .ok_or_else(|| not_found(id))?;
    let detail = load_detail(&state, id, company_id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// DELETE /api/v1/companies/{company_id}/survey-forms/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path((company_id, id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    if SurveyFormRepo::soft_delete(&state.pool, id, company_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
