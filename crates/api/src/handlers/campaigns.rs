//! Handlers for the scoring view of `/campaigns`.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use cxeval_core::error::CoreError;
use cxeval_core::scoring::AnswerInput;
use cxeval_core::types::DbId;
use cxeval_db::repositories::CampaignRepo;
use serde::Deserialize;

use crate::engine::scoring::{calculate_scores, get_form_for_campaign};
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for linking a campaign to a survey form.
#[derive(Debug, Deserialize)]
pub struct LinkFormRequest {
    pub survey_form_id: DbId,
}

/// Request body for a dry-run score.
#[derive(Debug, Deserialize)]
pub struct ScorePreviewRequest {
    pub answers: Vec<AnswerInput>,
}

/// GET /api/v1/campaigns/{id}/survey-form
///
/// The linked form with its full section/aspect tree.
pub async fn get_survey_form(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let mut tx = cxeval_db::begin_snapshot(&state.pool).await?;
    let form = get_form_for_campaign(&mut tx, id).await?;
    tx.commit().await?;
    Ok(Json(DataResponse { data: form }))
}

/// PUT /api/v1/campaigns/{id}/survey-form
///
/// Link a form of the campaign's own company.
pub async fn link_survey_form(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<LinkFormRequest>,
) -> AppResult<impl IntoResponse> {
    CampaignRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Campaign",
            id,
        }))?;

    let campaign = CampaignRepo::link_form(&state.pool, id, body.survey_form_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "SurveyForm",
            id: body.survey_form_id,
        }))?;

    tracing::info!(
        campaign_id = id,
        form_id = body.survey_form_id,
        "Survey form linked to campaign",
    );
    Ok(Json(DataResponse { data: campaign }))
}

/// POST /api/v1/campaigns/{id}/score-preview
///
/// Score answers against the linked form without storing anything.
pub async fn score_preview(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<ScorePreviewRequest>,
) -> AppResult<impl IntoResponse> {
    let result = calculate_scores(&state.pool, id, &body.answers).await?;
    Ok(Json(DataResponse { data: result }))
}
