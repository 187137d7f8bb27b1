//! Handlers for the `/evaluations` resource.
//!
//! Submission and update score the answers and write the results in a single
//! `REPEATABLE READ` transaction. If scoring fails the transaction is dropped
//! uncommitted, so no evaluation or answer is ever stored without its scores.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cxeval_core::error::CoreError;
use cxeval_core::scoring::{AnswerInput, RecordedScore, ScoringResult};
use cxeval_core::types::DbId;
use cxeval_db::models::evaluation::{
    CreateEvaluation, EvaluationWithAnswers, NewEvaluationAnswer, StatusChangeRequest,
    UpdateEvaluation,
};
use cxeval_db::repositories::EvaluationRepo;

use crate::engine::scoring::score_in_tx;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Evaluation",
        id,
    })
}

/// The recorded snapshot for one answered aspect.
///
/// Every answered aspect is present in a successful [`ScoringResult`], so a
/// miss here is a bug rather than bad input.
fn recorded(result: &ScoringResult, aspect_id: DbId) -> AppResult<RecordedScore> {
    result.recorded_for(aspect_id).ok_or_else(|| {
        AppError::InternalError(format!("Aspect {aspect_id} missing from scoring result"))
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/evaluations
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateEvaluation>,
) -> AppResult<impl IntoResponse> {
    let inputs: Vec<AnswerInput> = input.answers.iter().map(|a| a.as_input()).collect();

    let mut tx = cxeval_db::begin_repeatable_read(&state.pool).await?;
    let result = score_in_tx(&mut tx, input.campaign_id, &inputs).await?;

    let answers = input
        .answers
        .iter()
        .map(|answer| {
            Ok(NewEvaluationAnswer {
                answer,
                recorded: recorded(&result, answer.aspect_id)?,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let evaluation = EvaluationRepo::create_with_answers(
        &mut tx,
        &input,
        &answers,
        result.total_awarded,
        result.percentage,
    )
    .await?;
    let answers = EvaluationRepo::list_answers(&mut tx, evaluation.id).await?;
    tx.commit().await?;

    tracing::info!(
        evaluation_id = evaluation.id,
        campaign_id = evaluation.campaign_id,
        form_id = result.form_id,
        percentage = result.percentage,
        "Evaluation submitted",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: EvaluationWithAnswers {
                evaluation,
                answers,
            },
        }),
    ))
}

/// GET /api/v1/evaluations/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let evaluation = EvaluationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    let mut conn = state.pool.acquire().await?;
    let answers = EvaluationRepo::list_answers(&mut conn, id).await?;
    Ok(Json(DataResponse {
        data: EvaluationWithAnswers {
            evaluation,
            answers,
        },
    }))
}

/// PUT /api/v1/evaluations/{id}
///
/// Patch header fields and answer values. When answers change, the full
/// merged answer set is rescored against the campaign's current form and
/// every answer's recorded snapshot plus the totals are rewritten.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateEvaluation>,
) -> AppResult<impl IntoResponse> {
    let mut tx = cxeval_db::begin_repeatable_read(&state.pool).await?;

    let existing = EvaluationRepo::find_for_update(&mut tx, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let mut evaluation = EvaluationRepo::update_header(&mut tx, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;

    if let Some(patches) = &input.answers {
        for patch in patches {
            EvaluationRepo::update_answer_values(&mut tx, id, patch)
                .await?
                .ok_or(AppError::Core(CoreError::NotFound {
                    entity: "EvaluationAnswer",
                    id: patch.id,
                }))?;
        }

        let stored = EvaluationRepo::list_answers(&mut tx, id).await?;
        let inputs: Vec<AnswerInput> = stored.iter().map(|a| a.as_input()).collect();
        let result = score_in_tx(&mut tx, existing.campaign_id, &inputs).await?;

        for answer in &stored {
            let snapshot = recorded(&result, answer.aspect_id)?;
            EvaluationRepo::record_answer_score(&mut tx, answer.id, &snapshot).await?;
        }

        evaluation = EvaluationRepo::set_totals(&mut tx, id, result.total_awarded, result.percentage)
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(
            evaluation_id = id,
            campaign_id = existing.campaign_id,
            answers = stored.len(),
            percentage = result.percentage,
            "Evaluation rescored",
        );
    }

    let answers = EvaluationRepo::list_answers(&mut tx, id).await?;
    tx.commit().await?;

    Ok(Json(DataResponse {
        data: EvaluationWithAnswers {
            evaluation,
            answers,
        },
    }))
}

/// PUT /api/v1/evaluations/{id}/status
pub async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<StatusChangeRequest>,
) -> AppResult<impl IntoResponse> {
    let evaluation = EvaluationRepo::change_status(&state.pool, id, body.status)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(evaluation_id = id, status = body.status.as_str(), "Evaluation status changed");
    Ok(Json(DataResponse { data: evaluation }))
}

/// DELETE /api/v1/evaluations/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    if EvaluationRepo::soft_delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
