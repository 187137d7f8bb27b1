//! Campaign-level scoring.
//!
//! Resolves a campaign's survey form and scores answers against it. Every
//! read of the section/aspect tree happens inside one `REPEATABLE READ`
//! transaction, either a read-only snapshot opened here or the caller's
//! own transaction when the score is about to be persisted.

use cxeval_core::error::{CoreError, ScoringError};
use cxeval_core::scoring::{score_answers, AnswerInput, ScoringResult};
use cxeval_core::survey::FormTree;
use cxeval_core::types::DbId;
use cxeval_db::models::survey_form::FormTreeRows;
use cxeval_db::repositories::SurveyFormRepo;
use cxeval_db::DbPool;
use sqlx::PgConnection;

use crate::error::{AppError, AppResult};

/// Load the form tree linked to `campaign_id`, if any.
async fn load_campaign_form(
    conn: &mut PgConnection,
    campaign_id: DbId,
) -> AppResult<Option<FormTree>> {
    let rows = SurveyFormRepo::load_tree_for_campaign(conn, campaign_id).await?;
    Ok(rows.map(FormTreeRows::into_form_tree).transpose()?)
}

/// Resolve the form linked to a campaign with its full section/aspect tree.
///
/// Fails with `NotFound` when the campaign has no linked form, or the form
/// (or campaign) is soft-deleted.
pub async fn get_form_for_campaign(
    conn: &mut PgConnection,
    campaign_id: DbId,
) -> AppResult<FormTree> {
    load_campaign_form(conn, campaign_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "CampaignSurveyForm",
            id: campaign_id,
        }))
}

/// Score `answers` against the campaign's form inside the caller's
/// transaction.
///
/// A missing form surfaces as [`ScoringError::NoFormLinked`]. On any error
/// the caller should drop the transaction so nothing it wrote is committed.
pub async fn score_in_tx(
    conn: &mut PgConnection,
    campaign_id: DbId,
    answers: &[AnswerInput],
) -> AppResult<ScoringResult> {
    let form = load_campaign_form(conn, campaign_id)
        .await?
        .ok_or(ScoringError::NoFormLinked { campaign_id })?;

    match score_answers(&form, answers) {
        Ok(result) => {
            tracing::debug!(
                campaign_id,
                form_id = result.form_id,
                answers = answers.len(),
                percentage = result.percentage,
                "Answers scored",
            );
            Ok(result)
        }
        Err(err) => {
            tracing::warn!(campaign_id, form_id = form.form_id, error = %err, "Answers rejected");
            Err(err.into())
        }
    }
}

/// Score `answers` for a campaign without persisting anything.
///
/// Idempotent: with unchanged form state the same answers always produce an
/// identical [`ScoringResult`].
pub async fn calculate_scores(
    pool: &DbPool,
    campaign_id: DbId,
    answers: &[AnswerInput],
) -> AppResult<ScoringResult> {
    let mut tx = cxeval_db::begin_snapshot(pool).await?;
    let result = score_in_tx(&mut tx, campaign_id, answers).await?;
    tx.commit().await?;
    Ok(result)
}
