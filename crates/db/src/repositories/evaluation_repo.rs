//! Repository for `evaluations` and `evaluation_answers`.
//!
//! Writes that carry scores take `&mut PgConnection` so the caller can run
//! scoring and persistence in one transaction: an evaluation never exists
//! without the totals computed for its answers.

use cxeval_core::scoring::RecordedScore;
use cxeval_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::evaluation::{
    CreateEvaluation, Evaluation, EvaluationAnswer, EvaluationStatus, NewEvaluationAnswer,
    UpdateEvaluation, UpdateEvaluationAnswer,
};

/// Column lists shared across queries to avoid repetition.
const COLUMNS: &str = "id, campaign_id, user_id, video_id, location, evaluated_collaborator, \
                       status, total_score, percentage_score, deleted_at, created_at, updated_at";
const ANSWER_COLUMNS: &str = "id, evaluation_id, aspect_id, value_number, value_boolean, comment, \
                              recorded_aspect_max, recorded_points_awarded, recorded_section_max, \
                              created_at, updated_at";

/// Provides persistence for scored evaluations.
pub struct EvaluationRepo;

impl EvaluationRepo {
    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    /// Insert an evaluation header and its scored answers.
    ///
    /// Must run inside the transaction that produced the scores.
    pub async fn create_with_answers(
        conn: &mut PgConnection,
        input: &CreateEvaluation,
        answers: &[NewEvaluationAnswer<'_>],
        total_score: f64,
        percentage_score: f64,
    ) -> Result<Evaluation, sqlx::Error> {
        let query = format!(
            "INSERT INTO evaluations
                (campaign_id, user_id, video_id, location, evaluated_collaborator,
                 total_score, percentage_score)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let evaluation = sqlx::query_as::<_, Evaluation>(&query)
            .bind(input.campaign_id)
            .bind(input.user_id)
            .bind(input.video_id)
            .bind(&input.location)
            .bind(&input.evaluated_collaborator)
            .bind(total_score)
            .bind(percentage_score)
            .fetch_one(&mut *conn)
            .await?;

        for new in answers {
            sqlx::query(
                "INSERT INTO evaluation_answers
                    (evaluation_id, aspect_id, value_number, value_boolean, comment,
                     recorded_aspect_max, recorded_points_awarded, recorded_section_max)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(evaluation.id)
            .bind(new.answer.aspect_id)
            .bind(new.answer.value_number)
            .bind(new.answer.value_boolean)
            .bind(&new.answer.comment)
            .bind(new.recorded.aspect_max)
            .bind(new.recorded.points_awarded)
            .bind(new.recorded.section_max)
            .execute(&mut *conn)
            .await?;
        }

        Ok(evaluation)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Find an evaluation by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Evaluation>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM evaluations WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Evaluation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find and row-lock an evaluation for the rest of the transaction.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Evaluation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM evaluations
             WHERE id = $1 AND deleted_at IS NULL
             FOR UPDATE"
        );
        sqlx::query_as::<_, Evaluation>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Non-deleted answers of an evaluation, in insertion order.
    pub async fn list_answers(
        conn: &mut PgConnection,
        evaluation_id: DbId,
    ) -> Result<Vec<EvaluationAnswer>, sqlx::Error> {
        let query = format!(
            "SELECT {ANSWER_COLUMNS} FROM evaluation_answers
             WHERE evaluation_id = $1 AND deleted_at IS NULL
             ORDER BY id"
        );
        sqlx::query_as::<_, EvaluationAnswer>(&query)
            .bind(evaluation_id)
            .fetch_all(conn)
            .await
    }

    // -----------------------------------------------------------------------
    // Updates
    // -----------------------------------------------------------------------

    /// Patch header fields. `status` is only written when the patch carries one.
    pub async fn update_header(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateEvaluation,
    ) -> Result<Option<Evaluation>, sqlx::Error> {
        let query = format!(
            "UPDATE evaluations SET
                video_id = COALESCE($2, video_id),
                location = COALESCE($3, location),
                evaluated_collaborator = COALESCE($4, evaluated_collaborator),
                status = COALESCE($5, status)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Evaluation>(&query)
            .bind(id)
            .bind(input.video_id)
            .bind(&input.location)
            .bind(&input.evaluated_collaborator)
            .bind(input.status.map(EvaluationStatus::as_str))
            .fetch_optional(conn)
            .await
    }

    /// Patch the submitted values of one answer of `evaluation_id`.
    ///
    /// Each value column is written only when the patch carries the key, so
    /// an explicit `null` clears it. Returns `None` if the answer does not
    /// belong to the evaluation.
    pub async fn update_answer_values(
        conn: &mut PgConnection,
        evaluation_id: DbId,
        input: &UpdateEvaluationAnswer,
    ) -> Result<Option<EvaluationAnswer>, sqlx::Error> {
        let query = format!(
            "UPDATE evaluation_answers SET
                value_number = CASE WHEN $3 THEN $4 ELSE value_number END,
                value_boolean = CASE WHEN $5 THEN $6 ELSE value_boolean END,
                comment = CASE WHEN $7 THEN $8 ELSE comment END
             WHERE id = $1 AND evaluation_id = $2 AND deleted_at IS NULL
             RETURNING {ANSWER_COLUMNS}"
        );
        sqlx::query_as::<_, EvaluationAnswer>(&query)
            .bind(input.id)
            .bind(evaluation_id)
            .bind(input.value_number.is_some())
            .bind(input.value_number.flatten())
            .bind(input.value_boolean.is_some())
            .bind(input.value_boolean.flatten())
            .bind(input.comment.is_some())
            .bind(input.comment.as_ref().and_then(|c| c.as_deref()))
            .fetch_optional(conn)
            .await
    }

    /// Overwrite the recorded scoring snapshot of one answer.
    ///
    /// Only called while the evaluation itself is being (re)submitted.
    pub async fn record_answer_score(
        conn: &mut PgConnection,
        answer_id: DbId,
        recorded: &RecordedScore,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE evaluation_answers SET
                recorded_aspect_max = $2,
                recorded_points_awarded = $3,
                recorded_section_max = $4
             WHERE id = $1",
        )
        .bind(answer_id)
        .bind(recorded.aspect_max)
        .bind(recorded.points_awarded)
        .bind(recorded.section_max)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Store new totals for an evaluation.
    pub async fn set_totals(
        conn: &mut PgConnection,
        id: DbId,
        total_score: f64,
        percentage_score: f64,
    ) -> Result<Option<Evaluation>, sqlx::Error> {
        let query = format!(
            "UPDATE evaluations SET total_score = $2, percentage_score = $3
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Evaluation>(&query)
            .bind(id)
            .bind(total_score)
            .bind(percentage_score)
            .fetch_optional(conn)
            .await
    }

    /// Change the review status of an evaluation.
    pub async fn change_status(
        pool: &PgPool,
        id: DbId,
        status: EvaluationStatus,
    ) -> Result<Option<Evaluation>, sqlx::Error> {
        let query = format!(
            "UPDATE evaluations SET status = $2
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Evaluation>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete an evaluation. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE evaluations SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
