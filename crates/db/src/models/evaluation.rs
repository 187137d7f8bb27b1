//! Evaluation and evaluation answer rows (migration 000004).
//!
//! `total_score`, `percentage_score` and the `recorded_*` answer columns are
//! written only from a `cxeval_core::scoring::ScoringResult`.

use cxeval_core::scoring::{AnswerInput, RecordedScore};
use cxeval_core::types::{DbId, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Review status of an evaluation, stored as text in `evaluations.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationStatus {
    Submitted,
    Updated,
    Approved,
    Rejected,
}

impl EvaluationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EvaluationStatus::Submitted => "submitted",
            EvaluationStatus::Updated => "updated",
            EvaluationStatus::Approved => "approved",
            EvaluationStatus::Rejected => "rejected",
        }
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A row from the `evaluations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Evaluation {
    pub id: DbId,
    pub campaign_id: DbId,
    pub user_id: Option<DbId>,
    pub video_id: Option<DbId>,
    pub location: Option<String>,
    pub evaluated_collaborator: Option<String>,
    pub status: String,
    pub total_score: f64,
    pub percentage_score: f64,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `evaluation_answers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EvaluationAnswer {
    pub id: DbId,
    pub evaluation_id: DbId,
    pub aspect_id: DbId,
    pub value_number: Option<f64>,
    pub value_boolean: Option<bool>,
    pub comment: Option<String>,
    pub recorded_aspect_max: f64,
    pub recorded_points_awarded: f64,
    pub recorded_section_max: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl EvaluationAnswer {
    /// The scoring input this stored answer represents.
    pub fn as_input(&self) -> AnswerInput {
        AnswerInput {
            aspect_id: self.aspect_id,
            value_number: self.value_number,
            value_boolean: self.value_boolean,
        }
    }
}

/// An evaluation together with its answers.
#[derive(Debug, Serialize)]
pub struct EvaluationWithAnswers {
    #[serde(flatten)]
    pub evaluation: Evaluation,
    pub answers: Vec<EvaluationAnswer>,
}

// ---------------------------------------------------------------------------
// Create DTOs
// ---------------------------------------------------------------------------

/// Request body for submitting a new evaluation.
#[derive(Debug, Deserialize)]
pub struct CreateEvaluation {
    pub campaign_id: DbId,
    pub user_id: Option<DbId>,
    pub video_id: Option<DbId>,
    pub location: Option<String>,
    pub evaluated_collaborator: Option<String>,
    pub answers: Vec<CreateEvaluationAnswer>,
}

/// One submitted answer inside [`CreateEvaluation`].
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvaluationAnswer {
    pub aspect_id: DbId,
    pub value_number: Option<f64>,
    pub value_boolean: Option<bool>,
    pub comment: Option<String>,
}

impl CreateEvaluationAnswer {
    pub fn as_input(&self) -> AnswerInput {
        AnswerInput {
            aspect_id: self.aspect_id,
            value_number: self.value_number,
            value_boolean: self.value_boolean,
        }
    }
}

/// An answer ready for insertion, carrying its scoring snapshot.
#[derive(Debug, Clone)]
pub struct NewEvaluationAnswer<'a> {
    pub answer: &'a CreateEvaluationAnswer,
    pub recorded: RecordedScore,
}

// ---------------------------------------------------------------------------
// Update DTOs
// ---------------------------------------------------------------------------

/// Request body for updating an evaluation. `None` fields are left as-is.
///
/// `status` is only written when sent; a plain edit keeps the current
/// review status.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateEvaluation {
    pub video_id: Option<DbId>,
    pub location: Option<String>,
    pub evaluated_collaborator: Option<String>,
    pub status: Option<EvaluationStatus>,
    pub answers: Option<Vec<UpdateEvaluationAnswer>>,
}

/// A patch to one existing answer, addressed by answer id.
///
/// Value fields use `Option<Option<T>>`: an absent key leaves the column
/// alone, an explicit `null` clears it.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEvaluationAnswer {
    pub id: DbId,
    #[serde(default, deserialize_with = "present")]
    pub value_number: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub value_boolean: Option<Option<bool>>,
    #[serde(default, deserialize_with = "present")]
    pub comment: Option<Option<String>>,
}

/// Maps a present key to `Some`, including `null`. Absent keys fall back to
/// `#[serde(default)]`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Request body for `PUT /evaluations/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: EvaluationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_match_check_constraint() {
        for (status, expected) in [
            (EvaluationStatus::Submitted, "submitted"),
            (EvaluationStatus::Updated, "updated"),
            (EvaluationStatus::Approved, "approved"),
            (EvaluationStatus::Rejected, "rejected"),
        ] {
            assert_eq!(status.as_str(), expected);
        }
    }

    #[test]
    fn answer_patch_tells_absent_from_null() {
        let patch: UpdateEvaluationAnswer =
            serde_json::from_str(r#"{"id": 7, "value_number": null, "comment": "late"}"#).unwrap();
        assert_eq!(patch.value_number, Some(None));
        assert_eq!(patch.value_boolean, None);
        assert_eq!(patch.comment, Some(Some("late".to_string())));
    }

    #[test]
    fn update_without_status_keeps_it_unset() {
        let update: UpdateEvaluation = serde_json::from_str(r#"{"location": "Route 10"}"#).unwrap();
        assert_eq!(update.status, None);

        let update: UpdateEvaluation = serde_json::from_str(r#"{"status": "approved"}"#).unwrap();
        assert_eq!(update.status, Some(EvaluationStatus::Approved));
    }
}
