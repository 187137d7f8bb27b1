//! Evaluation scoring.
//!
//! Converts submitted answers into awarded points against a persisted
//! [`FormTree`]. The computation is deterministic: the same tree and the
//! same answers always produce the same [`ScoringResult`].

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::survey::{AspectKind, FormTree, TreeAspect, ANSWER_TOLERANCE};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// One submitted answer. Which value is read depends on the aspect's kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerInput {
    pub aspect_id: DbId,
    pub value_number: Option<f64>,
    pub value_boolean: Option<bool>,
}

/// Full scoring breakdown for one submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringResult {
    pub form_id: DbId,
    pub total_possible: f64,
    pub total_awarded: f64,
    pub percentage: f64,
    pub sections: BTreeMap<DbId, SectionScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionScore {
    pub section_name: String,
    pub section_max: f64,
    pub section_awarded: f64,
    /// Only answered aspects appear here.
    pub aspects: BTreeMap<DbId, AspectScore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AspectScore {
    pub aspect_max: f64,
    pub awarded: f64,
}

/// Submission-time snapshot stored on an evaluation answer.
///
/// Written once per scoring and never derived again from the live form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecordedScore {
    pub aspect_max: f64,
    pub points_awarded: f64,
    pub section_max: f64,
}

impl ScoringResult {
    /// The recorded snapshot for an answered aspect.
    pub fn recorded_for(&self, aspect_id: DbId) -> Option<RecordedScore> {
        self.sections.values().find_map(|section| {
            section.aspects.get(&aspect_id).map(|aspect| RecordedScore {
                aspect_max: aspect.aspect_max,
                points_awarded: aspect.awarded,
                section_max: section.section_max,
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Score `answers` against `form`.
///
/// Fails on the first unknown aspect, duplicate answer, or invalid numeric
/// value; no partial result is returned. Unanswered aspects contribute zero
/// but their sections still count toward `total_possible`.
pub fn score_answers(form: &FormTree, answers: &[AnswerInput]) -> Result<ScoringResult, ScoringError> {
    let mut lookup: HashMap<DbId, (DbId, &TreeAspect)> = HashMap::new();
    let mut sections = BTreeMap::new();

    for section in &form.sections {
        sections.insert(
            section.id,
            SectionScore {
                section_name: section.name.clone(),
                section_max: section.maximum_score,
                section_awarded: 0.0,
                aspects: BTreeMap::new(),
            },
        );
        for aspect in &section.aspects {
            lookup.insert(aspect.id, (section.id, aspect));
        }
    }

    let mut seen = HashSet::with_capacity(answers.len());

    for answer in answers {
        let (section_id, aspect) = lookup
            .get(&answer.aspect_id)
            .copied()
            .ok_or(ScoringError::UnknownAspect {
                aspect_id: answer.aspect_id,
            })?;

        if !seen.insert(answer.aspect_id) {
            return Err(ScoringError::DuplicateAnswer {
                aspect_id: answer.aspect_id,
            });
        }

        let awarded = award(aspect, answer)?;

        if let Some(section) = sections.get_mut(&section_id) {
            section.aspects.insert(
                aspect.id,
                AspectScore {
                    aspect_max: aspect.maximum_score,
                    awarded,
                },
            );
            section.section_awarded += awarded;
        }
    }

    let total_possible = form.total_possible();
    let total_awarded: f64 = sections.values().map(|s| s.section_awarded).sum();
    let percentage = if total_possible > 0.0 {
        total_awarded / total_possible * 100.0
    } else {
        0.0
    };

    Ok(ScoringResult {
        form_id: form.form_id,
        total_possible,
        total_awarded,
        percentage,
        sections,
    })
}

/// Points credited to one answer.
fn award(aspect: &TreeAspect, answer: &AnswerInput) -> Result<f64, ScoringError> {
    match aspect.kind {
        AspectKind::Boolean => Ok(if answer.value_boolean.unwrap_or(false) {
            aspect.maximum_score
        } else {
            0.0
        }),
        AspectKind::Number => {
            let Some(value) = answer.value_number else {
                return Ok(0.0);
            };
            if !value.is_finite() || value < 0.0 {
                return Err(ScoringError::InvalidValue {
                    aspect_id: aspect.id,
                    value,
                });
            }
            if value > aspect.maximum_score + ANSWER_TOLERANCE {
                return Err(ScoringError::ExceedsMaximum {
                    aspect_id: aspect.id,
                    value,
                    maximum: aspect.maximum_score,
                });
            }
            Ok(value)
        }
    }
}
