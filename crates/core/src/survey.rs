//! Survey form model: author drafts, distributed sections, and the persisted
//! tree the scorer reads.
//!
//! A form is a strict tree: form -> sections -> aspects. Sections carry a
//! share of the form's 100-point budget; aspects carry the per-answer
//! ceiling assigned by [`crate::distribution`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Section maximum scores of a form must sum to this value.
pub const FORM_TOTAL_SCORE: f64 = 100.0;

/// Float tolerance for weight sums (form total and per-section conservation).
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Float tolerance when comparing a numeric answer with its aspect ceiling.
pub const ANSWER_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Aspect kind
// ---------------------------------------------------------------------------

/// How an aspect is answered and scored.
///
/// `Number` aspects keep the weight the author declared and accept a numeric
/// answer up to that weight. `Boolean` aspects share whatever budget the
/// section has left and award all or nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AspectKind {
    Number,
    Boolean,
}

impl AspectKind {
    pub const NUMBER: &'static str = "NUMBER";
    pub const BOOLEAN: &'static str = "BOOLEAN";

    /// The value stored in `survey_aspects.aspect_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            AspectKind::Number => Self::NUMBER,
            AspectKind::Boolean => Self::BOOLEAN,
        }
    }
}

impl fmt::Display for AspectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::NUMBER => Ok(AspectKind::Number),
            Self::BOOLEAN => Ok(AspectKind::Boolean),
            other => Err(CoreError::Internal(format!("Unknown aspect type: '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Author drafts
// ---------------------------------------------------------------------------

/// A form as submitted by its author on create or update.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FormDraft {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(nested)]
    pub sections: Vec<SectionDraft>,
}

/// One section of a [`FormDraft`].
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SectionDraft {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub maximum_score: f64,
    #[serde(default)]
    pub order: i32,
    #[validate(nested)]
    pub aspects: Vec<AspectDraft>,
}

/// One aspect of a [`SectionDraft`].
///
/// `maximum_score` is required for `NUMBER` aspects and ignored for
/// `BOOLEAN` ones.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AspectDraft {
    #[validate(length(min = 1))]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: AspectKind,
    pub maximum_score: Option<f64>,
    #[serde(default)]
    pub order: i32,
}

// ---------------------------------------------------------------------------
// Distributed (not yet persisted) tree
// ---------------------------------------------------------------------------

/// A section whose aspect weights have been finalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalizedSection {
    pub name: String,
    pub maximum_score: f64,
    pub order: i32,
    pub aspects: Vec<FinalizedAspect>,
}

/// An aspect with its authoritative `maximum_score`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalizedAspect {
    pub description: String,
    #[serde(rename = "type")]
    pub kind: AspectKind,
    pub maximum_score: f64,
    pub order: i32,
}

// ---------------------------------------------------------------------------
// Persisted tree
// ---------------------------------------------------------------------------

/// A persisted form with its non-deleted sections and aspects, as read at
/// scoring time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormTree {
    pub form_id: DbId,
    pub title: String,
    pub sections: Vec<TreeSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeSection {
    pub id: DbId,
    pub name: String,
    pub maximum_score: f64,
    pub order: i32,
    pub aspects: Vec<TreeAspect>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeAspect {
    pub id: DbId,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: AspectKind,
    pub maximum_score: f64,
    pub order: i32,
}

impl FormTree {
    /// Sum of every section's maximum score.
    pub fn total_possible(&self) -> f64 {
        self.sections.iter().map(|s| s.maximum_score).sum()
    }
}

/// Flatten `validator` errors into a single message for
/// [`CoreError::Validation`].
pub fn validate_draft(draft: &FormDraft) -> Result<(), CoreError> {
    draft
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_kind_round_trips_through_db_strings() {
        assert_eq!("NUMBER".parse::<AspectKind>().unwrap(), AspectKind::Number);
        assert_eq!("BOOLEAN".parse::<AspectKind>().unwrap(), AspectKind::Boolean);
        assert_eq!(AspectKind::Boolean.as_str(), "BOOLEAN");
    }

    #[test]
    fn unknown_aspect_kind_is_rejected() {
        assert!("boolean".parse::<AspectKind>().is_err());
        assert!("TEXT".parse::<AspectKind>().is_err());
    }

    #[test]
    fn draft_deserializes_type_field() {
        let draft: FormDraft = serde_json::from_value(serde_json::json!({
            "title": "Store visit",
            "sections": [{
                "name": "Greeting",
                "maximum_score": 100.0,
                "order": 1,
                "aspects": [
                    { "description": "Smiles", "type": "BOOLEAN", "order": 1 },
                    { "description": "Wait time", "type": "NUMBER", "maximum_score": 40.0 }
                ]
            }]
        }))
        .unwrap();

        let aspects = &draft.sections[0].aspects;
        assert_eq!(aspects[0].kind, AspectKind::Boolean);
        assert_eq!(aspects[0].maximum_score, None);
        assert_eq!(aspects[1].kind, AspectKind::Number);
        assert_eq!(aspects[1].order, 0);
    }

    #[test]
    fn blank_title_fails_validation() {
        let draft = FormDraft {
            title: String::new(),
            sections: vec![],
        };
        assert!(matches!(
            validate_draft(&draft),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn blank_nested_aspect_description_fails_validation() {
        let draft = FormDraft {
            title: "Visit".into(),
            sections: vec![SectionDraft {
                name: "Greeting".into(),
                maximum_score: 100.0,
                order: 0,
                aspects: vec![AspectDraft {
                    description: String::new(),
                    kind: AspectKind::Boolean,
                    maximum_score: None,
                    order: 0,
                }],
            }],
        };
        assert!(validate_draft(&draft).is_err());
    }
}
