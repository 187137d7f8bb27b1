//! Survey form, section and aspect rows.
//!
//! Maps to `survey_forms`, `survey_sections` and `survey_aspects`
//! (migration 000002). Aspect weights stored here have already been
//! finalized by `cxeval_core::distribution`.

use cxeval_core::error::CoreError;
use cxeval_core::survey::{AspectKind, FormTree, TreeAspect, TreeSection};
use cxeval_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A row from the `survey_forms` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SurveyForm {
    pub id: DbId,
    pub company_id: DbId,
    pub title: String,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `survey_sections` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SurveySection {
    pub id: DbId,
    pub form_id: DbId,
    pub name: String,
    pub maximum_score: f64,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `survey_aspects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SurveyAspect {
    pub id: DbId,
    pub section_id: DbId,
    pub description: String,
    /// `NUMBER` or `BOOLEAN`; see [`AspectKind`].
    pub aspect_type: String,
    pub maximum_score: f64,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Loaded tree
// ---------------------------------------------------------------------------

/// A form with its non-deleted sections, each with its non-deleted aspects.
#[derive(Debug, Clone)]
pub struct FormTreeRows {
    pub form: SurveyForm,
    pub sections: Vec<(SurveySection, Vec<SurveyAspect>)>,
}

impl FormTreeRows {
    /// Convert raw rows into the tree the scoring engine consumes.
    pub fn into_form_tree(self) -> Result<FormTree, CoreError> {
        let sections = self
            .sections
            .into_iter()
            .map(|(section, aspects)| {
                let aspects = aspects
                    .into_iter()
                    .map(|a| {
                        Ok(TreeAspect {
                            id: a.id,
                            kind: a.aspect_type.parse::<AspectKind>()?,
                            description: a.description,
                            maximum_score: a.maximum_score,
                            order: a.sort_order,
                        })
                    })
                    .collect::<Result<Vec<_>, CoreError>>()?;
                Ok(TreeSection {
                    id: section.id,
                    name: section.name,
                    maximum_score: section.maximum_score,
                    order: section.sort_order,
                    aspects,
                })
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        Ok(FormTree {
            form_id: self.form.id,
            title: self.form.title,
            sections,
        })
    }
}
