use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Schema(#[from] SchemaValidationError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A survey form whose weights cannot be scored consistently.
///
/// Raised while authoring a form, before anything is persisted. Each
/// variant names the offending section and the numeric discrepancy so the
/// author can fix the schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaValidationError {
    #[error("A survey form needs at least one section")]
    EmptyForm,

    #[error(
        "Section maximum scores must sum to {expected}, got {total} (difference {difference})"
    )]
    SectionTotalMismatch {
        total: f64,
        expected: f64,
        difference: f64,
    },

    #[error(
        "Section '{section}': NUMBER aspects sum to {number_sum}, exceeding the section maximum \
         of {section_max} by {excess}"
    )]
    NumberBudgetExceeded {
        section: String,
        section_max: f64,
        number_sum: f64,
        excess: f64,
    },

    #[error(
        "Section '{section}': NUMBER aspects sum to {number_sum} of {section_max}, leaving \
         {remaining} for its BOOLEAN aspects"
    )]
    NoBudgetForBoolean {
        section: String,
        section_max: f64,
        number_sum: f64,
        remaining: f64,
    },

    #[error(
        "Section '{section}': NUMBER aspects sum to {number_sum} but the section maximum is \
         {section_max} (difference {difference}) and there are no BOOLEAN aspects to absorb it"
    )]
    UnbalancedSection {
        section: String,
        section_max: f64,
        number_sum: f64,
        difference: f64,
    },

    #[error("Section '{section}': NUMBER aspect '{aspect}' has no maximum_score")]
    MissingAspectMaximum { section: String, aspect: String },

    #[error("Section '{section}': score {value} must be a finite, non-negative number{}",
        .aspect.as_ref().map(|a| format!(" (aspect '{a}')")).unwrap_or_default())]
    NegativeScore {
        section: String,
        aspect: Option<String>,
        value: f64,
    },
}

/// A submitted answer set that cannot be scored against its form.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("No survey form linked to campaign {campaign_id}")]
    NoFormLinked { campaign_id: DbId },

    #[error("Answer references unknown aspect_id {aspect_id}")]
    UnknownAspect { aspect_id: DbId },

    #[error("Numeric answer for aspect {aspect_id} ({value}) exceeds maximum {maximum}")]
    ExceedsMaximum {
        aspect_id: DbId,
        value: f64,
        maximum: f64,
    },

    #[error("Numeric answer for aspect {aspect_id} ({value}) must be a finite, non-negative number")]
    InvalidValue { aspect_id: DbId, value: f64 },

    #[error("Aspect {aspect_id} is answered more than once")]
    DuplicateAnswer { aspect_id: DbId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_budget_message_names_section_and_excess() {
        let err = SchemaValidationError::NumberBudgetExceeded {
            section: "Greeting".into(),
            section_max: 20.0,
            number_sum: 25.0,
            excess: 5.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("'Greeting'"));
        assert!(msg.contains("by 5"));
    }

    #[test]
    fn negative_score_message_mentions_aspect_when_present() {
        let err = SchemaValidationError::NegativeScore {
            section: "Closing".into(),
            aspect: Some("Says goodbye".into()),
            value: -1.0,
        };
        assert!(err.to_string().contains("(aspect 'Says goodbye')"));

        let err = SchemaValidationError::NegativeScore {
            section: "Closing".into(),
            aspect: None,
            value: -1.0,
        };
        assert!(!err.to_string().contains("aspect"));
    }

    #[test]
    fn scoring_error_converts_into_core_error() {
        let err: CoreError = ScoringError::UnknownAspect { aspect_id: 9 }.into();
        assert_eq!(err.to_string(), "Answer references unknown aspect_id 9");
    }
}
