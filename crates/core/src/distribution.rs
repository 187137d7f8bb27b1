//! Form weight distribution.
//!
//! Validates that a drafted form can be scored and assigns the final
//! `maximum_score` of every aspect:
//!
//! - Section maximums must sum to [`FORM_TOTAL_SCORE`].
//! - `NUMBER` aspects keep the weight their author declared.
//! - Whatever a section has left after its `NUMBER` aspects is split evenly
//!   across its `BOOLEAN` aspects (author values for those are ignored).
//! - A section without `BOOLEAN` aspects must already balance exactly.

use crate::error::SchemaValidationError;
use crate::survey::{
    AspectKind, FinalizedAspect, FinalizedSection, SectionDraft, FORM_TOTAL_SCORE,
    WEIGHT_TOLERANCE,
};

/// Validate a drafted form and return its sections with final aspect weights.
///
/// Sections and aspects keep their input order. The input is not modified.
pub fn validate_and_distribute(
    sections: &[SectionDraft],
) -> Result<Vec<FinalizedSection>, SchemaValidationError> {
    if sections.is_empty() {
        return Err(SchemaValidationError::EmptyForm);
    }

    for section in sections {
        check_non_negative(&section.name, None, section.maximum_score)?;
    }

    let total = section_total(sections.iter().map(|s| s.maximum_score));
    let difference = total - FORM_TOTAL_SCORE;
    if difference.abs() > WEIGHT_TOLERANCE {
        return Err(SchemaValidationError::SectionTotalMismatch {
            total,
            expected: FORM_TOTAL_SCORE,
            difference,
        });
    }

    sections.iter().map(distribute_section).collect()
}

/// Sum a sequence of section maximums.
pub fn section_total(maximums: impl IntoIterator<Item = f64>) -> f64 {
    maximums.into_iter().sum()
}

/// Returns `true` if the aspects of `section` add up to its maximum.
pub fn check_conservation(section: &FinalizedSection) -> bool {
    let sum: f64 = section.aspects.iter().map(|a| a.maximum_score).sum();
    (sum - section.maximum_score).abs() <= WEIGHT_TOLERANCE
}

fn distribute_section(section: &SectionDraft) -> Result<FinalizedSection, SchemaValidationError> {
    let mut number_sum = 0.0;
    let mut boolean_count = 0usize;

    for aspect in &section.aspects {
        match aspect.kind {
            AspectKind::Number => {
                let declared = aspect.maximum_score.ok_or_else(|| {
                    SchemaValidationError::MissingAspectMaximum {
                        section: section.name.clone(),
                        aspect: aspect.description.clone(),
                    }
                })?;
                check_non_negative(&section.name, Some(&aspect.description), declared)?;
                number_sum += declared;
            }
            AspectKind::Boolean => boolean_count += 1,
        }
    }

    let section_max = section.maximum_score;
    let remaining = section_max - number_sum;

    if remaining < -WEIGHT_TOLERANCE {
        return Err(SchemaValidationError::NumberBudgetExceeded {
            section: section.name.clone(),
            section_max,
            number_sum,
            excess: -remaining,
        });
    }

    let boolean_share = if boolean_count > 0 {
        if remaining <= WEIGHT_TOLERANCE {
            return Err(SchemaValidationError::NoBudgetForBoolean {
                section: section.name.clone(),
                section_max,
                number_sum,
                remaining,
            });
        }
        remaining / boolean_count as f64
    } else {
        if remaining.abs() > WEIGHT_TOLERANCE {
            return Err(SchemaValidationError::UnbalancedSection {
                section: section.name.clone(),
                section_max,
                number_sum,
                difference: remaining,
            });
        }
        0.0
    };

    let aspects = section
        .aspects
        .iter()
        .map(|aspect| FinalizedAspect {
            description: aspect.description.clone(),
            kind: aspect.kind,
            // NUMBER maximums were checked present above.
            maximum_score: match aspect.kind {
                AspectKind::Number => aspect.maximum_score.unwrap_or_default(),
                AspectKind::Boolean => boolean_share,
            },
            order: aspect.order,
        })
        .collect();

    Ok(FinalizedSection {
        name: section.name.clone(),
        maximum_score: section_max,
        order: section.order,
        aspects,
    })
}

fn check_non_negative(
    section: &str,
    aspect: Option<&str>,
    value: f64,
) -> Result<(), SchemaValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SchemaValidationError::NegativeScore {
            section: section.to_string(),
            aspect: aspect.map(str::to_string),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::survey::AspectDraft;

    fn number(description: &str, max: f64) -> AspectDraft {
        AspectDraft {
            description: description.to_string(),
            kind: AspectKind::Number,
            maximum_score: Some(max),
            order: 0,
        }
    }

    fn boolean(description: &str) -> AspectDraft {
        AspectDraft {
            description: description.to_string(),
            kind: AspectKind::Boolean,
            maximum_score: None,
            order: 0,
        }
    }

    fn section(name: &str, max: f64, aspects: Vec<AspectDraft>) -> SectionDraft {
        SectionDraft {
            name: name.to_string(),
            maximum_score: max,
            order: 0,
            aspects,
        }
    }

    // -- distribution ---------------------------------------------------------

    #[test]
    fn boolean_absorbs_leftover_budget() {
        let sections = vec![
            section(
                "Service",
                30.0,
                vec![number("Speed", 10.0), number("Accuracy", 15.0), boolean("Smiled")],
            ),
            section("Store", 70.0, vec![number("Cleanliness", 70.0)]),
        ];

        let result = validate_and_distribute(&sections).unwrap();
        let service = &result[0];
        assert_eq!(service.aspects[0].maximum_score, 10.0);
        assert_eq!(service.aspects[1].maximum_score, 15.0);
        assert!((service.aspects[2].maximum_score - 5.0).abs() < 1e-9);
    }

    #[test]
    fn boolean_share_is_equal_split() {
        let sections = vec![section(
            "Greeting",
            100.0,
            vec![number("Wait", 40.0), boolean("Hello"), boolean("Name"), boolean("Eye contact")],
        )];

        let result = validate_and_distribute(&sections).unwrap();
        for aspect in &result[0].aspects[1..] {
            assert!((aspect.maximum_score - 20.0).abs() < 1e-9);
        }
    }

    #[test]
    fn boolean_author_value_is_overwritten() {
        let mut declared = boolean("Hello");
        declared.maximum_score = Some(99.0);
        let sections = vec![section("Greeting", 100.0, vec![number("Wait", 50.0), declared])];

        let result = validate_and_distribute(&sections).unwrap();
        assert!((result[0].aspects[1].maximum_score - 50.0).abs() < 1e-9);
    }

    #[test]
    fn all_boolean_section_splits_whole_budget() {
        let sections = vec![
            section("A", 60.0, vec![boolean("x"), boolean("y"), boolean("z")]),
            section("B", 40.0, vec![boolean("w")]),
        ];

        let result = validate_and_distribute(&sections).unwrap();
        assert!((result[0].aspects[0].maximum_score - 20.0).abs() < 1e-9);
        assert!((result[1].aspects[0].maximum_score - 40.0).abs() < 1e-9);
    }

    #[test]
    fn every_finalized_section_conserves_weight() {
        let sections = vec![
            section("A", 33.3, vec![number("a1", 10.1), boolean("a2"), boolean("a3")]),
            section("B", 33.3, vec![boolean("b1"), boolean("b2"), boolean("b3")]),
            section("C", 33.4, vec![number("c1", 33.4)]),
        ];

        let result = validate_and_distribute(&sections).unwrap();
        assert!(result.iter().all(check_conservation));
        let total = section_total(result.iter().map(|s| s.maximum_score));
        assert!((total - 100.0).abs() < 1e-6);
    }

    #[test]
    fn order_and_descriptions_are_preserved() {
        let mut first = section("First", 50.0, vec![number("n", 50.0)]);
        first.order = 2;
        let second = section("Second", 50.0, vec![boolean("b")]);

        let result = validate_and_distribute(&[first, second]).unwrap();
        assert_eq!(result[0].name, "First");
        assert_eq!(result[0].order, 2);
        assert_eq!(result[1].aspects[0].description, "b");
    }

    // -- form total -----------------------------------------------------------

    #[test]
    fn sections_summing_to_100_pass() {
        let sections = vec![
            section("A", 60.0, vec![boolean("a")]),
            section("B", 40.0, vec![boolean("b")]),
        ];
        assert!(validate_and_distribute(&sections).is_ok());
    }

    #[test]
    fn sections_summing_to_110_fail() {
        let sections = vec![
            section("A", 60.0, vec![boolean("a")]),
            section("B", 50.0, vec![boolean("b")]),
        ];
        assert_matches!(
            validate_and_distribute(&sections),
            Err(SchemaValidationError::SectionTotalMismatch { total, .. }) if (total - 110.0).abs() < 1e-9
        );
    }

    #[test]
    fn float_drift_within_tolerance_is_accepted() {
        let sections = vec![
            section("A", 0.1 + 0.2, vec![boolean("a")]),
            section("B", 99.7, vec![boolean("b")]),
        ];
        assert!(validate_and_distribute(&sections).is_ok());
    }

    #[test]
    fn empty_form_fails() {
        assert_matches!(validate_and_distribute(&[]), Err(SchemaValidationError::EmptyForm));
    }

    // -- per-section budget ---------------------------------------------------

    #[test]
    fn number_sum_over_budget_fails_with_excess() {
        let sections = vec![
            section("Greeting", 20.0, vec![number("Wait", 25.0)]),
            section("Rest", 80.0, vec![boolean("x")]),
        ];
        assert_matches!(
            validate_and_distribute(&sections),
            Err(SchemaValidationError::NumberBudgetExceeded { section, excess, .. })
                if section == "Greeting" && (excess - 5.0).abs() < 1e-9
        );
    }

    #[test]
    fn booleans_without_budget_fail() {
        let sections = vec![section(
            "Greeting",
            100.0,
            vec![number("Wait", 100.0), boolean("Hello")],
        )];
        assert_matches!(
            validate_and_distribute(&sections),
            Err(SchemaValidationError::NoBudgetForBoolean { section, .. }) if section == "Greeting"
        );
    }

    #[test]
    fn unbalanced_number_only_section_fails() {
        let sections = vec![section("Greeting", 100.0, vec![number("Wait", 90.0)])];
        assert_matches!(
            validate_and_distribute(&sections),
            Err(SchemaValidationError::UnbalancedSection { difference, .. })
                if (difference - 10.0).abs() < 1e-9
        );
    }

    #[test]
    fn section_without_aspects_must_be_zero_weight() {
        let sections = vec![
            section("Empty", 10.0, vec![]),
            section("Rest", 90.0, vec![boolean("x")]),
        ];
        assert_matches!(
            validate_and_distribute(&sections),
            Err(SchemaValidationError::UnbalancedSection { .. })
        );

        let sections = vec![
            section("Empty", 0.0, vec![]),
            section("Rest", 100.0, vec![boolean("x")]),
        ];
        assert!(validate_and_distribute(&sections).is_ok());
    }

    #[test]
    fn number_without_maximum_fails() {
        let mut aspect = number("Wait", 0.0);
        aspect.maximum_score = None;
        let sections = vec![section("Greeting", 100.0, vec![aspect, boolean("x")])];
        assert_matches!(
            validate_and_distribute(&sections),
            Err(SchemaValidationError::MissingAspectMaximum { aspect, .. }) if aspect == "Wait"
        );
    }

    #[test]
    fn negative_weights_fail() {
        let sections = vec![
            section("A", 110.0, vec![boolean("a")]),
            section("B", -10.0, vec![boolean("b")]),
        ];
        assert_matches!(
            validate_and_distribute(&sections),
            Err(SchemaValidationError::NegativeScore { aspect: None, .. })
        );

        let sections = vec![section(
            "A",
            100.0,
            vec![number("n", -5.0), boolean("b")],
        )];
        assert_matches!(
            validate_and_distribute(&sections),
            Err(SchemaValidationError::NegativeScore { aspect: Some(_), .. })
        );
    }

    #[test]
    fn input_is_not_mutated() {
        let mut declared = boolean("Hello");
        declared.maximum_score = Some(3.0);
        let sections = vec![section("Greeting", 100.0, vec![declared])];

        validate_and_distribute(&sections).unwrap();
        assert_eq!(sections[0].aspects[0].maximum_score, Some(3.0));
    }
}
