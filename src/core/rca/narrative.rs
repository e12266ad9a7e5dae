//! Narrative Generator
//!
//! Turns a contribution matrix into plain statements: for every transition the
//! category that drove the change and, when one exists, the category that
//! pushed the other way.

use crate::core::metrics::format_pct;
use crate::core::rca::variance::{ContributionMatrix, Transition};
use serde::{Deserialize, Serialize};

/// A category and its contribution fraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    pub category: String,
    pub contribution: f64,
}

/// Structured explanation of one transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionNarrative {
    pub transition: Transition,

    /// Largest contribution (primary driver)
    pub top: Contributor,

    /// Smallest contribution, only when it is negative
    pub offset: Option<Contributor>,
}

impl TransitionNarrative {
    /// Human-readable statements, driver first
    pub fn statements(&self) -> Vec<String> {
        let mut out = vec![format!(
            "In the {} transition, category {} drove the change with a contribution of {}.",
            self.transition,
            self.top.category,
            format_pct(self.top.contribution)
        )];
        if let Some(ref offset) = self.offset {
            out.push(format!(
                "Category {} offset the change with {}.",
                offset.category,
                format_pct(offset.contribution)
            ));
        }
        out
    }
}

/// Narrative generator
pub struct NarrativeGenerator;

impl NarrativeGenerator {
    /// Explain every transition of `matrix` in chronological order
    pub fn narratives(matrix: &ContributionMatrix) -> Vec<TransitionNarrative> {
        matrix
            .transitions()
            .filter_map(|transition| Self::explain_transition(matrix, transition))
            .collect()
    }

    /// Flattened statements for every transition, chronological
    pub fn explain(matrix: &ContributionMatrix) -> Vec<String> {
        Self::narratives(matrix)
            .iter()
            .flat_map(TransitionNarrative::statements)
            .collect()
    }

    /// Pick top and bottom of one column; ties go to the first category
    /// in lexicographic order
    fn explain_transition(
        matrix: &ContributionMatrix,
        transition: Transition,
    ) -> Option<TransitionNarrative> {
        let column = matrix.column(transition);
        let (first, rest) = column.split_first()?;

        let mut top = *first;
        let mut bottom = *first;
        for &(category, value) in rest {
            if value > top.1 {
                top = (category, value);
            }
            if value < bottom.1 {
                bottom = (category, value);
            }
        }

        let offset = if bottom.1 < 0.0 {
            Some(Contributor {
                category: bottom.0.to_string(),
                contribution: bottom.1,
            })
        } else {
            None
        };

        Some(TransitionNarrative {
            transition,
            top: Contributor {
                category: top.0.to_string(),
                contribution: top.1,
            },
            offset,
        })
    }
}
