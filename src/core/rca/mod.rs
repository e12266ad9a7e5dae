//! Variance Analysis Module
//!
//! Contribution matrix, alerting and narrative building for month-over-month
//! cost changes.

pub mod narrative;
pub mod variance;

pub use narrative::{Contributor, NarrativeGenerator, TransitionNarrative};
pub use variance::{
    Alert, ContributionMatrix, Decomposition, Transition, TransitionTotals, VarianceDecomposer,
    DEFAULT_ALERT_THRESHOLD,
};
