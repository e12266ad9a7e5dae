//! Month-over-Month Variance Decomposition
//!
//! Attributes the change in total cost between adjacent months to individual
//! categories. For each transition the per-category contributions are
//! `diff_category / diff_total`, so a non-vacuous column always sums to 1.0.
//! A transition whose total did not move gets all-zero contributions.

use crate::core::engine::Predicate;
use crate::core::metrics::share_of_delta;
use crate::core::models::Observation;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info};

/// Default `|contribution|` above which an alert is raised
pub const DEFAULT_ALERT_THRESHOLD: f64 = 0.5;

/// Pair of chronologically adjacent months present in the data
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Transition {
    pub prev: u32,
    pub curr: u32,
}

impl Transition {
    pub fn new(prev: u32, curr: u32) -> Self {
        Self { prev, curr }
    }

    /// Column label, e.g. "5→6"
    pub fn label(&self) -> String {
        format!("{}→{}", self.prev, self.curr)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}→{}", self.prev, self.curr)
    }
}

/// Month totals behind one matrix column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionTotals {
    pub transition: Transition,
    pub prev_total: f64,
    pub curr_total: f64,
    pub diff_total: f64,
}

/// Category × transition contribution fractions
///
/// Columns are kept in chronological order and categories in lexicographic
/// order; `cells[category][i]` belongs to `transitions[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContributionMatrix {
    transitions: Vec<TransitionTotals>,
    cells: BTreeMap<String, Vec<f64>>,
}

impl ContributionMatrix {
    /// True when there is no column to explain
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty() || self.cells.is_empty()
    }

    pub fn transitions(&self) -> impl Iterator<Item = Transition> + '_ {
        self.transitions.iter().map(|t| t.transition)
    }

    pub fn totals(&self) -> &[TransitionTotals] {
        &self.transitions
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn get(&self, category: &str, transition: Transition) -> Option<f64> {
        let idx = self.position(transition)?;
        self.cells.get(category).map(|row| row[idx])
    }

    /// One column as (category, contribution) pairs in category order
    pub fn column(&self, transition: Transition) -> Vec<(&str, f64)> {
        match self.position(transition) {
            Some(idx) => self
                .cells
                .iter()
                .map(|(category, row)| (category.as_str(), row[idx]))
                .collect(),
            None => Vec::new(),
        }
    }

    /// category -> transition label -> contribution
    pub fn to_labeled_map(&self) -> BTreeMap<String, BTreeMap<String, f64>> {
        self.cells
            .iter()
            .map(|(category, row)| {
                let by_label = self
                    .transitions
                    .iter()
                    .zip(row)
                    .map(|(t, v)| (t.transition.label(), *v))
                    .collect();
                (category.clone(), by_label)
            })
            .collect()
    }

    fn position(&self, transition: Transition) -> Option<usize> {
        self.transitions
            .iter()
            .position(|t| t.transition == transition)
    }
}

/// A category whose contribution to a transition exceeds the threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub category: String,
    pub transition: Transition,
    pub pct: f64,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} contributes {:.1}% to the {} change",
            self.category,
            self.pct * 100.0,
            self.transition
        )
    }
}

/// Matrix plus the alerts raised while building it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    pub matrix: ContributionMatrix,
    pub alerts: Vec<Alert>,
}

/// Variance decomposer
pub struct VarianceDecomposer {
    /// Alerts fire on `|contribution| > alert_threshold`
    pub alert_threshold: f64,
}

impl Default for VarianceDecomposer {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_THRESHOLD)
    }
}

impl VarianceDecomposer {
    pub fn new(alert_threshold: f64) -> Self {
        Self { alert_threshold }
    }

    /// Decompose month-over-month cost variance by category
    ///
    /// Only observations matching `predicate` with a known category and a
    /// known month (1..=12) enter the pivot. Transitions join months that are
    /// adjacent among those present, so a gap in the data is skipped rather
    /// than filled.
    pub fn decompose(&self, observations: &[Observation], predicate: &Predicate) -> Decomposition {
        // category -> month -> cost, absent cells read as zero
        let mut pivot: BTreeMap<String, BTreeMap<u32, f64>> = BTreeMap::new();
        let mut months: BTreeSet<u32> = BTreeSet::new();

        for obs in observations.iter().filter(|o| predicate.matches(o)) {
            let category = match obs.category {
                Some(ref c) => c,
                None => continue,
            };
            if obs.month_index == 0 {
                continue;
            }
            *pivot
                .entry(category.clone())
                .or_default()
                .entry(obs.month_index)
                .or_insert(0.0) += obs.cost;
            months.insert(obs.month_index);
        }

        let cell = |category: &str, month: u32| -> f64 {
            pivot
                .get(category)
                .and_then(|row| row.get(&month))
                .copied()
                .unwrap_or(0.0)
        };
        let month_total = |month: u32| -> f64 { pivot.keys().map(|c| cell(c.as_str(), month)).sum() };

        let mut transitions = Vec::new();
        let mut cells: BTreeMap<String, Vec<f64>> =
            pivot.keys().map(|c| (c.clone(), Vec::new())).collect();
        let mut alerts = Vec::new();

        for (prev, curr) in months.iter().copied().tuple_windows() {
            let transition = Transition::new(prev, curr);
            let prev_total = month_total(prev);
            let curr_total = month_total(curr);
            let diff_total = curr_total - prev_total;

            debug!(
                transition = %transition,
                prev_total,
                curr_total,
                diff_total,
                "Decomposing transition"
            );

            for (category, row) in cells.iter_mut() {
                let diff_category = cell(category.as_str(), curr) - cell(category.as_str(), prev);
                let contribution = share_of_delta(diff_category, diff_total);
                if contribution.abs() > self.alert_threshold {
                    alerts.push(Alert {
                        category: category.clone(),
                        transition,
                        pct: contribution,
                    });
                }
                row.push(contribution);
            }

            transitions.push(TransitionTotals {
                transition,
                prev_total,
                curr_total,
                diff_total,
            });
        }

        info!(
            categories = cells.len(),
            transitions = transitions.len(),
            alerts = alerts.len(),
            "Variance decomposition complete"
        );

        Decomposition {
            matrix: ContributionMatrix { transitions, cells },
            alerts,
        }
    }
}
