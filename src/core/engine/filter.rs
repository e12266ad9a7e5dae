//! Selection Predicates
//!
//! A single explicit filter value shared by every query. Each field is an
//! optional conjunct; an empty predicate selects everything.

use crate::core::models::{ClusterId, Observation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Month selection, inclusive range or explicit set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthSelection {
    Range { start: u32, end: u32 },
    Set(BTreeSet<u32>),
}

impl MonthSelection {
    pub fn range(start: u32, end: u32) -> Self {
        MonthSelection::Range { start, end }
    }

    pub fn set(months: impl IntoIterator<Item = u32>) -> Self {
        MonthSelection::Set(months.into_iter().collect())
    }

    pub fn contains(&self, month: u32) -> bool {
        match self {
            MonthSelection::Range { start, end } => (*start..=*end).contains(&month),
            MonthSelection::Set(months) => months.contains(&month),
        }
    }
}

/// Conjunction of optional equality and month filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub supplier: Option<String>,
    pub category: Option<String>,
    pub cluster: Option<ClusterId>,
    pub line: Option<String>,
    pub months: Option<MonthSelection>,
}

impl Predicate {
    /// Predicate that selects every observation
    pub fn all() -> Self {
        Self::default()
    }

    pub fn supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn cluster(mut self, cluster: impl Into<ClusterId>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.line = Some(line.into());
        self
    }

    pub fn months(mut self, months: MonthSelection) -> Self {
        self.months = Some(months);
        self
    }

    pub fn month_range(self, start: u32, end: u32) -> Self {
        self.months(MonthSelection::range(start, end))
    }

    /// Whether `obs` satisfies every set conjunct
    ///
    /// An observation with no category or line never matches a filter on that
    /// dimension.
    pub fn matches(&self, obs: &Observation) -> bool {
        if let Some(ref supplier) = self.supplier {
            if &obs.supplier != supplier {
                return false;
            }
        }
        if let Some(ref category) = self.category {
            if obs.category.as_ref() != Some(category) {
                return false;
            }
        }
        if let Some(ref cluster) = self.cluster {
            if &obs.cluster != cluster {
                return false;
            }
        }
        if let Some(ref line) = self.line {
            if obs.line.as_ref() != Some(line) {
                return false;
            }
        }
        if let Some(ref months) = self.months {
            if !months.contains(obs.month_index) {
                return false;
            }
        }
        true
    }

    /// Observations selected by this predicate, in input order
    pub fn select<'a>(&self, observations: &'a [Observation]) -> Vec<&'a Observation> {
        observations.iter().filter(|o| self.matches(o)).collect()
    }
}
