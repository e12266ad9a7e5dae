//! Filtered Aggregation
//!
//! Answers "cost and volume for supplier S, cluster C, line L, months M"
//! queries. Rows come out sorted by their grouping key; only key combinations
//! present after filtering appear.

use crate::core::engine::filter::Predicate;
use crate::core::metrics::{percentage_of, safe_ratio};
use crate::core::models::Observation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Grouping dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Supplier,
    Category,
    Cluster,
    Line,
    Month,
}

impl Dimension {
    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Supplier => "supplier",
            Dimension::Category => "category",
            Dimension::Cluster => "cluster",
            Dimension::Line => "line",
            Dimension::Month => "month_index",
        }
    }

    fn value_of(&self, obs: &Observation) -> KeyValue {
        match self {
            Dimension::Supplier => KeyValue::Text(obs.supplier.clone()),
            Dimension::Category => KeyValue::from_optional(obs.category.as_deref()),
            Dimension::Cluster => KeyValue::Text(obs.cluster.as_str().to_string()),
            Dimension::Line => KeyValue::from_optional(obs.line.as_deref()),
            Dimension::Month => KeyValue::Month(obs.month_index),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supplier" | "fornitore" => Ok(Dimension::Supplier),
            "category" | "categoria" => Ok(Dimension::Category),
            "cluster" => Ok(Dimension::Cluster),
            "line" | "linea" => Ok(Dimension::Line),
            "month" | "month_index" | "mese" => Ok(Dimension::Month),
            other => Err(format!("Unknown dimension: {}", other)),
        }
    }
}

/// Value of one grouping dimension
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    /// Dimension absent on the observation (no category, no line)
    Missing,
    Month(u32),
    Text(String),
}

impl KeyValue {
    fn from_optional(value: Option<&str>) -> Self {
        match value {
            Some(v) => KeyValue::Text(v.to_string()),
            None => KeyValue::Missing,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            KeyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_month(&self) -> Option<u32> {
        match self {
            KeyValue::Month(m) => Some(*m),
            _ => None,
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Missing => f.write_str("(none)"),
            KeyValue::Month(m) => write!(f, "{}", m),
            KeyValue::Text(s) => f.write_str(s),
        }
    }
}

/// Grouped totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    /// Grouping key in `group_by` order
    pub key: Vec<(Dimension, KeyValue)>,

    pub total_cost: f64,
    pub total_volume: f64,

    /// `total_cost / total_volume` from the grouped sums, never a mean of
    /// row-level unit costs
    pub weighted_unit_cost: Option<f64>,
}

impl AggregateRow {
    fn from_totals(key: Vec<(Dimension, KeyValue)>, total_cost: f64, total_volume: f64) -> Self {
        Self {
            key,
            total_cost,
            total_volume,
            weighted_unit_cost: safe_ratio(total_cost, total_volume),
        }
    }

    pub fn get(&self, dimension: Dimension) -> Option<&KeyValue> {
        self.key
            .iter()
            .find(|(d, _)| *d == dimension)
            .map(|(_, v)| v)
    }

    pub fn text(&self, dimension: Dimension) -> Option<&str> {
        self.get(dimension).and_then(KeyValue::as_text)
    }

    pub fn month(&self) -> Option<u32> {
        self.get(Dimension::Month).and_then(KeyValue::as_month)
    }
}

/// Aggregation engine
pub struct Aggregator;

impl Aggregator {
    /// Filter with `predicate`, group by `group_by`, sum cost and volume
    ///
    /// With an empty `group_by` the result is a single population row, or no
    /// row at all when nothing matched.
    pub fn aggregate(
        observations: &[Observation],
        predicate: &Predicate,
        group_by: &[Dimension],
    ) -> Vec<AggregateRow> {
        let mut groups: BTreeMap<Vec<KeyValue>, (f64, f64)> = BTreeMap::new();

        for obs in observations.iter().filter(|o| predicate.matches(o)) {
            let key: Vec<KeyValue> = group_by.iter().map(|d| d.value_of(obs)).collect();
            let totals = groups.entry(key).or_insert((0.0, 0.0));
            totals.0 += obs.cost;
            totals.1 += obs.volume;
        }

        debug!(
            groups = groups.len(),
            group_by = ?group_by,
            "Aggregated observations"
        );

        groups
            .into_iter()
            .map(|(values, (cost, volume))| {
                let key = group_by.iter().copied().zip(values).collect();
                AggregateRow::from_totals(key, cost, volume)
            })
            .collect()
    }

    /// Population totals under `predicate`; zero totals when nothing matched
    pub fn totals(observations: &[Observation], predicate: &Predicate) -> AggregateRow {
        Self::aggregate(observations, predicate, &[])
            .into_iter()
            .next()
            .unwrap_or_else(|| AggregateRow::from_totals(Vec::new(), 0.0, 0.0))
    }

    /// Incidence of a subgroup on its population, in percent
    ///
    /// `100 * cost(population AND subgroup) / cost(population)`; missing when
    /// the population cost is not positive.
    pub fn incidence(
        observations: &[Observation],
        population: &Predicate,
        subgroup: &Predicate,
    ) -> Option<f64> {
        let (part, whole) = observations
            .iter()
            .filter(|o| population.matches(o))
            .fold((0.0, 0.0), |(part, whole), o| {
                let part = if subgroup.matches(o) { part + o.cost } else { part };
                (part, whole + o.cost)
            });
        percentage_of(part, whole)
    }
}
