//! Dashboard Views
//!
//! Higher-level queries built on the aggregator: supplier comparison, the
//! per-supplier summary, monthly trends, monthly category composition and the
//! option lists a filter UI needs. All are pure functions of the observations
//! and an explicit predicate.

use crate::config::EngineConfig;
use crate::core::engine::{AggregateRow, Aggregator, Dimension, Predicate};
use crate::core::metrics::safe_ratio;
use crate::core::models::{ClusterId, Observation};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// One supplier's weight in the filtered population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierShare {
    pub supplier: String,
    pub total_cost: f64,
    pub total_volume: f64,
    pub cost_share: Option<f64>,
    pub volume_share: Option<f64>,
}

/// Side-by-side supplier weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierComparison {
    pub suppliers: Vec<SupplierShare>,

    /// A comparison needs at least two suppliers
    pub comparable: bool,
}

/// Cost of one category within a supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCost {
    pub category: Option<String>,
    pub total_cost: f64,
}

/// Headline figures for one supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierSummary {
    pub supplier: String,
    pub total_cost: f64,
    pub total_volume: f64,
    pub weighted_unit_cost: Option<f64>,

    /// Percent of the filtered population's cost
    pub incidence: Option<f64>,

    /// Highest cost first
    pub categories: Vec<CategoryCost>,
}

/// A category's slice of one month's cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionRow {
    pub month_index: u32,
    pub category: Option<String>,
    pub total_cost: f64,

    /// Fraction of the month's total; missing when that total is not positive
    pub share: Option<f64>,
}

pub fn supplier_comparison(observations: &[Observation], predicate: &Predicate) -> SupplierComparison {
    let rows = Aggregator::aggregate(observations, predicate, &[Dimension::Supplier]);
    let cost: f64 = rows.iter().map(|r| r.total_cost).sum();
    let volume: f64 = rows.iter().map(|r| r.total_volume).sum();

    let suppliers: Vec<SupplierShare> = rows
        .into_iter()
        .map(|r| SupplierShare {
            supplier: r.text(Dimension::Supplier).unwrap_or_default().to_string(),
            total_cost: r.total_cost,
            total_volume: r.total_volume,
            cost_share: safe_ratio(r.total_cost, cost),
            volume_share: safe_ratio(r.total_volume, volume),
        })
        .collect();

    let comparable = suppliers.len() >= 2;
    SupplierComparison { suppliers, comparable }
}

/// Totals, weighted unit cost, incidence and category breakdown for `supplier`
/// within the population selected by `predicate`
pub fn supplier_summary(
    observations: &[Observation],
    predicate: &Predicate,
    supplier: &str,
) -> SupplierSummary {
    let scoped = predicate.clone().supplier(supplier);
    let totals = Aggregator::totals(observations, &scoped);
    let incidence = Aggregator::incidence(observations, predicate, &Predicate::all().supplier(supplier));

    let mut categories: Vec<CategoryCost> = Aggregator::aggregate(observations, &scoped, &[Dimension::Category])
        .into_iter()
        .map(|r| CategoryCost {
            category: r.text(Dimension::Category).map(str::to_string),
            total_cost: r.total_cost,
        })
        .collect();
    // Stable sort keeps category order among equal costs
    categories.sort_by(|a, b| b.total_cost.total_cmp(&a.total_cost));

    SupplierSummary {
        supplier: supplier.to_string(),
        total_cost: totals.total_cost,
        total_volume: totals.total_volume,
        weighted_unit_cost: totals.weighted_unit_cost,
        incidence,
        categories,
    }
}

/// Monthly series split by `series` (supplier, category, ...)
pub fn trend(observations: &[Observation], predicate: &Predicate, series: Dimension) -> Vec<AggregateRow> {
    Aggregator::aggregate(observations, predicate, &[series, Dimension::Month])
}

pub fn monthly_composition(observations: &[Observation], predicate: &Predicate) -> Vec<CompositionRow> {
    let rows = Aggregator::aggregate(observations, predicate, &[Dimension::Month, Dimension::Category]);

    let mut month_totals: BTreeMap<u32, f64> = BTreeMap::new();
    for row in &rows {
        if let Some(month) = row.month() {
            *month_totals.entry(month).or_insert(0.0) += row.total_cost;
        }
    }

    rows.into_iter()
        .filter_map(|row| {
            let month_index = row.month()?;
            let total = month_totals.get(&month_index).copied().unwrap_or(0.0);
            Some(CompositionRow {
                month_index,
                category: row.text(Dimension::Category).map(str::to_string),
                total_cost: row.total_cost,
                share: safe_ratio(row.total_cost, total),
            })
        })
        .collect()
}

/// Values a filter UI can offer, all sorted and distinct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub suppliers: Vec<String>,
    pub categories: Vec<String>,
    pub clusters: Vec<ClusterId>,
    pub lines: Vec<String>,
    pub months: Vec<u32>,
}

impl FilterOptions {
    pub fn from_observations(observations: &[Observation], config: &EngineConfig) -> Self {
        let mut suppliers = BTreeSet::new();
        let mut categories = BTreeSet::new();
        let mut clusters = BTreeSet::new();
        let mut lines = BTreeSet::new();
        let mut months = BTreeSet::new();

        for obs in observations {
            suppliers.insert(obs.supplier.clone());
            if let Some(ref c) = obs.category {
                categories.insert(c.clone());
            }
            clusters.insert(obs.cluster.clone());
            if let Some(ref l) = obs.line {
                lines.insert(l.clone());
            }
            months.insert(obs.month_index);
        }

        let lines = resolve_lines(&lines, &config.canonical_lines);
        debug!(lines = ?lines, "Resolved service lines");

        Self {
            suppliers: suppliers.into_iter().collect(),
            categories: categories.into_iter().collect(),
            clusters: clusters.into_iter().collect(),
            lines,
            months: months.into_iter().collect(),
        }
    }
}

/// Canonical lines that occur, in canonical order; otherwise every line present
pub fn resolve_lines(present: &BTreeSet<String>, canonical: &[String]) -> Vec<String> {
    let known: Vec<String> = canonical
        .iter()
        .filter(|l| present.contains(*l))
        .cloned()
        .collect();
    if known.is_empty() {
        present.iter().cloned().collect()
    } else {
        known
    }
}
