//! Report Assembly
//!
//! Hands engine results to a presentation layer: polars frames for charts and
//! tables, and a serializable `AnalysisReport` bundling one full analysis run.

use crate::config::EngineConfig;
use crate::core::engine::{AggregateRow, Dimension, Predicate};
use crate::core::rca::{ContributionMatrix, Decomposition, NarrativeGenerator, VarianceDecomposer};
use crate::core::models::Observation;
use crate::core::views::{
    monthly_composition, supplier_comparison, supplier_summary, trend, CompositionRow, FilterOptions,
    SupplierComparison, SupplierSummary,
};
use crate::error::{AnalyticsError, Result};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

pub use crate::core::metrics::{format_optional, format_pct};

/// Aggregate rows as a frame: one column per grouping dimension, then totals
pub fn aggregate_frame(rows: &[AggregateRow], group_by: &[Dimension]) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(group_by.len() + 3);

    for dimension in group_by {
        let series = match dimension {
            Dimension::Month => {
                let values: Vec<Option<u32>> = rows.iter().map(|r| r.month()).collect();
                Series::new(dimension.name(), values)
            }
            _ => {
                let values: Vec<Option<String>> = rows
                    .iter()
                    .map(|r| r.text(*dimension).map(str::to_string))
                    .collect();
                Series::new(dimension.name(), values)
            }
        };
        columns.push(series);
    }

    let costs: Vec<f64> = rows.iter().map(|r| r.total_cost).collect();
    let volumes: Vec<f64> = rows.iter().map(|r| r.total_volume).collect();
    let unit_costs: Vec<Option<f64>> = rows.iter().map(|r| r.weighted_unit_cost).collect();
    columns.push(Series::new("total_cost", costs));
    columns.push(Series::new("total_volume", volumes));
    columns.push(Series::new("weighted_unit_cost", unit_costs));

    Ok(DataFrame::new(columns)?)
}

/// Contribution matrix as a frame: a `category` column then one column per
/// transition, in chronological order
pub fn contribution_frame(matrix: &ContributionMatrix) -> Result<DataFrame> {
    let categories: Vec<String> = matrix.categories().map(str::to_string).collect();

    let mut columns = vec![Series::new("category", categories.clone())];
    for transition in matrix.transitions() {
        let values: Vec<f64> = categories
            .iter()
            .map(|c| matrix.get(c, transition).unwrap_or(0.0))
            .collect();
        columns.push(Series::new(&transition.label(), values));
    }

    Ok(DataFrame::new(columns)?)
}

/// Monthly series split by one dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub series: Dimension,
    pub rows: Vec<AggregateRow>,
}

/// Everything one analysis run produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub predicate: Predicate,
    pub options: FilterOptions,
    pub comparison: SupplierComparison,
    pub supplier: Option<SupplierSummary>,
    pub trends: Vec<Trend>,
    pub composition: Vec<CompositionRow>,
    pub decomposition: Decomposition,
    pub narrative: Vec<String>,
}

impl AnalysisReport {
    /// Run every view, the decomposition and the narrative under `predicate`
    ///
    /// When `predicate` names no months, the configured default months apply.
    /// The supplier comparison and the supplier trend run over every supplier
    /// in the population; a selected supplier only picks the detail sections.
    pub fn build(observations: &[Observation], config: &EngineConfig, predicate: &Predicate) -> Self {
        let mut predicate = predicate.clone();
        if predicate.months.is_none() {
            predicate.months = config.months.clone();
        }
        let population = Predicate {
            supplier: None,
            ..predicate.clone()
        };

        let options = FilterOptions::from_observations(observations, config);
        let comparison = supplier_comparison(observations, &population);
        let supplier = predicate
            .supplier
            .as_deref()
            .map(|s| supplier_summary(observations, &population, s));

        let mut trends = vec![Trend {
            series: Dimension::Supplier,
            rows: trend(observations, &population, Dimension::Supplier),
        }];
        if predicate.supplier.is_some() {
            trends.push(Trend {
                series: Dimension::Category,
                rows: trend(observations, &predicate, Dimension::Category),
            });
        }
        let composition = monthly_composition(observations, &predicate);
        let decomposition = VarianceDecomposer::new(config.alert_threshold).decompose(observations, &predicate);
        let narrative = NarrativeGenerator::explain(&decomposition.matrix);

        Self {
            generated_at: Utc::now(),
            predicate,
            options,
            comparison,
            supplier,
            trends,
            composition,
            decomposition,
            narrative,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain-text rendering for terminals
    pub fn render_text(&self) -> Result<String> {
        let mut out = String::new();
        self.write_text(&mut out)
            .map_err(|e| AnalyticsError::Report(e.to_string()))?;
        Ok(out)
    }

    fn write_text(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "Supplier comparison")?;
        if !self.comparison.comparable {
            writeln!(out, "  At least two suppliers are needed for a comparison.")?;
        }
        for s in &self.comparison.suppliers {
            writeln!(
                out,
                "  {:<24} cost {:>14.0} ({:>7})  volume {:>12.0} ({:>7})",
                s.supplier,
                s.total_cost,
                s.cost_share.map(format_pct).unwrap_or_else(|| "n/a".to_string()),
                s.total_volume,
                s.volume_share.map(format_pct).unwrap_or_else(|| "n/a".to_string()),
            )?;
        }

        if let Some(ref summary) = self.supplier {
            writeln!(out)?;
            writeln!(out, "Supplier {}", summary.supplier)?;
            writeln!(out, "  Total cost:          {:.0}", summary.total_cost)?;
            writeln!(out, "  Total volume:        {:.0}", summary.total_volume)?;
            writeln!(out, "  Weighted unit cost:  {}", format_optional(summary.weighted_unit_cost, 3))?;
            writeln!(out, "  Incidence on total:  {} %", format_optional(summary.incidence, 2))?;
            for c in &summary.categories {
                writeln!(
                    out,
                    "    {:<22} {:>14.0}",
                    c.category.as_deref().unwrap_or("(none)"),
                    c.total_cost
                )?;
            }
        }

        for series in &self.trends {
            writeln!(out)?;
            writeln!(out, "Monthly trend by {}", series.series)?;
            if series.rows.is_empty() {
                writeln!(out, "  No data in the selection.")?;
            }
            for row in &series.rows {
                writeln!(
                    out,
                    "  {:<24} month {:>2}  cost {:>14.0}  unit cost {}",
                    row.get(series.series).map(|k| k.to_string()).unwrap_or_default(),
                    row.month().unwrap_or(0),
                    row.total_cost,
                    format_optional(row.weighted_unit_cost, 3)
                )?;
            }
        }

        let matrix = &self.decomposition.matrix;
        writeln!(out)?;
        writeln!(out, "Contribution to month-over-month change")?;
        if matrix.is_empty() {
            writeln!(out, "  No month-over-month transition in the selection.")?;
        } else {
            write!(out, "  {:<22}", "category")?;
            for t in matrix.transitions() {
                write!(out, " {:>9}", t.label())?;
            }
            writeln!(out)?;
            for category in matrix.categories() {
                write!(out, "  {:<22}", category)?;
                for t in matrix.transitions() {
                    write!(out, " {:>9}", format_pct(matrix.get(category, t).unwrap_or(0.0)))?;
                }
                writeln!(out)?;
            }
        }

        if !self.decomposition.alerts.is_empty() {
            writeln!(out)?;
            writeln!(out, "Alerts")?;
            for alert in &self.decomposition.alerts {
                writeln!(out, "  {}", alert)?;
            }
        }

        if !self.narrative.is_empty() {
            writeln!(out)?;
            writeln!(out, "Explanation")?;
            for line in &self.narrative {
                writeln!(out, "  {}", line)?;
            }
        }
        Ok(())
    }
}
