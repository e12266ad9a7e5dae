//! Ledger Records and Observations
//!
//! A `RawRecord` is one wide ledger row: shared dimensions plus a volume and a
//! cost per cluster. An `Observation` is the long form, one per record and
//! cluster, with the unit cost already derived.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a billing cluster (e.g. "AB", "CD", "AGF")
///
/// Cluster ids come from configuration, never from column-name patterns.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(String);

impl ClusterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the volume column for this cluster in the wide ledger
    pub fn volume_column(&self) -> String {
        format!("vol_{}", self.0)
    }

    /// Name of the cost column for this cluster in the wide ledger
    pub fn cost_column(&self) -> String {
        format!("cost_{}", self.0)
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClusterId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Volume and cost of one cluster within a record. `None` means the cell was null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterMeasures {
    pub volume: Option<f64>,
    pub cost: Option<f64>,
}

impl ClusterMeasures {
    pub fn new(volume: Option<f64>, cost: Option<f64>) -> Self {
        Self { volume, cost }
    }
}

/// One wide ledger row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Supplier (`fornitore`)
    pub supplier: String,

    /// Cost category (`categoria`)
    pub category: Option<String>,

    /// Service line (`linea`)
    pub line: Option<String>,

    /// Month label (`mese`), e.g. "2024-07"
    pub month: Option<String>,

    /// Per-cluster measures; a cluster absent from the map reads as zero
    pub measures: BTreeMap<ClusterId, ClusterMeasures>,
}

impl RawRecord {
    pub fn new(supplier: impl Into<String>) -> Self {
        Self {
            supplier: supplier.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.line = Some(line.into());
        self
    }

    pub fn with_month(mut self, month: impl Into<String>) -> Self {
        self.month = Some(month.into());
        self
    }

    pub fn with_cluster(mut self, cluster: impl Into<ClusterId>, volume: f64, cost: f64) -> Self {
        self.measures
            .insert(cluster.into(), ClusterMeasures::new(Some(volume), Some(cost)));
        self
    }

    /// Measures for `cluster`, nulls replaced by zero
    pub fn measures_for(&self, cluster: &ClusterId) -> (f64, f64) {
        let m = self.measures.get(cluster).copied().unwrap_or_default();
        (m.volume.unwrap_or(0.0), m.cost.unwrap_or(0.0))
    }

    /// Row volume across the given clusters
    pub fn total_volume(&self, clusters: &[ClusterId]) -> f64 {
        clusters.iter().map(|c| self.measures_for(c).0).sum()
    }

    /// Row cost across the given clusters
    pub fn total_cost(&self, clusters: &[ClusterId]) -> f64 {
        clusters.iter().map(|c| self.measures_for(c).1).sum()
    }
}

/// Long-form observation: one record seen through one cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub supplier: String,
    pub category: Option<String>,
    pub line: Option<String>,
    pub cluster: ClusterId,

    /// 1..=12, or 0 when the month is unknown
    pub month_index: u32,

    pub volume: f64,
    pub cost: f64,

    /// `cost / volume`, missing whenever volume is not positive
    pub unit_cost: Option<f64>,
}
