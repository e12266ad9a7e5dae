//! Dataset Capability Descriptor
//!
//! Declares, once per dataset, which dimensions and cluster columns exist.
//! Produced by ingestion and consumed by the rest of the pipeline so nothing
//! downstream has to probe for columns again.

use crate::core::models::ClusterId;
use serde::{Deserialize, Serialize};

/// Column presence for one configured cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterColumns {
    pub cluster: ClusterId,
    pub has_volume: bool,
    pub has_cost: bool,
}

/// Which parts of the ledger schema a dataset actually carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSchema {
    /// `categoria` column present
    pub has_category: bool,

    /// `linea` column present
    pub has_line: bool,

    /// `mese` column present; when false every observation gets month 0
    pub has_month: bool,

    /// Configured clusters in configuration order
    pub clusters: Vec<ClusterColumns>,
}

impl DatasetSchema {
    /// Schema with every dimension and every cluster column present
    pub fn complete(clusters: &[ClusterId]) -> Self {
        Self {
            has_category: true,
            has_line: true,
            has_month: true,
            clusters: clusters
                .iter()
                .map(|c| ClusterColumns {
                    cluster: c.clone(),
                    has_volume: true,
                    has_cost: true,
                })
                .collect(),
        }
    }

    pub fn cluster_ids(&self) -> Vec<ClusterId> {
        self.clusters.iter().map(|c| c.cluster.clone()).collect()
    }
}
