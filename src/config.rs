//! Engine Configuration
//!
//! Everything the engine would otherwise hardcode: cluster ids, the canonical
//! service lines, the alert threshold and an optional default month range.
//! Loaded from a JSON file; missing fields fall back to defaults.

use crate::core::engine::MonthSelection;
use crate::core::models::ClusterId;
use crate::core::rca::DEFAULT_ALERT_THRESHOLD;
use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Environment variable holding the default config path
pub const CONFIG_ENV_VAR: &str = "SPEND_ANALYTICS_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Clusters to expand, in output order
    pub clusters: Vec<ClusterId>,

    /// Preferred service-line values, in display order
    pub canonical_lines: Vec<String>,

    /// `|contribution|` above which an alert is raised
    pub alert_threshold: f64,

    /// Months used when a query does not name its own
    pub months: Option<MonthSelection>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clusters: vec![ClusterId::new("AB"), ClusterId::new("CD"), ClusterId::new("AGF")],
            canonical_lines: vec!["Delivery".to_string(), "Assurance".to_string()],
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            months: None,
        }
    }
}

impl EngineConfig {
    /// Load and validate a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Config from `path`, else from `SPEND_ANALYTICS_CONFIG`, else defaults
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => match std::env::var(CONFIG_ENV_VAR) {
                Ok(p) if !p.trim().is_empty() => Self::from_file(p.trim()),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.clusters.is_empty() {
            return Err(AnalyticsError::Config("At least one cluster id is required".to_string()));
        }

        let mut seen = HashSet::new();
        for cluster in &self.clusters {
            if cluster.as_str().trim().is_empty() {
                return Err(AnalyticsError::Config("Cluster ids cannot be empty".to_string()));
            }
            if !seen.insert(cluster) {
                return Err(AnalyticsError::Config(format!("Duplicate cluster id: {}", cluster)));
            }
        }

        if !self.alert_threshold.is_finite() || self.alert_threshold < 0.0 {
            return Err(AnalyticsError::Config(format!(
                "Alert threshold must be a non-negative number, got {}",
                self.alert_threshold
            )));
        }

        match self.months {
            Some(MonthSelection::Range { start, end }) if start > end || end > 12 => {
                Err(AnalyticsError::Config(format!("Invalid month range {}..={}", start, end)))
            }
            Some(MonthSelection::Set(ref months)) if months.iter().any(|m| *m > 12) => {
                Err(AnalyticsError::Config(format!("Invalid month set {:?}", months)))
            }
            _ => Ok(()),
        }
    }
}
