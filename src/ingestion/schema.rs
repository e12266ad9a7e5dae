//! Schema Validation
//!
//! Inspects an already-parsed ledger frame once and declares what it carries.
//! Only the supplier column is mandatory; every other absence is recorded in
//! the `DatasetSchema` and handled by the pipeline's fallbacks.

use crate::config::EngineConfig;
use crate::core::models::{ClusterColumns, DatasetSchema};
use crate::error::{AnalyticsError, Result};
use polars::prelude::*;
use tracing::{info, warn};

pub const SUPPLIER_COLUMN: &str = "fornitore";
pub const CATEGORY_COLUMN: &str = "categoria";
pub const LINE_COLUMN: &str = "linea";
pub const MONTH_COLUMN: &str = "mese";

pub struct SchemaValidator;

impl SchemaValidator {
    /// Build the capability descriptor for `frame`
    pub fn validate(frame: &DataFrame, config: &EngineConfig) -> Result<DatasetSchema> {
        let columns: Vec<&str> = frame.get_column_names();
        let has = |name: &str| columns.contains(&name);

        if !has(SUPPLIER_COLUMN) {
            return Err(AnalyticsError::Schema(format!(
                "Required column '{}' not found. Available columns: {:?}",
                SUPPLIER_COLUMN, columns
            )));
        }

        let clusters: Vec<ClusterColumns> = config
            .clusters
            .iter()
            .map(|cluster| {
                let entry = ClusterColumns {
                    cluster: cluster.clone(),
                    has_volume: has(cluster.volume_column().as_str()),
                    has_cost: has(cluster.cost_column().as_str()),
                };
                if !entry.has_volume || !entry.has_cost {
                    warn!(
                        "Cluster {} is missing {}{}; reading it as 0",
                        cluster,
                        if entry.has_volume { "" } else { "volume " },
                        if entry.has_cost { "" } else { "cost" }
                    );
                }
                entry
            })
            .collect();

        let schema = DatasetSchema {
            has_category: has(CATEGORY_COLUMN),
            has_line: has(LINE_COLUMN),
            has_month: has(MONTH_COLUMN),
            clusters,
        };

        info!(
            rows = frame.height(),
            has_category = schema.has_category,
            has_line = schema.has_line,
            has_month = schema.has_month,
            "Validated ledger schema"
        );
        Ok(schema)
    }
}
