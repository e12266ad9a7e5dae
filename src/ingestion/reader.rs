//! Ledger Reader
//!
//! Turns a validated polars frame into `RawRecord`s. Numeric columns are cast
//! to `Float64` (unreadable cells become null); dimension columns are cast to
//! text. Nulls are kept as `None` here and zero-filled by the normalizer.

use crate::core::models::{ClusterMeasures, DatasetSchema, RawRecord};
use crate::error::{AnalyticsError, Result};
use crate::ingestion::schema::{CATEGORY_COLUMN, LINE_COLUMN, MONTH_COLUMN, SUPPLIER_COLUMN};
use polars::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// Read a CSV ledger into a frame
///
/// Locating the file is the caller's job; this only parses it.
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AnalyticsError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Ledger file not found: {}", path.display()),
        )));
    }

    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(1000))
        .finish()?
        .collect()?;

    info!(rows = df.height(), columns = df.width(), "Loaded {}", path.display());
    Ok(df)
}

/// Convert every row of `frame` into a `RawRecord`
pub fn read_records(frame: &DataFrame, schema: &DatasetSchema) -> Result<Vec<RawRecord>> {
    let suppliers = text_column(frame, SUPPLIER_COLUMN)?;
    let categories = optional_text_column(frame, CATEGORY_COLUMN, schema.has_category)?;
    let lines = optional_text_column(frame, LINE_COLUMN, schema.has_line)?;
    let months = optional_text_column(frame, MONTH_COLUMN, schema.has_month)?;

    let mut measures = Vec::with_capacity(schema.clusters.len());
    for columns in &schema.clusters {
        let volumes = optional_numeric_column(frame, &columns.cluster.volume_column(), columns.has_volume)?;
        let costs = optional_numeric_column(frame, &columns.cluster.cost_column(), columns.has_cost)?;
        measures.push((columns.cluster.clone(), volumes, costs));
    }

    let mut missing_suppliers = 0usize;
    let records: Vec<RawRecord> = (0..frame.height())
        .map(|idx| {
            let supplier = suppliers[idx].clone().unwrap_or_else(|| {
                missing_suppliers += 1;
                String::new()
            });
            RawRecord {
                supplier,
                category: categories.as_ref().and_then(|c| c[idx].clone()),
                line: lines.as_ref().and_then(|l| l[idx].clone()),
                month: months.as_ref().and_then(|m| m[idx].clone()),
                measures: measures
                    .iter()
                    .map(|(cluster, volumes, costs)| {
                        let volume = volumes.as_ref().and_then(|v| v[idx]);
                        let cost = costs.as_ref().and_then(|c| c[idx]);
                        (cluster.clone(), ClusterMeasures::new(volume, cost))
                    })
                    .collect(),
            }
        })
        .collect();

    if missing_suppliers > 0 {
        warn!("{} rows have no supplier; kept with an empty supplier", missing_suppliers);
    }
    Ok(records)
}

/// Text cells of `name`; blank strings read as null
fn text_column(frame: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = frame.column(name)?.cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .collect();
    Ok(values)
}

fn optional_text_column(frame: &DataFrame, name: &str, present: bool) -> Result<Option<Vec<Option<String>>>> {
    if present {
        text_column(frame, name).map(Some)
    } else {
        Ok(None)
    }
}

fn optional_numeric_column(frame: &DataFrame, name: &str, present: bool) -> Result<Option<Vec<Option<f64>>>> {
    if !present {
        return Ok(None);
    }
    let series = frame.column(name)?.cast(&DataType::Float64)?;
    let values = series.f64()?.into_iter().collect();
    Ok(Some(values))
}
