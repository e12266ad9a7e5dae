//! Ingestion Module
//!
//! The boundary between an already-parsed ledger frame and the engine:
//! - schema: one-time capability check of the frame
//! - reader: frame rows to `RawRecord`s, plus a CSV loader for the binary

pub mod reader;
pub mod schema;

pub use reader::{load_csv, read_records};
pub use schema::{SchemaValidator, CATEGORY_COLUMN, LINE_COLUMN, MONTH_COLUMN, SUPPLIER_COLUMN};

use crate::config::EngineConfig;
use crate::core::engine::Normalizer;
use crate::core::models::{DatasetSchema, Observation};
use crate::error::Result;
use polars::prelude::DataFrame;

/// A normalized ledger and the schema it was read with
#[derive(Debug, Clone)]
pub struct Ledger {
    pub schema: DatasetSchema,
    pub observations: Vec<Observation>,
}

impl Ledger {
    /// Validate, read and normalize `frame` in one pass
    pub fn from_frame(frame: &DataFrame, config: &EngineConfig) -> Result<Self> {
        let schema = SchemaValidator::validate(frame, config)?;
        let records = read_records(frame, &schema)?;
        let observations = Normalizer::normalize(&records, &schema);
        Ok(Self { schema, observations })
    }
}
