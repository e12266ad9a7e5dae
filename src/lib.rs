pub mod config;
pub mod core;
pub mod error;
pub mod ingestion;
pub mod report;

pub use config::{EngineConfig, CONFIG_ENV_VAR};
pub use core::engine::{AggregateRow, Aggregator, Dimension, KeyValue, MonthSelection, Normalizer, Predicate};
pub use core::models::{ClusterId, DatasetSchema, Observation, RawRecord};
pub use core::rca::{Alert, ContributionMatrix, Decomposition, NarrativeGenerator, Transition, VarianceDecomposer};
pub use error::{AnalyticsError, Result};
pub use ingestion::{load_csv, Ledger, SchemaValidator};
pub use report::AnalysisReport;
