//! Core Models Module
//!
//! Ledger records, long-form observations and the dataset capability descriptor.

pub mod observation;
pub mod schema;

pub use observation::{ClusterId, ClusterMeasures, Observation, RawRecord};
pub use schema::{ClusterColumns, DatasetSchema};
