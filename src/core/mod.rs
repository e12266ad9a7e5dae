//! Analytics Transformation Engine
//!
//! The pipeline runs strictly forward:
//! - models: ledger records and long-form observations
//! - engine: normalization, predicates and aggregation
//! - rca: variance decomposition, alerts and narrative
//! - views: dashboard queries composed from the above
//!
//! Every stage is a pure function of an immutable input snapshot.

pub mod engine;
pub mod metrics;
pub mod models;
pub mod rca;
pub mod views;
