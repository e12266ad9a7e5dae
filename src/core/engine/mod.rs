//! Core Engine Module
//!
//! Normalization, selection and aggregation over ledger observations.

pub mod aggregate;
pub mod filter;
pub mod normalize;

pub use aggregate::{AggregateRow, Aggregator, Dimension, KeyValue};
pub use filter::{MonthSelection, Predicate};
pub use normalize::{parse_month_index, Normalizer};
