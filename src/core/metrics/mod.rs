//! Core Metrics Module
//!
//! Ratio helpers shared by every derived metric, and their rendering.

pub mod format;
pub mod ratio;

pub use format::{format_optional, format_pct};
pub use ratio::{percentage_of, safe_ratio, share_of_delta};
