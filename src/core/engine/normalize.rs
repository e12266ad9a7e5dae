//! Wide-to-Long Normalization
//!
//! Expands every ledger row into one observation per configured cluster and
//! derives the unit cost. Nulls become zero before any derivation; a
//! non-positive volume always leaves the unit cost missing.

use crate::core::metrics::safe_ratio;
use crate::core::models::{DatasetSchema, Observation, RawRecord};
use tracing::{debug, info, warn};

/// Ledger normalizer
///
/// Stateless: the same records and schema always yield the same observations,
/// in record-major, cluster-minor order.
pub struct Normalizer;

impl Normalizer {
    /// Normalize a ledger into long-form observations
    ///
    /// The month is only read when the schema declares a month column; without
    /// one every observation gets month 0 ("unknown").
    pub fn normalize(records: &[RawRecord], schema: &DatasetSchema) -> Vec<Observation> {
        let clusters = schema.cluster_ids();
        let mut observations = Vec::with_capacity(records.len() * clusters.len());

        for record in records {
            let month_index = if schema.has_month {
                Self::month_index(record.month.as_deref())
            } else {
                0
            };

            for cluster in &clusters {
                let (volume, cost) = record.measures_for(cluster);
                observations.push(Observation {
                    supplier: record.supplier.clone(),
                    category: record.category.clone(),
                    line: record.line.clone(),
                    cluster: cluster.clone(),
                    month_index,
                    volume,
                    cost,
                    unit_cost: safe_ratio(cost, volume),
                });
            }
        }

        info!(
            records = records.len(),
            clusters = clusters.len(),
            observations = observations.len(),
            "Normalized ledger"
        );
        observations
    }

    /// Month index of a label, 0 when absent or unreadable
    fn month_index(label: Option<&str>) -> u32 {
        match label {
            None => 0,
            Some(label) => parse_month_index(label).unwrap_or_else(|| {
                warn!("Unreadable month label {:?}, using month 0", label);
                0
            }),
        }
    }
}

/// Parse the trailing two characters of a month label ("2024-07" -> 7)
pub fn parse_month_index(label: &str) -> Option<u32> {
    let label = label.trim();
    let chars: Vec<char> = label.chars().collect();
    let start = chars.len().saturating_sub(2);
    let tail: String = chars[start..].iter().collect();

    match tail.parse::<u32>() {
        Ok(month) if (1..=12).contains(&month) => Some(month),
        _ => {
            debug!("Month label {:?} has no valid trailing month", label);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ClusterId;

    fn clusters() -> Vec<ClusterId> {
        vec![ClusterId::new("AB"), ClusterId::new("CD")]
    }

    #[test]
    fn test_unit_cost_missing_on_zero_volume() {
        let record = RawRecord::new("Acme")
            .with_category("Lavori")
            .with_month("2024-07")
            .with_cluster("AB", 10.0, 100.0)
            .with_cluster("CD", 0.0, 50.0);
        let schema = DatasetSchema::complete(&clusters());

        let obs = Normalizer::normalize(&[record], &schema);

        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].cluster.as_str(), "AB");
        assert_eq!(obs[0].unit_cost, Some(10.0));
        assert_eq!(obs[1].cluster.as_str(), "CD");
        assert_eq!(obs[1].cost, 50.0);
        assert_eq!(obs[1].unit_cost, None);
        assert!(obs.iter().all(|o| o.month_index == 7));
    }

    #[test]
    fn test_missing_cluster_reads_as_zero() {
        let record = RawRecord::new("Acme").with_cluster("AB", 4.0, 8.0);
        let schema = DatasetSchema::complete(&clusters());

        let obs = Normalizer::normalize(&[record], &schema);

        assert_eq!(obs.len(), 2);
        assert_eq!(obs[1].volume, 0.0);
        assert_eq!(obs[1].cost, 0.0);
        assert_eq!(obs[1].unit_cost, None);
    }

    #[test]
    fn test_no_month_column_means_month_zero() {
        let record = RawRecord::new("Acme")
            .with_month("2024-03")
            .with_cluster("AB", 1.0, 1.0);
        let mut schema = DatasetSchema::complete(&clusters());
        schema.has_month = false;

        let obs = Normalizer::normalize(&[record], &schema);
        assert!(obs.iter().all(|o| o.month_index == 0));
    }

    #[test]
    fn test_unreadable_month_label_keeps_record() {
        let records = vec![
            RawRecord::new("Acme").with_month("2024-xx").with_cluster("AB", 2.0, 6.0),
            RawRecord::new("Acme").with_month("2024-04").with_cluster("AB", 1.0, 1.0),
        ];
        let schema = DatasetSchema::complete(&clusters());

        let obs = Normalizer::normalize(&records, &schema);

        assert_eq!(obs.len(), 4);
        assert_eq!(obs[0].month_index, 0);
        assert_eq!(obs[0].cost, 6.0);
        assert_eq!(obs[0].unit_cost, Some(3.0));
        assert_eq!(obs[2].month_index, 4);
    }

    #[test]
    fn test_empty_ledger() {
        let schema = DatasetSchema::complete(&clusters());
        assert!(Normalizer::normalize(&[], &schema).is_empty());
    }

    #[test]
    fn test_parse_month_index() {
        assert_eq!(parse_month_index("2024-07"), Some(7));
        assert_eq!(parse_month_index("2024-12"), Some(12));
        assert_eq!(parse_month_index("3"), Some(3));
        assert_eq!(parse_month_index("2024-13"), None);
        assert_eq!(parse_month_index("2024-xx"), None);
        assert_eq!(parse_month_index(""), None);
    }
}
