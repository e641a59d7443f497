pub mod catalog;
pub mod cloudwatch;
pub mod collector;
pub mod error;
pub mod fetcher;
pub mod normalize;
pub mod window;

use cachewatch_common::types::Statistic;
use serde::{Deserialize, Serialize};
use window::QueryWindow;

/// Namespace under which ElastiCache publishes its metrics.
pub const ELASTICACHE_NAMESPACE: &str = "AWS/ElastiCache";

/// Connection settings for the CloudWatch API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudWatchConfig {
    #[serde(default = "default_region")]
    pub region_name: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    /// Base URL override, e.g. for a VPC endpoint. Defaults to the public regional endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Provider-side identifiers scoping a query to one cache node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub cache_cluster_id: String,
    #[serde(default = "default_node_id")]
    pub cache_node_id: String,
}

pub fn default_node_id() -> String {
    "0001".to_string()
}

impl Dimensions {
    pub fn new(cache_cluster_id: impl Into<String>, cache_node_id: impl Into<String>) -> Self {
        Self {
            cache_cluster_id: cache_cluster_id.into(),
            cache_node_id: cache_node_id.into(),
        }
    }
}

/// Parameters of one `GetMetricStatistics` call.
#[derive(Debug, Clone)]
pub struct StatisticsQuery<'a> {
    pub namespace: &'a str,
    pub metric_name: &'a str,
    pub statistic: Statistic,
    pub dimensions: &'a Dimensions,
    pub window: &'a QueryWindow,
}

/// One aggregated datapoint as returned by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Datapoint {
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub average: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl Datapoint {
    pub fn value(&self, statistic: Statistic) -> Option<f64> {
        match statistic {
            Statistic::Average => self.average,
            Statistic::Maximum => self.maximum,
        }
    }
}

/// Read-only access to a metrics provider.
///
/// Implementations issue exactly one request per call and never retry.
#[async_trait::async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Provider name used in log lines (e.g., `"cloudwatch:ap-northeast-1"`).
    fn name(&self) -> &str;

    /// Fetch aggregated datapoints for one metric over the query window.
    async fn get_metric_statistics(&self, query: &StatisticsQuery<'_>) -> error::Result<Vec<Datapoint>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_apply_connection_defaults() {
        let cfg: CloudWatchConfig = serde_json::from_value(serde_json::json!({
            "aws_access_key_id": "AKID",
            "aws_secret_access_key": "secret",
        }))
        .expect("config should parse");

        assert_eq!(cfg.region_name, "us-east-1");
        assert_eq!(cfg.request_timeout_secs, 30);
        assert!(cfg.endpoint.is_none());
    }

    #[test]
    fn should_default_node_id_when_absent() {
        let dims: Dimensions = serde_json::from_value(serde_json::json!({
            "cache_cluster_id": "c1",
        }))
        .expect("dimensions should parse");

        assert_eq!(dims, Dimensions::new("c1", "0001"));
    }

    #[test]
    fn should_read_requested_statistic_from_datapoint() {
        let point: Datapoint = serde_json::from_value(serde_json::json!({
            "Timestamp": 1_700_000_000.0,
            "Average": 12.5,
            "Unit": "Percent",
        }))
        .unwrap();

        assert_eq!(point.value(Statistic::Average), Some(12.5));
        assert_eq!(point.value(Statistic::Maximum), None);
    }
}
