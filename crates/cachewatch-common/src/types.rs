use serde::{Deserialize, Serialize};

/// Aggregation applied by the metrics provider over a query window.
///
/// # Examples
///
/// ```
/// use cachewatch_common::types::Statistic;
///
/// let stat: Statistic = "maximum".parse().unwrap();
/// assert_eq!(stat, Statistic::Maximum);
/// assert_eq!(stat.to_string(), "Maximum");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statistic {
    Average,
    Maximum,
}

impl Statistic {
    /// Name used on the wire by the provider and as the key suffix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Average => "Average",
            Statistic::Maximum => "Maximum",
        }
    }
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Statistic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "average" => Ok(Statistic::Average),
            "maximum" => Ok(Statistic::Maximum),
            _ => Err(format!("unknown statistic: {s}")),
        }
    }
}

/// Raised when the configured cache engine is neither Redis nor Memcached.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Supported cache engines are only \"memcached\" and \"redis\", got \"{0}\"")]
pub struct UnsupportedEngine(pub String);

/// Cache technology deployed in the cluster.
///
/// Parsing is case-insensitive and surrounding whitespace is ignored.
///
/// # Examples
///
/// ```
/// use cachewatch_common::types::{CacheEngine, MetricCategory};
///
/// let engine: CacheEngine = "Redis".parse().unwrap();
/// assert_eq!(engine.category(), MetricCategory::Redis);
/// assert!("mysql".parse::<CacheEngine>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheEngine {
    Redis,
    Memcached,
}

impl CacheEngine {
    pub fn category(&self) -> MetricCategory {
        match self {
            CacheEngine::Redis => MetricCategory::Redis,
            CacheEngine::Memcached => MetricCategory::Memcached,
        }
    }
}

impl std::fmt::Display for CacheEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheEngine::Redis => write!(f, "redis"),
            CacheEngine::Memcached => write!(f, "memcached"),
        }
    }
}

impl std::str::FromStr for CacheEngine {
    type Err = UnsupportedEngine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "redis" => Ok(CacheEngine::Redis),
            "memcached" => Ok(CacheEngine::Memcached),
            _ => Err(UnsupportedEngine(s.to_string())),
        }
    }
}

/// Group of metrics that share a catalog and a key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    /// Node-level metrics reported for every engine.
    Host,
    Redis,
    Memcached,
}

impl MetricCategory {
    pub fn key_prefix(&self) -> &'static str {
        match self {
            MetricCategory::Host => "cloudwatch.elasticache.host",
            MetricCategory::Redis => "cloudwatch.elasticache.redis",
            MetricCategory::Memcached => "cloudwatch.elasticache.memcached",
        }
    }
}

impl std::fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricCategory::Host => write!(f, "host"),
            MetricCategory::Redis => write!(f, "redis"),
            MetricCategory::Memcached => write!(f, "memcached"),
        }
    }
}

/// One catalog entry: a provider metric and the statistic to request for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetricSpec {
    pub metric_name: &'static str,
    pub statistic: Statistic,
}

impl MetricSpec {
    pub const fn new(metric_name: &'static str, statistic: Statistic) -> Self {
        Self {
            metric_name,
            statistic,
        }
    }
}

/// A normalized sample ready to hand to a destination.
///
/// Serialized with the field names the monitoring backend expects
/// (`key`, `value`, `host`, `clock`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub key: String,
    pub value: String,
    pub host: String,
    /// Unix timestamp in seconds.
    pub clock: i64,
}

impl OutputRecord {
    pub fn new(key: impl Into<String>, value: impl Into<String>, host: impl Into<String>, clock: i64) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            host: host.into(),
            clock,
        }
    }
}
