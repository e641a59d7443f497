use crate::cloudwatch::CloudWatchClient;
use crate::error::Result;
use crate::fetcher::MetricsFetcher;
use crate::normalize::{normalize, ping_record};
use crate::window::QueryWindow;
use crate::{CloudWatchConfig, Dimensions, MetricsProvider};
use cachewatch_common::types::{CacheEngine, MetricCategory, OutputRecord};
use cachewatch_sink::{Destination, ForwardSummary};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// What to poll and how to label the results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorOptions {
    pub cache_engine: String,
    pub dimensions: Dimensions,
    pub interval_secs: u64,
    pub hostname: String,
    #[serde(default)]
    pub ignore_metrics: Vec<String>,
}

/// Records produced by one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PollReport {
    pub engine: CacheEngine,
    pub host_level: Vec<OutputRecord>,
    pub ping: OutputRecord,
    pub engine_metrics: Vec<OutputRecord>,
}

/// JSON document printed by the standalone CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleDocument {
    pub host_level_metrics: Vec<OutputRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis_metric: Option<Vec<OutputRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memcached_metrics: Option<Vec<OutputRecord>>,
    pub blackbird_ping_item: OutputRecord,
}

impl PollReport {
    /// Host-level records, then the liveness record, then engine records.
    pub fn records(&self) -> impl Iterator<Item = &OutputRecord> {
        self.host_level
            .iter()
            .chain(std::iter::once(&self.ping))
            .chain(self.engine_metrics.iter())
    }

    pub fn record_count(&self) -> usize {
        self.host_level.len() + 1 + self.engine_metrics.len()
    }

    pub fn to_document(&self) -> CycleDocument {
        let (redis_metric, memcached_metrics) = match self.engine {
            CacheEngine::Redis => (Some(self.engine_metrics.clone()), None),
            CacheEngine::Memcached => (None, Some(self.engine_metrics.clone())),
        };
        CycleDocument {
            host_level_metrics: self.host_level.clone(),
            redis_metric,
            memcached_metrics,
            blackbird_ping_item: self.ping.clone(),
        }
    }
}

/// Runs ElastiCache poll cycles. Holds no state between cycles.
pub struct ElastiCacheCollector {
    options: CollectorOptions,
}

impl ElastiCacheCollector {
    pub fn new(options: CollectorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CollectorOptions {
        &self.options
    }

    /// # Errors
    ///
    /// Returns [`crate::error::CloudWatchError::UnsupportedEngine`] unless the
    /// configured engine is `redis` or `memcached`.
    pub fn engine(&self) -> Result<CacheEngine> {
        Ok(self.options.cache_engine.parse::<CacheEngine>()?)
    }

    /// Poll host-level and engine metrics through `provider`.
    ///
    /// The engine is validated before any query is issued.
    pub async fn poll(&self, provider: &dyn MetricsProvider) -> Result<PollReport> {
        let engine = self.engine()?;
        let window = QueryWindow::trailing(self.options.interval_secs, Utc::now());
        let fetcher = MetricsFetcher::new(
            provider,
            &self.options.dimensions,
            window,
            &self.options.ignore_metrics,
        );
        let host = self.options.hostname.as_str();

        let host_level = fetcher.fetch(MetricCategory::Host).await?;
        let clock = Utc::now().timestamp();
        let host_level = host_level
            .iter()
            .map(|s| normalize(s, MetricCategory::Host, host, clock))
            .collect();

        let ping = ping_record(host, Utc::now().timestamp());

        let category = engine.category();
        let engine_samples = fetcher.fetch(category).await?;
        let clock = Utc::now().timestamp();
        let engine_metrics = engine_samples
            .iter()
            .map(|s| normalize(s, category, host, clock))
            .collect();

        Ok(PollReport {
            engine,
            host_level,
            ping,
            engine_metrics,
        })
    }

    /// Open a CloudWatch connection for this cycle only and poll through it.
    pub async fn collect(&self, config: &CloudWatchConfig) -> Result<PollReport> {
        self.engine()?;
        let client = CloudWatchClient::connect(config)?;
        tracing::debug!(
            cluster = %self.options.dimensions.cache_cluster_id,
            node = %self.options.dimensions.cache_node_id,
            "Polling ElastiCache metrics"
        );
        self.poll(&client).await
    }

    /// One full cycle: poll, then forward every record to `destination`.
    ///
    /// Poll failures abort the cycle; forwarding failures are logged and counted.
    pub async fn run_cycle(
        &self,
        provider: &dyn MetricsProvider,
        destination: &dyn Destination,
    ) -> Result<ForwardSummary> {
        let report = self.poll(provider).await?;
        Ok(dispatch(&report, destination).await)
    }
}

/// Forward every record of `report` to `destination`, best-effort.
pub async fn dispatch(report: &PollReport, destination: &dyn Destination) -> ForwardSummary {
    let records: Vec<OutputRecord> = report.records().cloned().collect();
    let summary = destination.forward_all(&records).await;

    if summary.failed > 0 {
        tracing::warn!(
            destination = destination.name(),
            accepted = summary.accepted,
            failed = summary.failed,
            "Some records were not forwarded"
        );
    } else {
        tracing::info!(
            destination = destination.name(),
            accepted = summary.accepted,
            "Forwarded poll cycle"
        );
    }
    summary
}
