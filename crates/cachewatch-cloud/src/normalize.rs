use crate::catalog::is_multi_statistic;
use crate::fetcher::RawSample;
use cachewatch_common::types::{MetricCategory, OutputRecord, Statistic};

/// Key of the liveness record appended to every cycle.
pub const PING_KEY: &str = "blackbird.elasticache.ping";

/// Output key for a catalog entry.
///
/// # Examples
///
/// ```
/// use cachewatch_cloud::normalize::metric_key;
/// use cachewatch_common::types::{MetricCategory, Statistic};
///
/// assert_eq!(
///     metric_key(MetricCategory::Host, "CPUUtilization", Statistic::Average),
///     "cloudwatch.elasticache.host.CPUUtilization"
/// );
/// assert_eq!(
///     metric_key(MetricCategory::Redis, "CacheHits", Statistic::Maximum),
///     "cloudwatch.elasticache.redis.CacheHits.Maximum"
/// );
/// ```
pub fn metric_key(category: MetricCategory, metric_name: &str, statistic: Statistic) -> String {
    if is_multi_statistic(category, metric_name) {
        format!("{}.{}.{}", category.key_prefix(), metric_name, statistic)
    } else {
        format!("{}.{}", category.key_prefix(), metric_name)
    }
}

pub fn normalize(sample: &RawSample, category: MetricCategory, host: &str, clock: i64) -> OutputRecord {
    OutputRecord::new(
        metric_key(category, sample.metric_name, sample.statistic),
        sample.value.to_string(),
        host,
        clock,
    )
}

/// Constant record asserting the poller itself ran.
pub fn ping_record(host: &str, clock: i64) -> OutputRecord {
    OutputRecord::new(PING_KEY, "1", host, clock)
}
