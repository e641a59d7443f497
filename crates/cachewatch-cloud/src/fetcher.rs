use crate::catalog::catalog;
use crate::error::Result;
use crate::window::QueryWindow;
use crate::{Dimensions, MetricsProvider, StatisticsQuery, ELASTICACHE_NAMESPACE};
use cachewatch_common::types::{MetricCategory, Statistic};

/// A single statistic value read from the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    pub metric_name: &'static str,
    pub statistic: Statistic,
    pub value: f64,
}

/// Issues one statistics query per catalog entry over a shared window.
pub struct MetricsFetcher<'a> {
    provider: &'a dyn MetricsProvider,
    dimensions: &'a Dimensions,
    window: QueryWindow,
    ignore_metrics: &'a [String],
}

impl<'a> MetricsFetcher<'a> {
    pub fn new(
        provider: &'a dyn MetricsProvider,
        dimensions: &'a Dimensions,
        window: QueryWindow,
        ignore_metrics: &'a [String],
    ) -> Self {
        Self {
            provider,
            dimensions,
            window,
            ignore_metrics,
        }
    }

    pub fn window(&self) -> &QueryWindow {
        &self.window
    }

    fn is_ignored(&self, metric_name: &str) -> bool {
        self.ignore_metrics.iter().any(|m| m == metric_name)
    }

    /// Fetch every non-ignored metric of `category`, in catalog order.
    ///
    /// # Errors
    ///
    /// The first failed query aborts the fetch. Metrics without datapoints
    /// are skipped.
    pub async fn fetch(&self, category: MetricCategory) -> Result<Vec<RawSample>> {
        let mut samples = Vec::new();

        for spec in catalog(category) {
            if self.is_ignored(spec.metric_name) {
                continue;
            }

            let query = StatisticsQuery {
                namespace: ELASTICACHE_NAMESPACE,
                metric_name: spec.metric_name,
                statistic: spec.statistic,
                dimensions: self.dimensions,
                window: &self.window,
            };
            let datapoints = self.provider.get_metric_statistics(&query).await?;

            match datapoints.first().and_then(|p| p.value(spec.statistic)) {
                Some(value) => samples.push(RawSample {
                    metric_name: spec.metric_name,
                    statistic: spec.statistic,
                    value,
                }),
                None => tracing::trace!(
                    metric = spec.metric_name,
                    statistic = %spec.statistic,
                    provider = self.provider.name(),
                    "No datapoint in window"
                ),
            }
        }

        tracing::debug!(
            category = %category,
            fetched = samples.len(),
            "Fetched {} metrics",
            category
        );
        Ok(samples)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::CloudWatchError;
    use crate::Datapoint;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Provider serving canned values and recording every query it receives.
    pub(crate) struct MockProvider {
        values: HashMap<(String, Statistic), f64>,
        fail_on: Option<String>,
        pub(crate) queries: Mutex<Vec<(String, Statistic, u64)>>,
    }

    impl MockProvider {
        pub(crate) fn new() -> Self {
            Self {
                values: HashMap::new(),
                fail_on: None,
                queries: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn with_value(mut self, metric: &str, statistic: Statistic, value: f64) -> Self {
            self.values.insert((metric.to_string(), statistic), value);
            self
        }

        pub(crate) fn failing_on(mut self, metric: &str) -> Self {
            self.fail_on = Some(metric.to_string());
            self
        }

        pub(crate) fn query_count(&self) -> usize {
            self.queries.lock().unwrap().len()
        }

        pub(crate) fn queried_metrics(&self) -> Vec<String> {
            self.queries.lock().unwrap().iter().map(|(m, _, _)| m.clone()).collect()
        }
    }

    #[async_trait]
    impl MetricsProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn get_metric_statistics(&self, query: &StatisticsQuery<'_>) -> Result<Vec<Datapoint>> {
            self.queries.lock().unwrap().push((
                query.metric_name.to_string(),
                query.statistic,
                query.window.period_secs,
            ));

            if self.fail_on.as_deref() == Some(query.metric_name) {
                return Err(CloudWatchError::HttpError {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }

            Ok(self
                .values
                .get(&(query.metric_name.to_string(), query.statistic))
                .map(|v| {
                    let mut point = Datapoint::default();
                    match query.statistic {
                        Statistic::Average => point.average = Some(*v),
                        Statistic::Maximum => point.maximum = Some(*v),
                    }
                    vec![point]
                })
                .unwrap_or_default())
        }
    }

    fn window(interval: u64) -> QueryWindow {
        QueryWindow::trailing(interval, DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap())
    }

    #[tokio::test]
    async fn should_query_every_catalog_entry_and_skip_empty_results() {
        let provider = MockProvider::new()
            .with_value("CPUUtilization", Statistic::Average, 12.5)
            .with_value("SwapUsage", Statistic::Average, 0.0);
        let dims = Dimensions::new("c1", "0001");
        let fetcher = MetricsFetcher::new(&provider, &dims, window(60), &[]);

        let samples = fetcher.fetch(MetricCategory::Host).await.unwrap();

        assert_eq!(provider.query_count(), catalog(MetricCategory::Host).len());
        assert_eq!(
            samples,
            vec![
                RawSample {
                    metric_name: "CPUUtilization",
                    statistic: Statistic::Average,
                    value: 12.5
                },
                RawSample {
                    metric_name: "SwapUsage",
                    statistic: Statistic::Average,
                    value: 0.0
                },
            ]
        );
    }

    #[tokio::test]
    async fn should_not_query_ignored_metrics() {
        let provider = MockProvider::new().with_value("CacheHits", Statistic::Average, 1.0);
        let dims = Dimensions::new("c1", "0001");
        let ignore = vec!["CacheHits".to_string(), "CurrItems".to_string()];
        let fetcher = MetricsFetcher::new(&provider, &dims, window(60), &ignore);

        let samples = fetcher.fetch(MetricCategory::Redis).await.unwrap();

        assert!(samples.is_empty());
        let queried = provider.queried_metrics();
        assert!(!queried.iter().any(|m| m == "CacheHits" || m == "CurrItems"));
        assert_eq!(queried.len(), catalog(MetricCategory::Redis).len() - 3);
    }

    #[tokio::test]
    async fn should_pass_effective_period_to_every_query() {
        let provider = MockProvider::new();
        let dims = Dimensions::new("c1", "0001");
        let fetcher = MetricsFetcher::new(&provider, &dims, window(300), &[]);

        fetcher.fetch(MetricCategory::Host).await.unwrap();

        assert!(provider.queries.lock().unwrap().iter().all(|(_, _, period)| *period == 300));
    }

    #[tokio::test]
    async fn should_abort_on_first_failed_query() {
        let provider = MockProvider::new().failing_on("SwapUsage");
        let dims = Dimensions::new("c1", "0001");
        let fetcher = MetricsFetcher::new(&provider, &dims, window(60), &[]);

        let err = fetcher.fetch(MetricCategory::Host).await.unwrap_err();

        assert!(matches!(err, CloudWatchError::HttpError { status: 503, .. }));
        assert_eq!(provider.queried_metrics(), vec!["CPUUtilization", "SwapUsage"]);
    }
}
