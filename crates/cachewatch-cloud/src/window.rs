use chrono::{DateTime, Duration, Utc};

/// Finest granularity CloudWatch offers for ElastiCache metrics.
pub const MIN_PERIOD_SECS: u64 = 60;

/// Lookback used at minimum granularity, so a datapoint still being ingested
/// for the current minute does not leave the window empty.
pub const MIN_LOOKBACK_SECS: u64 = 120;

/// Trailing time range a poll cycle queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub period_secs: u64,
}

impl QueryWindow {
    /// Window ending at `end` for a poller running every `interval_secs`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cachewatch_cloud::window::QueryWindow;
    /// use chrono::Utc;
    ///
    /// let window = QueryWindow::trailing(30, Utc::now());
    /// assert_eq!(window.period_secs, 60);
    /// assert_eq!(window.lookback_secs(), 120);
    /// ```
    pub fn trailing(interval_secs: u64, end: DateTime<Utc>) -> Self {
        let (period_secs, lookback_secs) = if interval_secs <= MIN_PERIOD_SECS {
            (MIN_PERIOD_SECS, MIN_LOOKBACK_SECS)
        } else {
            (interval_secs, interval_secs)
        };
        let start = i64::try_from(lookback_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lookback| end.checked_sub_signed(lookback))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        Self {
            start,
            end,
            period_secs,
        }
    }

    pub fn lookback_secs(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}
