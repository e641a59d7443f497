//! Destinations for normalized poll-cycle records.
//!
//! A poll cycle hands its records to one [`Destination`]. Built-in adapters
//! are an in-process queue drained by a host framework ([`queue`]) and a
//! Zabbix trapper client ([`zabbix`]).

pub mod error;
pub mod queue;
pub mod zabbix;

use async_trait::async_trait;
use cachewatch_common::types::OutputRecord;

/// Outcome of forwarding a batch of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardSummary {
    pub accepted: usize,
    pub failed: usize,
}

/// Something that accepts [`OutputRecord`]s.
///
/// Forwarding is best-effort: a failure for one record never prevents the
/// remaining records from being attempted.
#[async_trait]
pub trait Destination: Send + Sync {
    /// Returns the destination name (e.g., `"queue"`, `"zabbix"`), used in log lines.
    fn name(&self) -> &str;

    /// Forwards a single record.
    ///
    /// # Errors
    ///
    /// Returns an error if this record could not be handed over.
    async fn forward(&self, record: &OutputRecord) -> error::Result<()>;

    /// Forwards every record, logging and counting failures.
    ///
    /// Adapters that can batch override this.
    async fn forward_all(&self, records: &[OutputRecord]) -> ForwardSummary {
        let mut summary = ForwardSummary::default();
        for record in records {
            match self.forward(record).await {
                Ok(()) => summary.accepted += 1,
                Err(e) => {
                    tracing::warn!(destination = self.name(), key = %record.key, error = %e, "Failed to forward record");
                    summary.failed += 1;
                }
            }
        }
        summary
    }
}
