use crate::error::{Result, SinkError};
use crate::Destination;
use async_trait::async_trait;
use cachewatch_common::types::OutputRecord;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Hands records to a bounded in-process queue polled by the host framework.
///
/// Enqueueing never waits: a full queue fails the record.
///
/// # Examples
///
/// ```
/// use cachewatch_sink::queue::QueueDestination;
///
/// let (destination, mut rx) = QueueDestination::channel(16);
/// drop(destination);
/// assert!(rx.try_recv().is_err());
/// ```
#[derive(Clone)]
pub struct QueueDestination {
    sender: mpsc::Sender<OutputRecord>,
}

impl QueueDestination {
    pub fn new(sender: mpsc::Sender<OutputRecord>) -> Self {
        Self { sender }
    }

    /// Creates a queue with room for `capacity` records and returns its receiving end.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<OutputRecord>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl Destination for QueueDestination {
    fn name(&self) -> &str {
        "queue"
    }

    async fn forward(&self, record: &OutputRecord) -> Result<()> {
        match self.sender.try_send(record.clone()) {
            Ok(()) => {
                tracing::debug!(key = %record.key, value = %record.value, "Enqueued item");
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(SinkError::QueueFull),
            Err(TrySendError::Closed(_)) => Err(SinkError::QueueClosed),
        }
    }
}
