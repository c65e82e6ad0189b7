//! Queue polling loop feeding the arrival notification handler

use std::sync::Arc;

use backend::handlers::{
    arrival::{self, ArrivalOutcome, NotificationBatch, QueueRecord},
    ImageService,
};
use backend_storage::queue::{NotificationQueue, QueueMessage};
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const POLL_ERROR_DELAY: Duration = Duration::from_secs(5);

/// Long-polls the arrival queue and records every delivered upload
pub struct ArrivalWorker {
    queue: Arc<dyn NotificationQueue>,
    service: ImageService,
    shutdown_token: CancellationToken,
}

impl ArrivalWorker {
    /// Creates a new worker
    #[must_use]
    pub fn new(queue: Arc<dyn NotificationQueue>, service: ImageService) -> Self {
        Self {
            queue,
            service,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Returns a clone of the shutdown token for external control
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs until the shutdown token is cancelled
    pub async fn start(self) {
        info!("Arrival worker started");

        loop {
            tokio::select! {
                () = self.shutdown_token.cancelled() => {
                    info!("Arrival worker shutting down");
                    break;
                }
                result = self.queue.poll_messages() => {
                    match result {
                        Ok(messages) if messages.is_empty() => {
                            debug!("No arrival notifications received");
                        }
                        Ok(messages) => {
                            self.process_messages(&messages).await;
                        }
                        Err(e) => {
                            if e.is_upstream_error() {
                                warn!("Arrival queue unavailable, backing off: {e}");
                            } else {
                                error!("Failed to poll arrival queue: {e}");
                            }
                            tokio::select! {
                                () = self.shutdown_token.cancelled() => {}
                                () = sleep(POLL_ERROR_DELAY) => {}
                            }
                        }
                    }
                }
            }
        }
    }

    /// Processes one polled batch and acknowledges every message in it
    pub async fn process_messages(&self, messages: &[QueueMessage]) -> Vec<ArrivalOutcome> {
        let batch = batch_from_messages(messages);
        let outcomes = arrival::process_batch(&self.service, &batch).await;

        for outcome in &outcomes {
            match outcome {
                ArrivalOutcome::Processed {
                    s3_key,
                    ddb_updated: true,
                    ..
                } => info!("Recorded arrival of {s3_key}"),
                ArrivalOutcome::Processed { s3_key, .. } => {
                    warn!("Arrival of {s3_key} was not recorded");
                }
                ArrivalOutcome::Skipped { key, .. } => {
                    warn!("Skipped arrival notification for {key:?}");
                }
                ArrivalOutcome::Failed { error } => {
                    warn!("Dropped malformed arrival notification: {error}");
                }
            }
        }

        for message in messages {
            if let Err(e) = self.queue.ack_message(&message.receipt_handle).await {
                error!("Failed to ack message {}: {e}", message.message_id);
            }
        }

        outcomes
    }
}

/// Wraps polled messages in the batch shape the arrival handler consumes
#[must_use]
pub fn batch_from_messages(messages: &[QueueMessage]) -> NotificationBatch {
    NotificationBatch {
        records: messages
            .iter()
            .map(|message| QueueRecord::from_message_body(message.body.clone()).into_value())
            .collect(),
    }
}
