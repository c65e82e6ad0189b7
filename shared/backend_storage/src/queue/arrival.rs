//! Arrival notification queue
//!
//! S3 publishes an `ObjectCreated` event to this queue for every completed upload.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_sqs::{types::Message, Client as SqsClient};

use crate::queue::{
    error::QueueResult,
    types::{QueueConfig, QueueMessage},
};

/// Source of arrival notification messages
#[async_trait]
pub trait NotificationQueue: Send + Sync {
    /// Receives the next batch of messages, possibly empty
    async fn poll_messages(&self) -> QueueResult<Vec<QueueMessage>>;

    /// Removes a processed message from the queue
    async fn ack_message(&self, receipt_handle: &str) -> QueueResult<()>;
}

/// SQS queue delivering storage-arrival notifications
pub struct ArrivalQueue {
    sqs_client: Arc<SqsClient>,
    config: QueueConfig,
}

impl ArrivalQueue {
    /// Creates a new arrival queue
    ///
    /// # Arguments
    ///
    /// * `sqs_client` - Pre-configured SQS client
    /// * `config` - Queue configuration including URL and default parameters
    #[must_use]
    pub const fn new(sqs_client: Arc<SqsClient>, config: QueueConfig) -> Self {
        Self { sqs_client, config }
    }
}

#[async_trait]
impl NotificationQueue for ArrivalQueue {
    /// Long-polls the queue for a batch of messages
    ///
    /// Messages without a receipt handle or message ID cannot be acked and are skipped.
    /// A message without a body is kept with an empty body, so it is acked after
    /// failing to parse.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the poll operation fails
    async fn poll_messages(&self) -> QueueResult<Vec<QueueMessage>> {
        let result = self
            .sqs_client
            .receive_message()
            .queue_url(&self.config.queue_url)
            .max_number_of_messages(self.config.default_max_messages)
            .visibility_timeout(self.config.default_visibility_timeout)
            .wait_time_seconds(self.config.default_wait_time_seconds)
            .send()
            .await?;

        Ok(result.messages().iter().filter_map(queue_message).collect())
    }

    /// Acknowledges receipt of a message by deleting it from the queue
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the acknowledgment fails
    async fn ack_message(&self, receipt_handle: &str) -> QueueResult<()> {
        self.sqs_client
            .delete_message()
            .queue_url(&self.config.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await?;

        Ok(())
    }
}

fn queue_message(msg: &Message) -> Option<QueueMessage> {
    let body = msg.body().unwrap_or_else(|| {
        tracing::warn!("Received arrival message without body: {:?}", msg.message_id());
        ""
    });

    Some(QueueMessage {
        body: body.to_string(),
        receipt_handle: msg.receipt_handle()?.to_string(),
        message_id: msg.message_id()?.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_message_without_body_is_kept_for_acking() {
        let msg = Message::builder()
            .receipt_handle("receipt-1")
            .message_id("1")
            .build();

        let message = queue_message(&msg).unwrap();

        assert_eq!(message.body, "");
        assert_eq!(message.receipt_handle, "receipt-1");
    }

    #[test]
    fn test_message_without_receipt_handle_is_skipped() {
        let msg = Message::builder().message_id("1").body("{}").build();

        assert!(queue_message(&msg).is_none());
    }
}
