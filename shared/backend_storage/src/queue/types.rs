/// Raw queue message with metadata
///
/// The body is kept as delivered; decoding it is the consumer's concern so that a
/// malformed body can be reported instead of silently dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// The message body
    pub body: String,
    /// Receipt handle for acknowledging the message
    pub receipt_handle: String,
    /// Message ID
    pub message_id: String,
}

/// Configuration for queue operations
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Queue URL
    pub queue_url: String,
    /// Default maximum number of messages to retrieve
    pub default_max_messages: i32,
    /// Default visibility timeout for messages (in seconds)
    pub default_visibility_timeout: i32,
    /// Default wait time for long polling
    pub default_wait_time_seconds: i32,
}
