//! Error types for image record storage operations

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::{
    delete_item::DeleteItemError, get_item::GetItemError, put_item::PutItemError,
    query::QueryError, update_item::UpdateItemError,
};
use thiserror::Error;

/// Result type alias for image record storage operations
pub type ImageStorageResult<T> = Result<T, ImageStorageError>;

/// Storage error types for image record operations
#[derive(Debug, Error)]
pub enum ImageStorageError {
    /// Failed to insert image record into `DynamoDB`
    #[error("Failed to insert image record into DynamoDB: {0:?}")]
    DynamoDbPutError(#[from] SdkError<PutItemError>),

    /// Failed to get image record from `DynamoDB`
    #[error("Failed to get image record from DynamoDB: {0:?}")]
    DynamoDbGetError(#[from] SdkError<GetItemError>),

    /// Failed to query image records from `DynamoDB`
    #[error("Failed to query image records from DynamoDB: {0:?}")]
    DynamoDbQueryError(#[from] SdkError<QueryError>),

    /// Failed to update image record status in `DynamoDB`
    #[error("Failed to update image record in DynamoDB: {0:?}")]
    DynamoDbUpdateError(#[from] SdkError<UpdateItemError>),

    /// Failed to delete image record from `DynamoDB`
    #[error("Failed to delete image record from DynamoDB: {0:?}")]
    DynamoDbDeleteError(#[from] SdkError<DeleteItemError>),

    /// Failed to convert between a `DynamoDB` item and an image record
    #[error("Failed to parse image record: {0}")]
    SerializationError(String),

    /// The table backend rejected the operation
    #[error("Image table unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_dynamo::Error> for ImageStorageError {
    fn from(err: serde_dynamo::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for ImageStorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
