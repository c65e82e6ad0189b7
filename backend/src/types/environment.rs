//! Environment configuration for different deployment stages

use std::env;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};
use backend_storage::queue::QueueConfig;
use tracing::Level;

const DEFAULT_BUCKET_NAME: &str = "image-service-root";
const DEFAULT_TABLE_NAME: &str = "ImagesMetadata";
const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 15 * 60;
const DEFAULT_PAGE_SIZE: i32 = 10;
const LOCALSTACK_ENDPOINT: &str = "http://localhost:4566";

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development,
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => Self::Development,
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Returns the S3 bucket holding image objects
    #[must_use]
    pub fn s3_bucket(&self) -> String {
        env::var("BUCKET_NAME").unwrap_or_else(|_| DEFAULT_BUCKET_NAME.to_string())
    }

    /// Returns the `DynamoDB` table holding image records
    #[must_use]
    pub fn images_table_name(&self) -> String {
        env::var("TABLE_NAME").unwrap_or_else(|_| DEFAULT_TABLE_NAME.to_string())
    }

    /// Presigned URL expiry time in seconds, for both uploads and downloads
    #[must_use]
    pub fn presigned_url_expiry_secs(&self) -> u64 {
        env::var("PRESIGN_EXP")
            .ok()
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_PRESIGN_EXPIRY_SECS)
    }

    /// Maximum number of table rows evaluated per listing page
    #[must_use]
    pub fn page_size(&self) -> i32 {
        env::var("PAGE_SIZE")
            .or_else(|_| env::var("PAGE_LIMIT"))
            .ok()
            .and_then(|val| val.trim().parse::<i32>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub fn override_aws_endpoint_url(&self) -> Option<String> {
        let endpoint = match self {
            // Regular AWS endpoints unless explicitly overridden
            Self::Production | Self::Staging => env::var("LOCALSTACK_ENDPOINT").ok(),
            // LocalStack endpoint for development
            Self::Development => Some(
                env::var("LOCALSTACK_ENDPOINT").unwrap_or_else(|_| LOCALSTACK_ENDPOINT.to_string()),
            ),
        };

        endpoint.filter(|url| !url.is_empty())
    }

    /// URL of the queue receiving S3 arrival notifications
    #[must_use]
    pub fn arrival_queue_url(&self) -> String {
        env::var("ARRIVAL_QUEUE_URL").unwrap_or_else(|_| match self {
            Self::Production | Self::Staging => String::new(),
            Self::Development => {
                format!("{LOCALSTACK_ENDPOINT}/000000000000/image-service-arrivals")
            }
        })
    }

    /// Arrival queue configuration with long polling enabled
    #[must_use]
    pub fn arrival_queue_config(&self) -> QueueConfig {
        QueueConfig {
            queue_url: self.arrival_queue_url(),
            default_max_messages: 10,
            default_visibility_timeout: 30,
            default_wait_time_seconds: 20,
        }
    }

    /// AWS configuration with retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard().with_max_attempts(2);

        let timeout_config = TimeoutConfig::builder()
            .connect_timeout(Duration::from_secs(5))
            .read_timeout(Duration::from_secs(5))
            .build();

        let mut config_builder = aws_config::load_defaults(BehaviorVersion::latest())
            .await
            .to_builder()
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.override_aws_endpoint_url() {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        config_builder.build()
    }

    /// AWS S3 service configuration
    pub async fn s3_client_config(&self) -> aws_sdk_s3::Config {
        let aws_config = self.aws_config().await;
        let s3_config: aws_sdk_s3::Config = (&aws_config).into();
        let mut builder = s3_config.to_builder();

        // Override "force path style" to true for compatibility with LocalStack
        // https://github.com/awslabs/aws-sdk-rust/discussions/874
        if self.override_aws_endpoint_url().is_some() {
            builder.set_force_path_style(Some(true));
        }

        builder.build()
    }

    /// Default tracing level, overridable with `TRACING_LEVEL`
    #[must_use]
    pub fn tracing_level(&self) -> Level {
        env::var("TRACING_LEVEL")
            .ok()
            .and_then(|val| val.parse::<Level>().ok())
            .unwrap_or(match self {
                Self::Production | Self::Staging => Level::INFO,
                Self::Development => Level::DEBUG,
            })
    }

    /// Whether logs are emitted as JSON
    #[must_use]
    pub const fn json_logs(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}
