use std::sync::Arc;

use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_s3::Client as S3Client;
use backend::{
    handlers::{ImageService, ServiceSettings},
    server,
    types::Environment,
};
use backend_storage::{bucket::S3ObjectStore, image_record::DynamoImageTable};
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(environment.tracing_level()).into())
        .from_env_lossy();

    // JSON logs for staging/production, human-readable for development
    if environment.json_logs() {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().with_env_filter(filter).init();
    }

    let aws_config = environment.aws_config().await;
    let dynamodb_client = Arc::new(DynamoDbClient::new(&aws_config));
    let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));

    let service = ImageService::new(
        Arc::new(DynamoImageTable::new(
            dynamodb_client,
            environment.images_table_name(),
        )),
        Arc::new(S3ObjectStore::new(s3_client, environment.s3_bucket())),
        ServiceSettings {
            presign_expiry_secs: environment.presigned_url_expiry_secs(),
            page_size: environment.page_size(),
        },
    );

    server::start(service).await
}
