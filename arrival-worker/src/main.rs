use std::sync::Arc;

use arrival_worker::{health, worker::ArrivalWorker};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_sqs::Client as SqsClient;
use backend::{
    handlers::{ImageService, ServiceSettings},
    types::Environment,
};
use backend_storage::{
    bucket::S3ObjectStore,
    image_record::DynamoImageTable,
    queue::ArrivalQueue,
};
use tracing::{error, info};
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = Environment::from_env();

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(env.tracing_level()).into())
        .from_env_lossy();
    if env.json_logs() {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().with_env_filter(filter).init();
    }

    info!("Starting Arrival Worker in {:?} environment", env);

    let aws_config = env.aws_config().await;
    let dynamodb_client = Arc::new(DynamoDbClient::new(&aws_config));
    let sqs_client = Arc::new(SqsClient::new(&aws_config));
    let s3_client = Arc::new(aws_sdk_s3::Client::from_conf(env.s3_client_config().await));

    let service = ImageService::new(
        Arc::new(DynamoImageTable::new(dynamodb_client, env.images_table_name())),
        Arc::new(S3ObjectStore::new(s3_client, env.s3_bucket())),
        ServiceSettings {
            presign_expiry_secs: env.presigned_url_expiry_secs(),
            page_size: env.page_size(),
        },
    );
    let queue = Arc::new(ArrivalQueue::new(sqs_client, env.arrival_queue_config()));

    let worker = ArrivalWorker::new(queue, service);
    let shutdown_token = worker.shutdown_token();

    // Start health check server
    let health_shutdown = shutdown_token.clone();
    tokio::spawn(async move {
        if let Err(e) = health::start_health_server(health_shutdown).await {
            error!("Health server error: {}", e);
        }
    });

    // Spawn signal handler
    let signal_shutdown = shutdown_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, initiating graceful shutdown...");
                signal_shutdown.cancel();
            }
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
        }
    });

    worker.start().await;

    info!("Arrival Worker stopped");
    Ok(())
}
