use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use lambda_runtime::{run, service_fn, tracing, Error, LambdaEvent};

use ec2_control::config::UploadConfig;
use ec2_control::store::S3ObjectStore;
use ec2_control::upload::UploadService;

async fn handler(
    event: LambdaEvent<ApiGatewayProxyRequest>,
    service: &UploadService,
) -> Result<ApiGatewayProxyResponse, Error> {
    Ok(service.handle(&event.payload).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::subscriber::fmt().json().init();

    let config = UploadConfig::from_env()?;
    let shared_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let service = UploadService::new(
        Arc::new(S3ObjectStore::new(aws_sdk_s3::Client::new(&shared_config))),
        config,
    );

    run(service_fn(|event| handler(event, &service))).await
}
