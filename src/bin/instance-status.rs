use std::sync::Arc;

use aws_config::BehaviorVersion;
use lambda_runtime::{run, service_fn, tracing, Error, LambdaEvent};

use ec2_control::config::StatusConfig;
use ec2_control::instance::Ec2InstanceControl;
use ec2_control::status::{InstanceDescriptor, StatusService};

async fn handler(
    _event: LambdaEvent<serde_json::Value>,
    service: &StatusService,
) -> Result<InstanceDescriptor, Error> {
    service.handle().await.map_err(Into::into)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::subscriber::fmt().json().init();

    let config = StatusConfig::from_env()?;
    let shared_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let service = StatusService::new(
        Arc::new(Ec2InstanceControl::new(aws_sdk_ec2::Client::new(
            &shared_config,
        ))),
        config,
    );

    run(service_fn(|event| handler(event, &service))).await
}
