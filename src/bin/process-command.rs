use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::{run, service_fn, tracing, Error, LambdaEvent};

use ec2_control::config::PipelineConfig;
use ec2_control::instance::Ec2InstanceControl;
use ec2_control::notify::SesNotifier;
use ec2_control::pipeline::{CommandPipeline, PipelineResponse};
use ec2_control::store::S3ObjectStore;

async fn handler(
    event: LambdaEvent<S3Event>,
    pipeline: &CommandPipeline,
) -> Result<PipelineResponse, Error> {
    Ok(pipeline.handle(&event.payload).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::subscriber::fmt().json().init();

    let config = PipelineConfig::from_env()?;
    let shared_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let pipeline = CommandPipeline::new(
        Arc::new(S3ObjectStore::new(aws_sdk_s3::Client::new(&shared_config))),
        Arc::new(Ec2InstanceControl::new(aws_sdk_ec2::Client::new(
            &shared_config,
        ))),
        Arc::new(SesNotifier::new(aws_sdk_ses::Client::new(&shared_config))),
        config,
    );

    run(service_fn(|event| handler(event, &pipeline))).await
}
