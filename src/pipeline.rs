use std::sync::Arc;

use aws_lambda_events::event::s3::S3Event;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::event::ObjectRef;
use crate::instance::InstanceControl;
use crate::notify::Notifier;
use crate::store::ObjectStore;

pub const COMMAND_ON: &str = "ec2->on";
pub const COMMAND_OFF: &str = "ec2->off";

const EMAIL_SUBJECT: &str = "EC2 Controller Status Update";

/// What the handler reports back to the triggering system. The body is
/// the outcome message, except on the envelope-parse path where no
/// message exists yet.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PipelineResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

/// Drives one uploaded command file through fetch, dispatch, archival
/// and notification. Each side effect is isolated: a failing step is
/// logged or folded into the outcome message, never allowed to stop
/// the steps after it. The one fatal case is a malformed event
/// envelope, where there is no object key to act on.
pub struct CommandPipeline {
    store: Arc<dyn ObjectStore>,
    instances: Arc<dyn InstanceControl>,
    notifier: Arc<dyn Notifier>,
    config: PipelineConfig,
}

impl CommandPipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        instances: Arc<dyn InstanceControl>,
        notifier: Arc<dyn Notifier>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            instances,
            notifier,
            config,
        }
    }

    pub async fn handle(&self, event: &S3Event) -> PipelineResponse {
        let obj = match ObjectRef::from_event(event) {
            Ok(obj) => obj,
            Err(e) => {
                error!(error = %e, "could not parse S3 event");
                return PipelineResponse {
                    status_code: 400,
                    body: "Error parsing event".to_string(),
                };
            }
        };
        info!(bucket = %obj.bucket, key = %obj.key, "new file detected");

        let message = self.process(&obj).await;

        if let Err(e) = self
            .notifier
            .send(
                &self.config.from_email,
                &self.config.to_email,
                EMAIL_SUBJECT,
                &message,
            )
            .await
        {
            error!(error = %e, "could not send notification email");
        }

        PipelineResponse {
            status_code: 200,
            body: message,
        }
    }

    /// Runs fetch, dispatch and archival, and always comes back with
    /// the outcome message.
    async fn process(&self, obj: &ObjectRef) -> String {
        let bytes = match self.store.get_object(&obj.bucket, &obj.key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                // Covers re-delivery for an already-archived key: the
                // original is gone, so degrade to a message and move on.
                warn!(key = %obj.key, error = %e, "could not fetch command file");
                self.delete_original(obj).await;
                return format!("Error processing file '{}': {e}", obj.key);
            }
        };

        let data: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(e) => {
                warn!(key = %obj.key, error = %e, "command file is not valid JSON");
                self.delete_original(obj).await;
                return format!("File '{}' was not valid JSON. No action taken.", obj.key);
            }
        };

        let command = data.get("command").and_then(|v| v.as_str());
        let message = match command {
            Some(COMMAND_ON) => self.start_instance().await,
            Some(COMMAND_OFF) => self.stop_instance().await,
            other => {
                self.delete_original(obj).await;
                return format!(
                    "Invalid command '{}' received. No action taken. File deleted.",
                    other.unwrap_or("<missing>")
                );
            }
        };

        self.archive(obj).await;
        message
    }

    async fn start_instance(&self) -> String {
        let id = &self.config.instance_id;
        info!(instance_id = %id, "received ON command");
        match self.instances.start(id).await {
            Ok(()) => format!("Command '{COMMAND_ON}' received. Starting instance: {id}"),
            Err(e) => {
                error!(instance_id = %id, error = %e, "could not start instance");
                format!("Error starting instance {id}: {e}")
            }
        }
    }

    async fn stop_instance(&self) -> String {
        let id = &self.config.instance_id;
        info!(instance_id = %id, "received OFF command");
        match self.instances.stop(id).await {
            Ok(()) => format!("Command '{COMMAND_OFF}' received. Stopping instance: {id}"),
            Err(e) => {
                error!(instance_id = %id, error = %e, "could not stop instance");
                format!("Error stopping instance {id}: {e}")
            }
        }
    }

    /// Copy + delete to the timestamp-prefixed key. Best effort: the
    /// command already ran, so a failure here is logged and nothing
    /// else. The copy lands before the original is removed.
    async fn archive(&self, obj: &ObjectRef) {
        let dst = archive_key(chrono::Utc::now().naive_utc(), &obj.key);
        info!(key = %obj.key, archived_key = %dst, "archiving processed file");
        if let Err(e) = self
            .store
            .copy_object(&obj.bucket, &obj.key, &dst)
            .await
        {
            warn!(key = %obj.key, error = %e, "could not copy processed file");
            return;
        }
        if let Err(e) = self.store.delete_object(&obj.bucket, &obj.key).await {
            warn!(key = %obj.key, error = %e, "could not delete original after copy");
        }
    }

    async fn delete_original(&self, obj: &ObjectRef) {
        if let Err(e) = self.store.delete_object(&obj.bucket, &obj.key).await {
            warn!(key = %obj.key, error = %e, "could not delete command file");
        }
    }
}

/// Archive key for a processed object: processing time as a fixed
/// 14-digit stamp prefixed to the original key, extension preserved.
/// `cmd.json` handled at 2024-01-01 12:00:00 becomes
/// `20240101120000cmd.json`.
pub fn archive_key(now: NaiveDateTime, key: &str) -> String {
    let stamp = now.format("%Y%m%d%H%M%S");
    match key.rsplit_once('.') {
        Some((base, ext)) => format!("{stamp}{base}.{ext}"),
        None => format!("{stamp}{key}"),
    }
}
