use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::Serialize;
use tracing::info;

use crate::config::StatusConfig;
use crate::instance::{InstanceControl, InstanceDetails};

/// Shown when the instance carries no Name tag.
pub const NAME_NOT_AVAILABLE: &str = "N/A";

/// The status handler's response body.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InstanceDescriptor {
    pub instance_id: String,
    pub name: String,
    pub state: String,
    pub instance_type: String,
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
    pub availability_zone: String,
    pub launch_time: Option<String>,
}

impl InstanceDescriptor {
    fn from_details(details: InstanceDetails) -> Self {
        Self {
            instance_id: details.instance_id,
            name: details
                .tags
                .get("Name")
                .cloned()
                .unwrap_or_else(|| NAME_NOT_AVAILABLE.to_string()),
            state: details.state,
            instance_type: details.instance_type,
            public_ip: details.public_ip,
            private_ip: details.private_ip,
            availability_zone: details.availability_zone,
            launch_time: details.launch_time,
        }
    }
}

/// Describes the designated instance. Runs in non-proxy mode: any
/// failure propagates for the invoking framework to turn into a
/// server error.
pub struct StatusService {
    instances: Arc<dyn InstanceControl>,
    config: StatusConfig,
}

impl StatusService {
    pub fn new(instances: Arc<dyn InstanceControl>, config: StatusConfig) -> Self {
        Self { instances, config }
    }

    pub async fn handle(&self) -> Result<InstanceDescriptor> {
        let id = &self.config.instance_id;
        let details = self
            .instances
            .describe(id)
            .await?
            .ok_or_else(|| anyhow!("Instance not found: {id}"))?;
        info!(instance_id = %id, state = %details.state, "described instance");
        Ok(InstanceDescriptor::from_details(details))
    }
}
