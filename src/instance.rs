use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_ec2 as ec2;

/// Flattened view of one EC2 instance as returned by describe.
#[derive(Debug, Clone)]
pub struct InstanceDetails {
    pub instance_id: String,
    pub tags: HashMap<String, String>,
    pub state: String,
    pub instance_type: String,
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
    pub availability_zone: String,
    pub launch_time: Option<String>,
}

/// Start/stop/describe operations on the one designated instance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstanceControl: Send + Sync {
    async fn start(&self, instance_id: &str) -> Result<()>;
    async fn stop(&self, instance_id: &str) -> Result<()>;
    async fn describe(&self, instance_id: &str) -> Result<Option<InstanceDetails>>;
}

pub struct Ec2InstanceControl {
    client: ec2::Client,
}

impl Ec2InstanceControl {
    pub fn new(client: ec2::Client) -> Self {
        Self { client }
    }

    fn tags_to_hashmap(tags: &[ec2::types::Tag]) -> HashMap<String, String> {
        tags.iter()
            .filter_map(|t| {
                let k = t.key()?;
                let v = t.value()?;
                Some((k.to_string(), v.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl InstanceControl for Ec2InstanceControl {
    async fn start(&self, instance_id: &str) -> Result<()> {
        self.client
            .start_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .with_context(|| format!("start instance {instance_id}"))?;
        Ok(())
    }

    async fn stop(&self, instance_id: &str) -> Result<()> {
        self.client
            .stop_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .with_context(|| format!("stop instance {instance_id}"))?;
        Ok(())
    }

    async fn describe(&self, instance_id: &str) -> Result<Option<InstanceDetails>> {
        let resp = self
            .client
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .with_context(|| format!("describe instance {instance_id}"))?;

        let inst = match resp
            .reservations()
            .iter()
            .flat_map(|r| r.instances())
            .next()
        {
            Some(inst) => inst,
            None => return Ok(None),
        };

        let instance_id = match inst.instance_id() {
            Some(id) => id.to_string(),
            None => return Ok(None),
        };

        Ok(Some(InstanceDetails {
            instance_id,
            tags: Self::tags_to_hashmap(inst.tags()),
            state: inst
                .state()
                .and_then(|s| s.name())
                .map(|n| n.as_str().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            instance_type: inst
                .instance_type()
                .map(|t| t.as_str().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            public_ip: inst.public_ip_address().map(|s| s.to_string()),
            private_ip: inst.private_ip_address().map(|s| s.to_string()),
            availability_zone: inst
                .placement()
                .and_then(|p| p.availability_zone())
                .unwrap_or("unknown")
                .to_string(),
            launch_time: inst.launch_time().map(|lt| lt.to_string()),
        }))
    }
}
