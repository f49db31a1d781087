use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3 as s3;
use aws_sdk_s3::presigning::PresigningConfig;

/// Object-store operations needed by the handlers: read, archive
/// (copy + delete) and presigned uploads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;
    async fn copy_object(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<()>;
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;
    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String>;
}

pub struct S3ObjectStore {
    client: s3::Client,
}

impl S3ObjectStore {
    pub fn new(client: s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let obj = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("get s3://{bucket}/{key}"))?;
        let body = obj
            .body
            .collect()
            .await
            .with_context(|| format!("read body of s3://{bucket}/{key}"))?;
        Ok(body.into_bytes().to_vec())
    }

    async fn copy_object(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<()> {
        self.client
            .copy_object()
            .copy_source(format!("{bucket}/{src_key}"))
            .bucket(bucket)
            .key(dst_key)
            .send()
            .await
            .with_context(|| format!("copy s3://{bucket}/{src_key} -> {dst_key}"))?;
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("delete s3://{bucket}/{key}"))?;
        Ok(())
    }

    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String> {
        let presigned = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .presigned(PresigningConfig::expires_in(expires_in)?)
            .await
            .with_context(|| format!("presign put for s3://{bucket}/{key}"))?;
        Ok(presigned.uri().to_string())
    }
}
