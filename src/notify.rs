use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_ses as ses;
use aws_sdk_ses::types::{Body, Content, Destination, Message};

/// Single-recipient plain-text notification.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, from: &str, to: &str, subject: &str, body: &str) -> Result<()>;
}

pub struct SesNotifier {
    client: ses::Client,
}

impl SesNotifier {
    pub fn new(client: ses::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Notifier for SesNotifier {
    async fn send(&self, from: &str, to: &str, subject: &str, body: &str) -> Result<()> {
        let message = Message::builder()
            .subject(Content::builder().data(subject).build()?)
            .body(
                Body::builder()
                    .text(Content::builder().data(body).build()?)
                    .build(),
            )
            .build();

        self.client
            .send_email()
            .source(from)
            .destination(Destination::builder().to_addresses(to).build())
            .message(message)
            .send()
            .await
            .with_context(|| format!("send email to {to}"))?;
        Ok(())
    }
}
