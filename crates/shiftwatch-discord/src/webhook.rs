//! [`DiscordNotifier`]: delivers notifications to a Discord webhook.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use shiftwatch_core::notify::{Notification, Notifier};
use tracing::debug;

use crate::{Error, Result, payload::WebhookMessage};

/// Posts each notification as one embed to a webhook URL.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct DiscordNotifier {
  client:      Client,
  webhook_url: String,
}

impl DiscordNotifier {
  pub fn new(webhook_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
    Ok(Self {
      client,
      webhook_url: webhook_url.into(),
    })
  }

  async fn post(&self, notification: &Notification) -> Result<()> {
    let resp = self
      .client
      .post(&self.webhook_url)
      .json(&WebhookMessage::from(notification))
      .send()
      .await?;

    let status = resp.status();
    if status != StatusCode::OK && status != StatusCode::NO_CONTENT {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Status {
        status: status.as_u16(),
        body,
      });
    }

    debug!(codes = notification.codes.len(), "webhook accepted notification");
    Ok(())
  }
}

impl Notifier for DiscordNotifier {
  async fn send(&self, notification: &Notification) -> shiftwatch_core::Result<()> {
    Ok(self.post(notification).await?)
  }
}
