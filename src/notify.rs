//! Client for the notification service. Delivery is at-most-once: the
//! coordinator logs a failed send and moves on, never retries.
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::json;
use std::fmt;

use crate::model::Notification;

#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Deliver one notification, targeted at `notification.user_id` when
    /// set, broadcast otherwise.
    async fn send(&self, credential: &str, notification: &Notification) -> Result<()>;
}

#[derive(Clone)]
pub struct NotificationClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl fmt::Debug for NotificationClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl NotificationClient {
    pub fn new(base_url: &str, api_key: String) -> Result<Self> {
        let base_url = Url::parse(base_url).context("invalid notification service URL")?;
        Ok(Self::with_base_url(base_url, api_key))
    }

    pub fn with_base_url(mut base_url: Url, api_key: String) -> Self {
        // `Url::join` replaces the last path segment unless the base
        // ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .user_agent("tj-modbot/0.1")
            .no_proxy()
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            api_key,
        }
    }

    pub fn build_body(notification: &Notification) -> serde_json::Value {
        let mut body = json!({
            "title": notification.title,
            "content": notification.content,
            "info": notification.info,
        });
        if let Some(user_id) = notification.user_id {
            body["user_id"] = json!(user_id);
        }
        body
    }

    async fn post(
        &self,
        path: &str,
        credential: &str,
        body: &serde_json::Value,
    ) -> Result<()> {
        let endpoint = self
            .base_url
            .join(path)
            .context("invalid notification base URL")?;
        let res = self
            .http
            .post(endpoint)
            .header("X-Api-Key", &self.api_key)
            .header("Authorization", format!("Bearer {}", credential))
            .json(body)
            .send()
            .await
            .context("failed to reach notification service")?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("notification error {}: {}", status, body));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationService for NotificationClient {
    async fn send(&self, credential: &str, notification: &Notification) -> Result<()> {
        let body = Self::build_body(notification);
        // `/send` targets one recipient, `/create` is untargeted.
        let path = if notification.user_id.is_some() {
            "send"
        } else {
            "create"
        };
        self.post(path, credential, &body).await
    }
}
