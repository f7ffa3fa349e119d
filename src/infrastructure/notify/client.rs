//! Notifier implementations.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use super::config::TelegramConfig;
use crate::domain::event::RunEvent;

/// Telegram caps photo captions at 1024 characters
const MAX_CAPTION_CHARS: usize = 1024;

/// Telegram caps message text at 4096 characters
const MAX_TEXT_CHARS: usize = 4096;

/// Outbound chat notifications. Nothing here can fail the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a photo with caption, or just the caption if the photo is unreadable
    async fn send_photo(&self, photo: &Path, caption: &str);

    /// Send a plain text message
    async fn send_text(&self, text: &str);

    /// Deliver a run event, attaching the screenshot when one was captured
    async fn notify(&self, event: &RunEvent, photo: Option<&Path>) {
        tracing::debug!(
            event = event.event_name(),
            account = ?event.account_index(),
            with_photo = photo.is_some(),
            "Sending notification"
        );
        let message = event.message();
        match photo {
            Some(path) => self.send_photo(path, &message).await,
            None => self.send_text(&message).await,
        }
    }
}

/// Handle to a notifier for cloning and sharing.
pub type NotifierHandle = Arc<dyn Notifier>;

/// Pick the Telegram notifier when credentials are configured, otherwise a no-op
pub fn build_notifier(config: &TelegramConfig) -> NotifierHandle {
    if !config.is_enabled() {
        tracing::info!("Telegram credentials not set, notifications disabled");
        return Arc::new(NoOpNotifier::new());
    }

    match TelegramNotifier::new(config.clone()) {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            tracing::warn!("Failed to create Telegram client: {}, notifications disabled", e);
            Arc::new(NoOpNotifier::new())
        }
    }
}

/// Telegram Bot API notifier
pub struct TelegramNotifier {
    config: TelegramConfig,
    client: Client,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { config, client })
    }

    async fn post_photo(&self, photo: &Path, caption: &str) -> anyhow::Result<()> {
        let bytes = tokio::fs::read(photo).await?;
        let file_name = photo
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("screenshot.png")
            .to_string();

        let form = Form::new()
            .text("chat_id", self.config.chat_id.clone())
            .text("caption", truncate_chars(caption, MAX_CAPTION_CHARS))
            .part("photo", Part::bytes(bytes).file_name(file_name).mime_str("image/png")?);

        let response = self
            .client
            .post(self.config.method_url("sendPhoto"))
            .multipart(form)
            .send()
            .await?;
        check_status(response).await
    }

    async fn post_text(&self, text: &str) -> anyhow::Result<()> {
        let params = [
            ("chat_id", self.config.chat_id.clone()),
            ("text", truncate_chars(text, MAX_TEXT_CHARS)),
        ];

        let response = self
            .client
            .post(self.config.method_url("sendMessage"))
            .form(&params)
            .send()
            .await?;
        check_status(response).await
    }
}

async fn check_status(response: reqwest::Response) -> anyhow::Result<()> {
    if response.status().is_success() {
        return Ok(());
    }
    let status = response.status();
    let body: String = response.text().await.unwrap_or_default();
    anyhow::bail!("Telegram request failed with status {}: {}", status, body)
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_photo(&self, photo: &Path, caption: &str) {
        if !photo.exists() {
            tracing::debug!("Screenshot {:?} missing, sending text only", photo);
            self.send_text(caption).await;
            return;
        }

        if let Err(e) = self.post_photo(photo, caption).await {
            tracing::warn!("[TG] photo push failed (ignored): {}", e);
        }
    }

    async fn send_text(&self, text: &str) {
        if let Err(e) = self.post_text(text).await {
            tracing::warn!("[TG] message push failed (ignored): {}", e);
        }
    }
}

/// No-operation notifier for when notifications are disabled.
pub struct NoOpNotifier;

impl NoOpNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn send_photo(&self, _photo: &Path, _caption: &str) {
        // No-op
    }

    async fn send_text(&self, _text: &str) {
        // No-op
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
