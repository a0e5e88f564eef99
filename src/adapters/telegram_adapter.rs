//! Notification adapters: Telegram bot and a log-only fallback.

use crate::domain::error::TrailguardError;
use crate::ports::config_port::ConfigPort;
use crate::ports::notify_port::NotifyPort;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

pub const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

pub struct TelegramNotifier {
    client: reqwest::blocking::Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: &str, chat_id: &str, timeout: Duration) -> Result<Self, TrailguardError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrailguardError::ConfigInvalid {
                section: "telegram".into(),
                key: "bot_token".into(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{TELEGRAM_API}/bot{bot_token}/sendMessage"),
            chat_id: chat_id.to_string(),
        })
    }

    /// `None` when `[telegram]` has no bot token or chat id.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Option<Self>, TrailguardError> {
        let token = config
            .get_string("telegram", "bot_token")
            .filter(|s| !s.trim().is_empty());
        let chat_id = config
            .get_string("telegram", "chat_id")
            .filter(|s| !s.trim().is_empty());

        match (token, chat_id) {
            (Some(token), Some(chat_id)) => {
                let timeout = config.get_int("market", "timeout_seconds", 10).max(1) as u64;
                Self::new(&token, &chat_id, Duration::from_secs(timeout)).map(Some)
            }
            (Some(_), None) => Err(TrailguardError::ConfigMissing {
                section: "telegram".into(),
                key: "chat_id".into(),
            }),
            _ => Ok(None),
        }
    }
}

impl NotifyPort for TelegramNotifier {
    fn notify(&self, message: &str) -> Result<(), TrailguardError> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text: message,
            parse_mode: "Markdown",
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .map_err(|e| TrailguardError::Notify {
                reason: e.without_url().to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrailguardError::Notify {
                reason: format!("telegram returned HTTP {status}"),
            });
        }
        Ok(())
    }
}

/// Writes notifications to the log instead of a chat.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl NotifyPort for LogNotifier {
    fn notify(&self, message: &str) -> Result<(), TrailguardError> {
        info!(target: "trailguard::notify", "{message}");
        Ok(())
    }
}
