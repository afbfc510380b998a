//! Run status notification (Telegram bot messages).

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use thiserror::Error;

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("notification endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("notification reply is not readable: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("notification rejected: {0}")]
    Rejected(String),
}

pub trait Notifier {
    fn notify(&self, text: &str) -> Result<(), NotifyError>;
}

pub struct TelegramNotifier {
    client: Client,
    token: String,
    chat_id: i64,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: i64, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            token,
            chat_id,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl Notifier for TelegramNotifier {
    fn notify(&self, text: &str) -> Result<(), NotifyError> {
        let chat_id = self.chat_id.to_string();
        let resp = self
            .client
            .post(format!("{TELEGRAM_API}/bot{}/sendMessage", self.token))
            .form(&[("chat_id", chat_id.as_str()), ("text", text)])
            .send()?;

        let status = resp.status().as_u16();
        let body = resp.text()?;
        check_reply(status, &body)
    }
}

/// Interpret a `sendMessage` reply: HTTP status first, then the `ok` flag.
fn check_reply(status: u16, body: &str) -> Result<(), NotifyError> {
    if !(200..300).contains(&status) {
        return Err(NotifyError::Status {
            status,
            body: body.to_string(),
        });
    }
    let reply: SendMessageResponse = serde_json::from_str(body)?;
    if !reply.ok {
        return Err(NotifyError::Rejected(
            reply.description.unwrap_or_else(|| "no description".to_string()),
        ));
    }
    Ok(())
}
