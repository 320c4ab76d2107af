//! LINE channel: webhook payload types, signature verification, and replies
//! via the Messaging API.

use crate::channels::registry::ChannelHandle;
use async_trait::async_trait;
use base64::Engine as _;
use hmac::Mac as _;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};

const LINE_API_BASE: &str = "https://api.line.me";

/// Webhook POST body: a batch of events.
#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

/// One webhook event. Only "message" events with text content are relayed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub message: Option<MessageContent>,
}

/// Message content of a "message" event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContent {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Verify the X-Line-Signature header: base64(HMAC-SHA256(channel secret, raw body)).
/// Constant-time comparison; any decode error fails closed.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(sig) = base64::engine::general_purpose::STANDARD.decode(signature) else {
        return false;
    };
    let Ok(mut mac) = hmac::Hmac::<sha2::Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&sig).is_ok()
}

/// LINE channel connector: delivers replies via the Messaging API reply endpoint.
pub struct LineChannel {
    id: String,
    base_url: String,
    access_token: Option<String>,
    running: AtomicBool,
    client: reqwest::Client,
}

impl LineChannel {
    pub fn new(access_token: Option<String>) -> Self {
        Self {
            id: "line".to_string(),
            base_url: line_api_base(),
            access_token,
            running: AtomicBool::new(true),
            client: reqwest::Client::new(),
        }
    }

    /// Send a text reply for a webhook event via POST /v2/bot/message/reply.
    /// Reply tokens are single-use and expire; failures are reported, not retried.
    pub async fn reply(&self, reply_token: &str, text: &str) -> Result<(), String> {
        let token = self
            .access_token
            .as_ref()
            .ok_or("line channel access token not configured")?;
        let url = format!("{}/v2/bot/message/reply", self.base_url);
        let body = serde_json::json!({
            "replyToken": reply_token,
            "messages": [{ "type": "text", "text": text }]
        });
        let res = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("reply failed: {} {}", status, body));
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelHandle for LineChannel {
    fn id(&self) -> &str {
        &self.id
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), String> {
        LineChannel::reply(self, reply_token, text).await
    }
}

/// Resolve LINE Messaging API base URL (for tests or custom endpoints).
pub fn line_api_base() -> String {
    std::env::var("LINE_API_BASE").unwrap_or_else(|_| LINE_API_BASE.to_string())
}
