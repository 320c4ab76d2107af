//! Integration test: serve the router with a stubbed translation backend and
//! a recording channel, POST LINE webhook envelopes, assert delivered replies
//! and the signature gate.

use async_trait::async_trait;
use base64::Engine as _;
use hmac::Mac as _;
use lib::channels::{ChannelHandle, ChannelRegistry, InboundMessage};
use lib::config::Config;
use lib::gateway::{build_router, spawn_processor, GatewayState};
use lib::pipeline::{MessagePipeline, TranslateFailurePolicy};
use lib::routing::LanguagePairConfig;
use lib::translate::{TranslateError, TranslationBackend};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Deterministic backend: Chinese text detects as zh-TW and translates to
/// "Halo"; Indonesian detects as id and translates to "你好"; anything else
/// detects as en.
struct StubBackend;

#[async_trait]
impl TranslationBackend for StubBackend {
    async fn detect(&self, text: &str) -> Result<String, TranslateError> {
        if text.contains('你') {
            Ok("zh-TW".to_string())
        } else if text.contains("Halo") {
            Ok("id".to_string())
        } else {
            Ok("en".to_string())
        }
    }

    async fn translate(&self, _text: &str, target: &str) -> Result<String, TranslateError> {
        match target {
            "id" => Ok("Halo".to_string()),
            "zh-TW" => Ok("你好".to_string()),
            other => Err(TranslateError::Api(format!("unexpected target {}", other))),
        }
    }
}

/// Channel that records replies instead of delivering them.
struct RecordingChannel {
    replies: Mutex<Vec<(String, String)>>,
}

impl RecordingChannel {
    fn new() -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
        }
    }

    fn replies(&self) -> Vec<(String, String)> {
        self.replies.lock().expect("lock").clone()
    }
}

#[async_trait]
impl ChannelHandle for RecordingChannel {
    fn id(&self) -> &str {
        "line"
    }

    fn stop(&self) {}

    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), String> {
        self.replies
            .lock()
            .expect("lock")
            .push((reply_token.to_string(), text.to_string()));
        Ok(())
    }
}

/// Serve the router on a free port; returns the base URL and the recording channel.
async fn serve_gateway(channel_secret: Option<String>) -> (String, Arc<RecordingChannel>) {
    let pipeline = Arc::new(MessagePipeline::new(
        Arc::new(StubBackend),
        LanguagePairConfig::default(),
        TranslateFailurePolicy::Notice,
        None,
    ));
    let registry = Arc::new(ChannelRegistry::new());
    let recorder = Arc::new(RecordingChannel::new());
    registry.register("line".to_string(), recorder.clone()).await;

    let (inbound_tx, inbound_rx) = mpsc::channel::<InboundMessage>(16);
    spawn_processor(pipeline, registry, inbound_rx);

    let state = GatewayState {
        config: Arc::new(Config::default()),
        channel_secret,
        inbound_tx,
    };
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind free port");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{}", addr), recorder)
}

fn text_event_body(reply_token: &str, text: &str) -> String {
    serde_json::json!({
        "events": [{
            "type": "message",
            "replyToken": reply_token,
            "message": { "id": "m1", "type": "text", "text": text }
        }]
    })
    .to_string()
}

fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        hmac::Hmac::<sha2::Sha256>::new_from_slice(secret.as_bytes()).expect("hmac key");
    mac.update(body);
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

async fn wait_for_reply(recorder: &RecordingChannel) -> Vec<(String, String)> {
    for _ in 0..100 {
        let replies = recorder.replies();
        if !replies.is_empty() {
            return replies;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("no reply delivered within 2s");
}

#[tokio::test]
async fn chinese_message_is_relayed_as_indonesian_reply() {
    let (base, recorder) = serve_gateway(None).await;
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/line/webhook", base))
        .header("content-type", "application/json")
        .body(text_event_body("token-1", "你好"))
        .send()
        .await
        .expect("post webhook");
    assert!(res.status().is_success());

    let replies = wait_for_reply(&recorder).await;
    assert_eq!(replies, vec![("token-1".to_string(), "Halo".to_string())]);
}

#[tokio::test]
async fn out_of_pair_message_gets_no_reply() {
    let (base, recorder) = serve_gateway(None).await;
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/line/webhook", base))
        .header("content-type", "application/json")
        .body(text_event_body("token-en", "Hello"))
        .send()
        .await
        .expect("post webhook");
    assert!(res.status().is_success());

    // Post an in-pair message afterwards; when its reply arrives, the earlier
    // out-of-pair event has certainly been processed too.
    client
        .post(format!("{}/line/webhook", base))
        .header("content-type", "application/json")
        .body(text_event_body("token-zh", "你好"))
        .send()
        .await
        .expect("post webhook");
    let replies = wait_for_reply(&recorder).await;
    assert_eq!(replies, vec![("token-zh".to_string(), "Halo".to_string())]);
}

#[tokio::test]
async fn webhook_without_valid_signature_is_rejected() {
    let (base, recorder) = serve_gateway(Some("channel-secret".to_string())).await;
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/line/webhook", base))
        .header("content-type", "application/json")
        .body(text_event_body("token-1", "你好"))
        .send()
        .await
        .expect("post webhook");
    assert_eq!(res.status().as_u16(), 403);
    assert!(recorder.replies().is_empty());
}

#[tokio::test]
async fn webhook_with_valid_signature_is_accepted() {
    let (base, recorder) = serve_gateway(Some("channel-secret".to_string())).await;
    let body = text_event_body("token-signed", "你好");
    let signature = sign("channel-secret", body.as_bytes());
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/line/webhook", base))
        .header("content-type", "application/json")
        .header("x-line-signature", signature)
        .body(body)
        .send()
        .await
        .expect("post webhook");
    assert!(res.status().is_success());

    let replies = wait_for_reply(&recorder).await;
    assert_eq!(
        replies,
        vec![("token-signed".to_string(), "Halo".to_string())]
    );
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let (base, _recorder) = serve_gateway(None).await;
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/line/webhook", base))
        .header("content-type", "application/json")
        .body("not json")
        .send()
        .await
        .expect("post webhook");
    assert_eq!(res.status().as_u16(), 400);
}

#[tokio::test]
async fn non_message_events_are_acknowledged_without_reply() {
    let (base, recorder) = serve_gateway(None).await;
    let body = serde_json::json!({
        "events": [{ "type": "follow", "replyToken": "token-f" }]
    })
    .to_string();
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/line/webhook", base))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .expect("post webhook");
    assert!(res.status().is_success());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(recorder.replies().is_empty());
}
