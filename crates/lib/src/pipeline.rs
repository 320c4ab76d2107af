//! Message pipeline: detect → route → translate → reply decision.
//!
//! Per inbound message: Received → Detecting → {DetectFailed | Detected} →
//! Routing → {Skipped | Translating} → {TranslateFailed | Translated}.
//! Detect failure and out-of-pair languages end with no reply; translate
//! failure follows the configured policy.

use crate::channels::InboundMessage;
use crate::routing::{self, LanguagePairConfig};
use crate::translate::TranslationBackend;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What to send when the translate call fails: nothing, or a fixed localized
/// notice. The notice is never an upstream error and never empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslateFailurePolicy {
    /// No reply is sent on translate failure.
    Silent,
    /// Reply with the configured failure notice.
    #[default]
    Notice,
}

/// Default failure notice, phrased for both sides of the default pair.
pub const DEFAULT_FAILURE_NOTICE: &str =
    "抱歉，目前無法翻譯這則訊息。Maaf, pesan ini tidak dapat diterjemahkan saat ini.";

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Skip: no reply is sent (detect failure, or language outside the pair).
    NoReply,
    /// Reply with the translated text.
    Reply(String),
    /// Translate failed under the notice policy; reply with the fixed notice.
    ReplyWithFailureNotice(String),
}

/// Request-scoped translation pipeline over an injected backend. Holds only
/// immutable configuration; safe to share across concurrent messages.
pub struct MessagePipeline {
    backend: Arc<dyn TranslationBackend>,
    pair: LanguagePairConfig,
    on_translate_failure: TranslateFailurePolicy,
    failure_notice: String,
}

impl MessagePipeline {
    pub fn new(
        backend: Arc<dyn TranslationBackend>,
        pair: LanguagePairConfig,
        on_translate_failure: TranslateFailurePolicy,
        failure_notice: Option<String>,
    ) -> Self {
        let failure_notice = failure_notice
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_FAILURE_NOTICE.to_string());
        Self {
            backend,
            pair,
            on_translate_failure,
            failure_notice,
        }
    }

    /// Run one message through detect → route → translate. The only interface
    /// a transport or test harness needs to drive.
    pub async fn handle_message(&self, msg: &InboundMessage) -> PipelineOutcome {
        let detected = match self.backend.detect(&msg.text).await {
            Ok(lang) => lang,
            Err(e) => {
                log::warn!("language detection failed, skipping reply: {}", e);
                return PipelineOutcome::NoReply;
            }
        };
        let directive = routing::decide(&detected, &self.pair);
        let Some(target) = directive.target else {
            log::debug!(
                "detected '{}' outside configured pair ({} <-> {}), skipping",
                directive.source,
                self.pair.side_a,
                self.pair.side_b
            );
            return PipelineOutcome::NoReply;
        };
        match self.backend.translate(&msg.text, &target).await {
            Ok(translated) => {
                log::info!("translated {} -> {}", directive.source, target);
                PipelineOutcome::Reply(translated)
            }
            Err(e) => {
                log::warn!("translation {} -> {} failed: {}", directive.source, target, e);
                match self.on_translate_failure {
                    TranslateFailurePolicy::Silent => PipelineOutcome::NoReply,
                    TranslateFailurePolicy::Notice => {
                        PipelineOutcome::ReplyWithFailureNotice(self.failure_notice.clone())
                    }
                }
            }
        }
    }
}
