//! Translation gateway: detect-language and translate-text against an
//! upstream provider, normalized to one result/error contract.
//!
//! One attempt per call; no automatic retry. Callers wanting resilience wrap
//! the backend themselves.

mod google;

use async_trait::async_trait;

pub use google::GoogleTranslator;

/// Upstream call failure. Causes are kept for logging; callers only
/// distinguish success from failure.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("translator request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("translator api error: {0}")]
    Api(String),
    #[error("translator response malformed: {0}")]
    Malformed(String),
}

/// Upstream translation capabilities. Timeouts surface as `Request` errors;
/// the pipeline treats every variant uniformly.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Detect the language of `text`, returning a normalized tag (e.g. "zh-TW").
    async fn detect(&self, text: &str) -> Result<String, TranslateError>;

    /// Translate `text` into `target`.
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslateError>;
}
