//! Google Cloud Translation v2 client (detect + translate, API-key auth).

use super::{TranslateError, TranslationBackend};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://translation.googleapis.com";

/// Client for the Translation v2 REST API.
#[derive(Clone)]
pub struct GoogleTranslator {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GoogleTranslator {
    /// Build a client with the given API key. `base_url` overrides the Google
    /// endpoint (for tests or proxies); `timeout` bounds each upstream call.
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TranslateError> {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T, TranslateError> {
        let res = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(TranslateError::Api(format!("{} {}", status, body)));
        }
        let data: T = res
            .json()
            .await
            .map_err(|e| TranslateError::Malformed(e.to_string()))?;
        Ok(data)
    }
}

#[async_trait]
impl TranslationBackend for GoogleTranslator {
    /// POST /language/translate/v2/detect — most confident detection wins.
    async fn detect(&self, text: &str) -> Result<String, TranslateError> {
        let url = format!("{}/language/translate/v2/detect", self.base_url);
        let body = serde_json::json!({ "q": text });
        let data: DetectResponse = self.post_json(&url, &body).await?;
        let language = data
            .data
            .detections
            .into_iter()
            .flatten()
            .next()
            .map(|d| d.language)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| TranslateError::Malformed("empty detections".to_string()))?;
        Ok(language)
    }

    /// POST /language/translate/v2 — plain-text translation into `target`.
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslateError> {
        let url = format!("{}/language/translate/v2", self.base_url);
        let body = serde_json::json!({ "q": text, "target": target, "format": "text" });
        let data: TranslateResponse = self.post_json(&url, &body).await?;
        let translated = data
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| TranslateError::Malformed("empty translations".to_string()))?;
        Ok(translated)
    }
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    data: DetectData,
}

#[derive(Debug, Default, Deserialize)]
struct DetectData {
    #[serde(default)]
    detections: Vec<Vec<Detection>>,
}

#[derive(Debug, Deserialize)]
struct Detection {
    #[serde(default)]
    language: String,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    data: TranslateData,
}

#[derive(Debug, Default, Deserialize)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    #[serde(rename = "translatedText", default)]
    translated_text: String,
}
