//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.chatbridge/config.json`) and
//! environment. Credentials may come from env vars (deployment) or the file
//! (local testing); env wins.

use crate::pipeline::TranslateFailurePolicy;
use crate::routing::LanguagePairConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application config. Built once at startup and passed into the
/// gateway and pipeline; never read as ambient state after that.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// LINE Messaging API credentials.
    #[serde(default)]
    pub line: LineConfig,

    /// Translation provider and routing settings.
    #[serde(default)]
    pub translator: TranslatorConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// HTTP port (default 5000). Overridden by the PORT env var when set, so
    /// platform-assigned ports (e.g. Render) work without config edits.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0" — the webhook must be reachable by the
    /// platform).
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    5000
}

fn default_gateway_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// LINE channel credentials. Env overrides: LINE_CHANNEL_ACCESS_TOKEN,
/// LINE_CHANNEL_SECRET.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineConfig {
    /// Messaging API channel access token (for replies).
    pub channel_access_token: Option<String>,
    /// Channel secret for webhook signature verification. When absent the
    /// signature gate is skipped (dev only).
    pub channel_secret: Option<String>,
}

/// Translation provider settings and the language pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatorConfig {
    /// Provider API key. Overridden by TRANSLATOR_API_KEY env when set.
    pub api_key: Option<String>,

    /// Provider base URL override (tests, proxies). Default: Google
    /// Translation v2 endpoint.
    pub base_url: Option<String>,

    /// Per-call timeout in seconds (default 10). A timed-out call is an
    /// ordinary failure; there is no retry.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// What to do when the translate call fails: "silent" or "notice"
    /// (default notice).
    #[serde(default)]
    pub on_translate_failure: TranslateFailurePolicy,

    /// Fixed reply sent under the notice policy. Default is a bilingual
    /// apology for the default pair.
    pub failure_notice: Option<String>,

    /// The bidirectional language pair and match policy.
    #[serde(default)]
    pub pair: LanguagePairConfig,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout_secs: default_timeout_secs(),
            on_translate_failure: TranslateFailurePolicy::default(),
            failure_notice: None,
            pair: LanguagePairConfig::default(),
        }
    }
}

impl TranslatorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn config_non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve the LINE channel access token: env LINE_CHANNEL_ACCESS_TOKEN
/// overrides config.
pub fn resolve_channel_access_token(config: &Config) -> Option<String> {
    env_non_empty("LINE_CHANNEL_ACCESS_TOKEN")
        .or_else(|| config_non_empty(config.line.channel_access_token.as_ref()))
}

/// Resolve the LINE channel secret: env LINE_CHANNEL_SECRET overrides config.
pub fn resolve_channel_secret(config: &Config) -> Option<String> {
    env_non_empty("LINE_CHANNEL_SECRET")
        .or_else(|| config_non_empty(config.line.channel_secret.as_ref()))
}

/// Resolve the translator API key: env TRANSLATOR_API_KEY overrides config.
pub fn resolve_translator_api_key(config: &Config) -> Option<String> {
    env_non_empty("TRANSLATOR_API_KEY")
        .or_else(|| config_non_empty(config.translator.api_key.as_ref()))
}

/// Resolve the serving port: env PORT overrides config.
pub fn resolve_port(config: &Config) -> u16 {
    env_non_empty("PORT")
        .and_then(|s| s.parse().ok())
        .unwrap_or(config.gateway.port)
}

/// Startup gate: credentials and pair must be usable before serving traffic.
/// A failure here is fatal — the process must not start.
pub fn validate_for_serving(config: &Config) -> Result<()> {
    if resolve_channel_access_token(config).is_none() {
        anyhow::bail!(
            "LINE channel access token not configured (set LINE_CHANNEL_ACCESS_TOKEN or line.channelAccessToken)"
        );
    }
    if resolve_translator_api_key(config).is_none() {
        anyhow::bail!(
            "translator API key not configured (set TRANSLATOR_API_KEY or translator.apiKey)"
        );
    }
    let pair = &config.translator.pair;
    if pair.side_a.trim().is_empty() || pair.side_b.trim().is_empty() {
        anyhow::bail!("language pair sides must be non-empty");
    }
    if pair.side_a == pair.side_b {
        anyhow::bail!("language pair sides must differ (got '{}' twice)", pair.side_a);
    }
    if resolve_channel_secret(config).is_none() {
        log::warn!("no channel secret configured; webhook signature verification is disabled");
    }
    Ok(())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("CHATBRIDGE_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".chatbridge").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or CHATBRIDGE_CONFIG_PATH). Missing
/// file => default config. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::MatchPolicy;

    #[test]
    fn default_gateway_port_and_bind() {
        let g = GatewayConfig::default();
        assert_eq!(g.port, 5000);
        assert_eq!(g.bind, "0.0.0.0");
    }

    #[test]
    fn default_translator_settings() {
        let t = TranslatorConfig::default();
        assert_eq!(t.timeout_secs, 10);
        assert_eq!(t.on_translate_failure, TranslateFailurePolicy::Notice);
        assert_eq!(t.pair.side_a, "zh-TW");
        assert_eq!(t.pair.side_b, "id");
        assert_eq!(t.pair.match_policy, MatchPolicy::Prefix);
    }

    #[test]
    fn config_parses_from_partial_json() {
        let raw = r#"{
            "line": { "channelAccessToken": "tok", "channelSecret": "sec" },
            "translator": {
                "apiKey": "key",
                "onTranslateFailure": "silent",
                "pair": { "sideA": "zh-TW", "sideB": "id", "matchPolicy": "exact" }
            }
        }"#;
        let config: Config = serde_json::from_str(raw).expect("parse");
        assert_eq!(config.line.channel_access_token.as_deref(), Some("tok"));
        assert_eq!(
            config.translator.on_translate_failure,
            TranslateFailurePolicy::Silent
        );
        assert_eq!(config.translator.pair.match_policy, MatchPolicy::Exact);
        assert_eq!(config.gateway.port, 5000);
    }

    #[test]
    fn validate_rejects_missing_credentials() {
        let config = Config::default();
        assert!(validate_for_serving(&config).is_err());
    }

    #[test]
    fn validate_rejects_identical_pair_sides() {
        let mut config = Config::default();
        config.line.channel_access_token = Some("tok".to_string());
        config.translator.api_key = Some("key".to_string());
        config.translator.pair.side_b = config.translator.pair.side_a.clone();
        assert!(validate_for_serving(&config).is_err());
    }

    #[test]
    fn validate_accepts_complete_config() {
        let mut config = Config::default();
        config.line.channel_access_token = Some("tok".to_string());
        config.line.channel_secret = Some("sec".to_string());
        config.translator.api_key = Some("key".to_string());
        assert!(validate_for_serving(&config).is_ok());
    }

    #[test]
    fn timeout_is_at_least_one_second() {
        let mut t = TranslatorConfig::default();
        t.timeout_secs = 0;
        assert_eq!(t.timeout(), Duration::from_secs(1));
    }
}
