//! Language routing: decide the translation direction for a detected language.
//!
//! Pure decision logic over the configured bidirectional pair. A `None` target
//! means "skip, do not reply" — the normal case for out-of-pair languages,
//! not an error.

use serde::{Deserialize, Serialize};

/// How a detected language is matched against the configured pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Only the exact configured tags match ("zh-TW" matches "zh-TW" only).
    Exact,
    /// Regional variants of side A match by primary subtag (any "zh*" counts
    /// as side A when A is "zh-TW"); the fallback set folds into side B.
    #[default]
    Prefix,
}

/// The configured bidirectional language pair, fallback set, and match policy.
/// Built once at startup; immutable for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguagePairConfig {
    /// Side A of the pair (default "zh-TW").
    #[serde(default = "default_side_a")]
    pub side_a: String,

    /// Side B of the pair (default "id").
    #[serde(default = "default_side_b")]
    pub side_b: String,

    /// Extra codes treated like side B under the prefix policy, so they are
    /// translated to side A (default ["ms"]: Malay folds into the Indonesian
    /// direction).
    #[serde(default = "default_fallback")]
    pub fallback: Vec<String>,

    /// Exact or prefix matching (default prefix).
    #[serde(default)]
    pub match_policy: MatchPolicy,
}

fn default_side_a() -> String {
    "zh-TW".to_string()
}

fn default_side_b() -> String {
    "id".to_string()
}

fn default_fallback() -> Vec<String> {
    vec!["ms".to_string()]
}

impl Default for LanguagePairConfig {
    fn default() -> Self {
        Self {
            side_a: default_side_a(),
            side_b: default_side_b(),
            fallback: default_fallback(),
            match_policy: MatchPolicy::default(),
        }
    }
}

/// Routing decision for one message: detected source and the target to
/// translate into, or `None` to skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationDirective {
    pub source: String,
    pub target: Option<String>,
}

impl TranslationDirective {
    fn skip(source: &str) -> Self {
        Self {
            source: source.to_string(),
            target: None,
        }
    }

    fn translate_to(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: Some(target.to_string()),
        }
    }
}

/// Primary subtag of a language tag ("zh-TW" -> "zh").
fn primary_subtag(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}

/// Map a detected language to a translation directive under the configured
/// pair and policy. Empty/unknown detection always skips.
pub fn decide(detected: &str, pair: &LanguagePairConfig) -> TranslationDirective {
    let detected = detected.trim();
    if detected.is_empty() {
        return TranslationDirective::skip(detected);
    }
    match pair.match_policy {
        MatchPolicy::Exact => {
            if detected == pair.side_a {
                TranslationDirective::translate_to(detected, &pair.side_b)
            } else if detected == pair.side_b {
                TranslationDirective::translate_to(detected, &pair.side_a)
            } else {
                TranslationDirective::skip(detected)
            }
        }
        MatchPolicy::Prefix => {
            if primary_subtag(detected) == primary_subtag(&pair.side_a) {
                TranslationDirective::translate_to(detected, &pair.side_b)
            } else if detected == pair.side_b || pair.fallback.iter().any(|f| f == detected) {
                TranslationDirective::translate_to(detected, &pair.side_a)
            } else {
                TranslationDirective::skip(detected)
            }
        }
    }
}
