//! Initialize the configuration directory: create ~/.chatbridge and a default
//! config file. Credentials are usually supplied via env; the file holds the
//! language pair and policies.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = r#"{
  "line": {
    "channelAccessToken": null,
    "channelSecret": null
  },
  "translator": {
    "apiKey": null,
    "onTranslateFailure": "notice",
    "pair": {
      "sideA": "zh-TW",
      "sideB": "id",
      "fallback": ["ms"],
      "matchPolicy": "prefix"
    }
  }
}
"#;

/// Create the config directory and a default config file if they do not exist.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        std::fs::write(config_path, DEFAULT_CONFIG)
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    } else {
        log::debug!("config already exists at {}, skipping", config_path.display());
    }

    Ok(config_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn default_config_template_parses() {
        let config: Config = serde_json::from_str(DEFAULT_CONFIG).expect("parse template");
        assert_eq!(config.translator.pair.side_a, "zh-TW");
        assert_eq!(config.translator.pair.side_b, "id");
    }
}
