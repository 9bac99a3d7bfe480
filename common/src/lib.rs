/*!
common/src/lib.rs

Shared configuration types and helpers for Reelscope.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader for a TOML config file with default/override merging
- The quality tag enumeration shared by the filter config and extraction
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use url::Url;

/// Release quality tag as published bracketed inside feed entry titles.
///
/// The variants carry their feed spelling through serde so `filters.quality`
/// in the config file is written exactly as the feed writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "720p")]
    Hd720,
    #[serde(rename = "1080p")]
    Hd1080,
    #[serde(rename = "3D")]
    ThreeD,
}

impl Quality {
    /// Probe order used by extraction. First match wins.
    pub const ALL: [Quality; 3] = [Quality::Hd720, Quality::Hd1080, Quality::ThreeD];

    /// The literal bracketed form embedded in titles, e.g. `[1080p]`.
    pub fn bracket_tag(&self) -> &'static str {
        match self {
            Quality::Hd720 => "[720p]",
            Quality::Hd1080 => "[1080p]",
            Quality::ThreeD => "[3D]",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Hd720 => "720p",
            Quality::Hd1080 => "1080p",
            Quality::ThreeD => "3D",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SMTP credentials section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub username: String,
    pub password: String,
}

/// Outbound message envelope section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub from: String,
    pub to: String,
    pub subject: String,
}

/// Feed source section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RssFeedConfig {
    /// URL of the release feed to poll
    pub rss: String,
}

/// Filtering section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiltersConfig {
    /// Quality tag a release must carry to be delivered
    pub quality: Quality,
}

/// Fetching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub timeout_seconds: Option<u64>,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub smtp: SmtpConfig,
    pub email: EmailConfig,
    pub rssfeed: RssFeedConfig,
    pub filters: FiltersConfig,
    pub fetch: Option<FetchConfig>,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(
        default_path: Option<&Path>,
        override_path: Option<&Path>,
    ) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        if let Some(path) = default_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read default config: {}", path.display()))?;
                let val: toml::Value =
                    toml::from_str(&data).context("Failed to parse default configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        if let Some(path) = override_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read override config: {}", path.display()))?;
                let val: toml::Value =
                    toml::from_str(&data).context("Failed to parse override configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        let cfg: Config = config_value
            .try_into()
            .context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    /// Timeout applied to the single feed fetch of a run.
    pub fn fetch_timeout_seconds(&self) -> u64 {
        self.fetch
            .as_ref()
            .and_then(|f| f.timeout_seconds)
            .unwrap_or(10)
    }

    /// Reject configurations that would only fail later at the network boundary.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.rssfeed.rss)
            .with_context(|| format!("rssfeed.rss is not a valid URL: {}", self.rssfeed.rss))?;
        Ok(())
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"
        [smtp]
        username = "notifier@example.com"
        password = "hunter2"

        [email]
        from = "notifier@example.com"
        to = "watcher@example.com"
        subject = "New releases"

        [rssfeed]
        rss = "https://releases.example.com/rss"

        [filters]
        quality = "1080p"
    "#;

    #[test]
    fn config_from_string() {
        let cfg: Config = toml::from_str(FULL_CONFIG).expect("parse config");
        assert_eq!(cfg.smtp.username, "notifier@example.com");
        assert_eq!(cfg.email.subject, "New releases");
        assert_eq!(cfg.filters.quality, Quality::Hd1080);
        // fetch section absent, the default timeout applies
        assert_eq!(cfg.fetch_timeout_seconds(), 10);
        cfg.validate().expect("valid config");
    }

    #[test]
    fn missing_key_fails_the_parse() {
        // drop the smtp password
        let broken = FULL_CONFIG.replace("password = \"hunter2\"", "");
        assert!(toml::from_str::<Config>(&broken).is_err());
    }

    #[test]
    fn unknown_quality_fails_the_parse() {
        let broken = FULL_CONFIG.replace("\"1080p\"", "\"4K\"");
        assert!(toml::from_str::<Config>(&broken).is_err());
    }

    #[test]
    fn invalid_feed_url_fails_validation() {
        let broken = FULL_CONFIG.replace("https://releases.example.com/rss", "not a url");
        let cfg: Config = toml::from_str(&broken).expect("parse config");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn quality_spellings_round_trip() {
        for q in Quality::ALL {
            let toml_line = format!("quality = \"{}\"", q);
            let parsed: FiltersConfig = toml::from_str(&toml_line).expect("parse quality");
            assert_eq!(parsed.quality, q);
        }
        assert_eq!(Quality::ThreeD.bracket_tag(), "[3D]");
    }

    #[tokio::test]
    async fn override_takes_precedence_over_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let default_path = dir.path().join("config.default.toml");
        let override_path = dir.path().join("config.toml");

        tokio::fs::write(&default_path, FULL_CONFIG).await.unwrap();
        tokio::fs::write(
            &override_path,
            r#"
            [filters]
            quality = "720p"

            [fetch]
            timeout_seconds = 30
            "#,
        )
        .await
        .unwrap();

        let cfg = Config::load_with_defaults(Some(&default_path), Some(&override_path))
            .await
            .expect("merged config");

        // overridden keys win, untouched sections survive from the defaults
        assert_eq!(cfg.filters.quality, Quality::Hd720);
        assert_eq!(cfg.fetch_timeout_seconds(), 30);
        assert_eq!(cfg.smtp.username, "notifier@example.com");
    }
}
