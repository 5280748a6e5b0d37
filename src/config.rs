//! Configuration management
//!
//! Read from `--config <path>` or `<config dir>/gramkit/config.toml`.
//! A missing file means defaults; every section and key is optional.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub platform: PlatformConfig,
    pub login: LoginConfig,
    pub giveaway: GiveawayConfig,
    pub insights: InsightsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Root of the private API, e.g. "https://i.instagram.com/api/v1"
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Items requested per page for paginated listings
    pub page_size: usize,
    /// Newest messages fetched per direct-message thread. Story mentions
    /// older than this window are not seen.
    pub thread_message_limit: usize,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: "https://i.instagram.com/api/v1".to_string(),
            user_agent: "Instagram 269.0.0.18.75 Android (26/8.0.0; 480dpi; 1080x1920; OnePlus; 6T Dev; devitron; qcom; en_US; 314665256)".to_string(),
            timeout_secs: 30,
            page_size: 100,
            thread_message_limit: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    /// Ask for a second-factor code when logging in
    pub two_factor: bool,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self { two_factor: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GiveawayConfig {
    /// Upper bound on direct-message threads scanned for story mentions
    pub thread_limit: usize,
}

impl Default for GiveawayConfig {
    fn default() -> Self {
        Self { thread_limit: 5000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    pub num_posts: usize,
    /// Share of raw comments assumed to be the owner's own replies
    pub comment_pct: f64,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            num_posts: 20,
            comment_pct: 0.4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "gramkit=info".to_string(),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gramkit").join("config.toml"))
    }

    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// An explicitly given path must exist; the default location may not.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.insights.comment_pct) {
            return Err(ConfigError::Invalid(format!(
                "insights.comment_pct must be within [0, 1], got {}",
                self.insights.comment_pct
            )));
        }
        if self.platform.page_size == 0 {
            return Err(ConfigError::Invalid(
                "platform.page_size must be positive".to_string(),
            ));
        }
        if self.platform.thread_message_limit == 0 {
            return Err(ConfigError::Invalid(
                "platform.thread_message_limit must be positive".to_string(),
            ));
        }
        if self.platform.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "platform.base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
