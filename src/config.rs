use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::neynar::CastSource;
use crate::retry::{Backoff, RetryPolicy};
use crate::DEFAULT_TOP_LIMIT;

/// Largest page the cast endpoints accept.
pub const MAX_FETCH_LIMIT: usize = 150;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Neynar API key is not configured: set NEYNAR_API_KEY or neynar.api_key")]
    MissingApiKey,
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeynarConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub api_base: String,
    pub timeout_ms: u64,
    pub fetch_limit: usize,
    pub source: CastSource,
}

impl Default for NeynarConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://api.neynar.com/v2".to_string(),
            timeout_ms: 10_000,
            fetch_limit: 50,
            source: CastSource::UserCasts,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub limit: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_TOP_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 1_000,
            backoff: Backoff::Fixed,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.delay_ms),
            self.backoff,
        )
    }
}

/// Public identity of the Mini App, used for share redirects and the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
    pub url: String,
    pub description: String,
    pub icon_url: String,
    pub splash_url: String,
    pub splash_background_color: String,
    pub button_text: String,
    pub tags: Vec<String>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "CastAnalytics".to_string(),
            url: "https://cast-analytics.vercel.app".to_string(),
            description: "A mini app that shows your most engaged cast in the span of 30 days"
                .to_string(),
            icon_url: "https://raw.githubusercontent.com/anipaul2/imageUpload/main/AppIcon.png"
                .to_string(),
            splash_url: "https://raw.githubusercontent.com/anipaul2/imageUpload/main/SI.png"
                .to_string(),
            splash_background_color: "#f7f7f7".to_string(),
            button_text: "Check your engagement score".to_string(),
            tags: vec![
                "analytics".to_string(),
                "engagement".to_string(),
                "social".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub web_root: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            web_root: "public".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub neynar: NeynarConfig,
    pub ranking: RankingConfig,
    pub retry: RetryConfig,
    pub app: AppSection,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Reads the TOML file (if any), applies environment overrides and
    /// validates the result. Returns the path that was consulted.
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let config_path = path.or_else(default_config_path);
        let mut config = match config_path.as_ref() {
            Some(path) if path.exists() => Self::from_file(path)?,
            _ => AppConfig::default(),
        };

        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok((config, config_path))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let payload = toml::to_string_pretty(self)?;
        std::fs::write(path, payload).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    /// The configured API key, or `MissingApiKey` when unset or blank.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.neynar
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ranking.limit == 0 {
            return Err(invalid("ranking.limit", "must be at least 1"));
        }
        if self.neynar.fetch_limit == 0 || self.neynar.fetch_limit > MAX_FETCH_LIMIT {
            return Err(invalid(
                "neynar.fetch_limit",
                &format!("must be between 1 and {}", MAX_FETCH_LIMIT),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts", "must be at least 1"));
        }
        if self.neynar.api_base.trim().is_empty() {
            return Err(invalid("neynar.api_base", "must not be empty"));
        }
        Ok(())
    }

    /// Applies overrides from `lookup`, which maps variable names to values.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = non_empty("NEYNAR_API_KEY") {
            self.neynar.api_key = Some(key.trim().to_string());
        }
        if let Some(base) = non_empty("NEYNAR_API_BASE") {
            self.neynar.api_base = base;
        }
        if let Some(value) = non_empty("NEYNAR_TIMEOUT_MS") {
            parse_into("NEYNAR_TIMEOUT_MS", &value, &mut self.neynar.timeout_ms);
        }
        if let Some(value) = non_empty("NEYNAR_FETCH_LIMIT") {
            parse_into("NEYNAR_FETCH_LIMIT", &value, &mut self.neynar.fetch_limit);
        }
        if let Some(value) = non_empty("NEYNAR_CAST_SOURCE") {
            match CastSource::from_str(&value) {
                Some(source) => self.neynar.source = source,
                None => warn!(key = "NEYNAR_CAST_SOURCE", value = %value, "ignoring unknown cast source"),
            }
        }
        if let Some(value) = non_empty("CASTLYTICS_TOP_LIMIT") {
            parse_into("CASTLYTICS_TOP_LIMIT", &value, &mut self.ranking.limit);
        }
        if let Some(value) = non_empty("CASTLYTICS_RETRY_ATTEMPTS") {
            parse_into("CASTLYTICS_RETRY_ATTEMPTS", &value, &mut self.retry.max_attempts);
        }
        if let Some(value) = non_empty("CASTLYTICS_RETRY_DELAY_MS") {
            parse_into("CASTLYTICS_RETRY_DELAY_MS", &value, &mut self.retry.delay_ms);
        }
        if let Some(value) = non_empty("CASTLYTICS_RETRY_BACKOFF") {
            match Backoff::from_str(&value) {
                Some(backoff) => self.retry.backoff = backoff,
                None => warn!(key = "CASTLYTICS_RETRY_BACKOFF", value = %value, "ignoring unknown backoff"),
            }
        }
        if let Some(url) = ["APP_URL", "NEXT_PUBLIC_APP_URL", "NEXT_PUBLIC_URL"]
            .into_iter()
            .find_map(|key| non_empty(key))
        {
            self.app.url = url;
        }
        if let Some(host) = non_empty("CASTLYTICS_HOST") {
            self.server.host = host;
        }
        if let Some(value) = non_empty("CASTLYTICS_PORT") {
            parse_into("CASTLYTICS_PORT", &value, &mut self.server.port);
        }
    }
}

/// Loads `.env.local` and then `.env` from `dir`. Variables already set are
/// never replaced, so `.env.local` wins over `.env`. Returns the files read.
pub fn load_env_files(dir: &Path) -> Vec<PathBuf> {
    [".env.local", ".env"]
        .iter()
        .map(|name| dir.join(name))
        .filter(|path| dotenvy::from_path(path).is_ok())
        .collect()
}

fn parse_into<T: std::str::FromStr>(key: &str, value: &str, target: &mut T) {
    match value.trim().parse::<T>() {
        Ok(parsed) => *target = parsed,
        Err(_) => warn!(key, value, "ignoring unparsable override"),
    }
}

fn invalid(name: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        message: message.to_string(),
    }
}

fn default_config_path() -> Option<PathBuf> {
    env::var("CASTLYTICS_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/castlytics.toml")))
}
