use anyhow::{bail, Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::util::{env_value, parse_bool_str, parse_http_url};

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-3-opus-20240229";
pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
const MAX_TOKENS_LIMIT: u32 = 8192;
const DEFAULT_READ_TIMEOUT_SECS: u64 = 60;
const DEFAULT_LOG_PATH: &str = "/tmp/palaver.log";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub anthropic_version: String,
    pub max_tokens: u32,
    pub read_timeout: Duration,
    pub log_path: PathBuf,
    pub log_filter: String,
    pub debug_payload: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            anthropic_version: DEFAULT_ANTHROPIC_VERSION.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            debug_payload: false,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("anthropic_version", &self.anthropic_version)
            .field("max_tokens", &self.max_tokens)
            .field("read_timeout", &self.read_timeout)
            .field("log_path", &self.log_path)
            .field("log_filter", &self.log_filter)
            .field("debug_payload", &self.debug_payload)
            .finish()
    }
}

/// Loads `.env` from the working directory or its parents into the process
/// environment. Variables already set win. Returns `false` when no file exists.
pub fn load_dotenv() -> Result<bool> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(true),
        Err(error) if error.not_found() => Ok(false),
        Err(error) => Err(error).context("failed to read .env file"),
    }
}

pub fn load_env_file(path: &Path) -> Result<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(error) if error.not_found() => Ok(false),
        Err(error) => {
            Err(error).with_context(|| format!("failed to read env file '{}'", path.display()))
        }
    }
}

impl Config {
    /// Reads the process environment once at startup.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();

        let max_tokens = match env_value("PALAVER_MAX_TOKENS") {
            Some(value) => value
                .parse::<u32>()
                .with_context(|| format!("Invalid PALAVER_MAX_TOKENS '{value}'"))?
                .clamp(1, MAX_TOKENS_LIMIT),
            None => defaults.max_tokens,
        };
        let read_timeout = match env_value("PALAVER_READ_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(
                value
                    .parse::<u64>()
                    .with_context(|| format!("Invalid PALAVER_READ_TIMEOUT_SECS '{value}'"))?,
            ),
            None => defaults.read_timeout,
        };
        let debug_payload = env_value("PALAVER_DEBUG_PAYLOAD")
            .as_deref()
            .and_then(parse_bool_str)
            .unwrap_or(false);

        Ok(Self {
            api_key: env_value("ANTHROPIC_API_KEY"),
            model: env_value("ANTHROPIC_MODEL").unwrap_or(defaults.model),
            api_url: env_value("ANTHROPIC_API_URL").unwrap_or(defaults.api_url),
            anthropic_version: env_value("ANTHROPIC_VERSION")
                .unwrap_or(defaults.anthropic_version),
            max_tokens,
            read_timeout,
            log_path: env_value("PALAVER_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_path),
            log_filter: env_value("PALAVER_LOG").unwrap_or(defaults.log_filter),
            debug_payload,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_none() {
            bail!("ANTHROPIC_API_KEY is not set");
        }

        if parse_http_url(&self.api_url).is_none() {
            bail!(
                "Invalid ANTHROPIC_API_URL '{}': expected http:// or https:// URL",
                self.api_url
            );
        }

        if self.model.trim().is_empty() {
            bail!("ANTHROPIC_MODEL must not be empty");
        }

        if self.read_timeout.is_zero() {
            bail!("PALAVER_READ_TIMEOUT_SECS must be greater than zero");
        }

        Ok(())
    }
}
