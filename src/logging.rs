use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Installs the process-wide subscriber writing plain text to the log file.
///
/// The terminal belongs to the UI, so nothing is written to stdout/stderr.
pub fn init(config: &Config) -> Result<()> {
    let file = open_log_file(&config.log_path)?;
    let filter = EnvFilter::try_new(&config.log_filter)
        .with_context(|| format!("Invalid PALAVER_LOG filter '{}'", config.log_filter))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|error| anyhow!("failed to install log subscriber: {error}"))
}

fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file '{}'", path.display()))
}

pub fn emit_debug_payload(request_url: &str, payload: &Value) {
    let formatted_payload = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|_| "<payload serialization error>".to_string());
    tracing::debug!(url = request_url, "request payload:\n{formatted_payload}");
}
