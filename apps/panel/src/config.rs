use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Context};
use backend_client::ClientConfig;
use serde::Deserialize;
use shared::domain::BackendKind;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: BackendKind,
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub log_filter: String,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Engine,
            base_url: "http://localhost:12357".into(),
            request_timeout_ms: 5_000,
            poll_interval_ms: 1_000,
            log_filter: "info".into(),
            log_file: None,
        }
    }
}

impl Settings {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            kind: self.backend,
            base_url: self.base_url.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Reads `path` (a missing file means defaults) and then applies environment
/// overrides.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = read_settings_file(path)?;
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn read_settings_file(path: &Path) -> anyhow::Result<Settings> {
    match fs::read_to_string(path) {
        Ok(raw) => toml::from_str(&raw)
            .with_context(|| format!("failed to parse settings file {}", path.display())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Settings::default()),
        Err(err) => {
            Err(err).with_context(|| format!("failed to read settings file {}", path.display()))
        }
    }
}

/// `PANEL_*` variables win over their `APP__*` aliases.
pub fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    let var = |primary: &str, alias: &str| lookup(primary).or_else(|| lookup(alias));

    if let Some(v) = var("PANEL_BACKEND", "APP__BACKEND") {
        settings.backend = v.parse().map_err(|e: String| anyhow!(e))?;
    }
    if let Some(v) = var("PANEL_BASE_URL", "APP__BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = var("PANEL_REQUEST_TIMEOUT_MS", "APP__REQUEST_TIMEOUT_MS") {
        settings.request_timeout_ms = v
            .parse()
            .with_context(|| format!("invalid request timeout {v:?}"))?;
    }
    if let Some(v) = var("PANEL_POLL_INTERVAL_MS", "APP__POLL_INTERVAL_MS") {
        settings.poll_interval_ms = v
            .parse()
            .with_context(|| format!("invalid poll interval {v:?}"))?;
    }
    if let Some(v) = var("PANEL_LOG_FILTER", "APP__LOG_FILTER") {
        settings.log_filter = v;
    }
    if let Some(v) = var("PANEL_LOG_FILE", "APP__LOG_FILE") {
        settings.log_file = (!v.trim().is_empty()).then(|| PathBuf::from(v));
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
