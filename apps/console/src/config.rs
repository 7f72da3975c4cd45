use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use client_core::Session;
use serde::Deserialize;
use tracing::warn;

pub const CONFIG_FILE: &str = "console.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub api_base_url: String,
    pub session_file: PathBuf,
    /// `None` disables the per-request timeout.
    pub request_timeout_seconds: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:3000".into(),
            session_file: PathBuf::from("session.json"),
            request_timeout_seconds: None,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_seconds.map(Duration::from_secs)
    }
}

/// Defaults, then the TOML file at `config_path` if it exists, then the
/// process environment.
pub fn load_settings(config_path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<HashMap<String, toml::Value>>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            warn!("ignoring malformed config file: {err}");
            return;
        }
    };

    if let Some(v) = file_cfg.get("api_base_url").and_then(toml::Value::as_str) {
        settings.api_base_url = v.to_string();
    }
    if let Some(v) = file_cfg.get("session_file").and_then(toml::Value::as_str) {
        settings.session_file = PathBuf::from(v);
    }
    if let Some(v) = file_cfg.get("request_timeout_seconds") {
        match v.as_integer().and_then(|secs| u64::try_from(secs).ok()) {
            Some(secs) => settings.request_timeout_seconds = timeout_from_secs(secs),
            None => warn!("request_timeout_seconds must be a non-negative integer"),
        }
    }
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("DASHBOARD_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = lookup("APP__SESSION_FILE") {
        settings.session_file = PathBuf::from(v);
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_seconds = timeout_from_secs(parsed);
        }
    }
}

fn timeout_from_secs(secs: u64) -> Option<u64> {
    (secs > 0).then_some(secs)
}

/// Reads the bearer token and operator profile saved at sign-in.
pub fn load_session(path: &Path) -> anyhow::Result<Session> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read session file '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("session file '{}' is not a valid session", path.display()))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
