use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use client_core::SessionConfig;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "quiz.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub start_url: String,
    pub time_limit_ms: u64,
    pub tick_steps: u32,
    pub database_url: String,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            start_url: session.start_url,
            time_limit_ms: u64::try_from(session.time_limit.as_millis()).unwrap_or(10_000),
            tick_steps: session.tick_steps,
            database_url: "sqlite://./data/quiz.db".into(),
            log_level: "warn".into(),
        }
    }
}

impl Settings {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            start_url: self.start_url.clone(),
            time_limit: Duration::from_millis(self.time_limit_ms.max(1)),
            tick_steps: self.tick_steps.max(1),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    start_url: Option<String>,
    time_limit_ms: Option<u64>,
    tick_steps: Option<u32>,
    database_url: Option<String>,
    log_level: Option<String>,
}

pub fn load_settings(config_path: &Path) -> Settings {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file, then environment variables.
pub fn load_settings_with(config_path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        if let Ok(file_cfg) = toml::from_str::<FileSettings>(&raw) {
            apply_file(&mut settings, file_cfg);
        }
    }

    for key in ["QUIZ_START_URL", "APP__START_URL"] {
        if let Some(v) = env(key) {
            settings.start_url = v;
        }
    }
    for key in ["QUIZ_TIME_LIMIT_MS", "APP__TIME_LIMIT_MS"] {
        if let Some(parsed) = env(key).and_then(|v| v.parse::<u64>().ok()) {
            settings.time_limit_ms = parsed;
        }
    }
    if let Some(parsed) = env("APP__TICK_STEPS").and_then(|v| v.parse::<u32>().ok()) {
        settings.tick_steps = parsed;
    }
    for key in ["DATABASE_URL", "APP__DATABASE_URL"] {
        if let Some(v) = env(key) {
            settings.database_url = v;
        }
    }
    if let Some(v) = env("APP__LOG_LEVEL") {
        settings.log_level = v;
    }

    settings
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.start_url {
        settings.start_url = v;
    }
    if let Some(v) = file_cfg.time_limit_ms {
        settings.time_limit_ms = v;
    }
    if let Some(v) = file_cfg.tick_steps {
        settings.tick_steps = v;
    }
    if let Some(v) = file_cfg.database_url {
        settings.database_url = v;
    }
    if let Some(v) = file_cfg.log_level {
        settings.log_level = v;
    }
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(parent) = sqlite_path(database_url)
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
    else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(&parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(PathBuf::from(path))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
