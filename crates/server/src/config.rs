use std::{fs, time::Duration};

use heating::ControllerPolicy;
use serde::Deserialize;
use tracing::warn;

const CONFIG_FILE: &str = "server.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub tick_millis: u64,
    pub catalog_timeout_ms: u64,
    pub increment_cap_seconds: Option<u32>,
    pub block_predefined_while_paused: bool,
    pub event_buffer: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            database_url: "sqlite://./data/microwave.db".into(),
            tick_millis: 1000,
            catalog_timeout_ms: 2000,
            increment_cap_seconds: None,
            block_predefined_while_paused: false,
            event_buffer: 256,
        }
    }
}

impl Settings {
    pub fn policy(&self) -> ControllerPolicy {
        ControllerPolicy {
            increment_cap_seconds: self.increment_cap_seconds,
            block_predefined_while_paused: self.block_predefined_while_paused,
            catalog_timeout: Duration::from_millis(self.catalog_timeout_ms),
        }
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }

    fn apply_file(&mut self, raw: &str) {
        let file_cfg = match toml::from_str::<FileSettings>(raw) {
            Ok(file_cfg) => file_cfg,
            Err(error) => {
                warn!(%error, file = CONFIG_FILE, "ignoring unreadable config file");
                return;
            }
        };

        if let Some(v) = file_cfg.bind_addr {
            self.server_bind = v;
        }
        if let Some(v) = file_cfg.database_url {
            self.database_url = v;
        }
        if let Some(v) = file_cfg.tick_millis {
            self.tick_millis = v;
        }
        if let Some(v) = file_cfg.catalog_timeout_ms {
            self.catalog_timeout_ms = v;
        }
        if let Some(v) = file_cfg.increment_cap_seconds {
            self.increment_cap_seconds = Some(v);
        }
        if let Some(v) = file_cfg.block_predefined_while_paused {
            self.block_predefined_while_paused = v;
        }
        if let Some(v) = file_cfg.event_buffer {
            self.event_buffer = v;
        }
    }

    /// Later keys win, so `APP__*` overrides the bare names.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        for key in ["SERVER_BIND", "APP__BIND_ADDR"] {
            if let Some(v) = var(key) {
                self.server_bind = v;
            }
        }
        for key in ["DATABASE_URL", "APP__DATABASE_URL"] {
            if let Some(v) = var(key) {
                self.database_url = v;
            }
        }
        if let Some(v) = parsed(&var, "APP__TICK_MILLIS") {
            self.tick_millis = v;
        }
        if let Some(v) = parsed(&var, "APP__CATALOG_TIMEOUT_MS") {
            self.catalog_timeout_ms = v;
        }
        if let Some(v) = var("APP__INCREMENT_CAP_SECONDS") {
            // An empty value switches the cap off again.
            if v.trim().is_empty() {
                self.increment_cap_seconds = None;
            } else if let Some(cap) = parse_value("APP__INCREMENT_CAP_SECONDS", &v) {
                self.increment_cap_seconds = Some(cap);
            }
        }
        if let Some(v) = parsed(&var, "APP__BLOCK_PREDEFINED_WHILE_PAUSED") {
            self.block_predefined_while_paused = v;
        }
        if let Some(v) = parsed(&var, "APP__EVENT_BUFFER") {
            self.event_buffer = v;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    database_url: Option<String>,
    tick_millis: Option<u64>,
    catalog_timeout_ms: Option<u64>,
    increment_cap_seconds: Option<u32>,
    block_predefined_while_paused: Option<bool>,
    event_buffer: Option<usize>,
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(CONFIG_FILE) {
        settings.apply_file(&raw);
    }
    settings.apply_env(|key| std::env::var(key).ok());

    settings
}

fn parsed<T: std::str::FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    var(key).and_then(|raw| parse_value(key, &raw))
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
    let value = raw.trim().parse().ok();
    if value.is_none() {
        warn!(key, value = raw, "ignoring unparsable setting");
    }
    value
}

/// Turns a bare path or loosely written sqlite URL into one sqlx accepts.
/// Creating the parent directory is left to the store.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite://") {
        if has_drive_prefix(path) {
            return format!("sqlite:{}", path.replace('\\', "/"));
        }
        return raw_database_url.to_string();
    }

    if raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    let path = raw_database_url
        .strip_prefix("sqlite:")
        .unwrap_or(raw_database_url)
        .replace('\\', "/");
    if has_drive_prefix(&path) {
        format!("sqlite:{path}")
    } else {
        format!("sqlite://{path}")
    }
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
