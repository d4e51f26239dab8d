use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::services::Translations;

pub const DEFAULT_APP_NAME: &str = "ProjectNocturne";
pub const DEFAULT_OVERLAY_MODULE: &str = "toggleNotificationsOverlay";
pub const DEFAULT_CONTAINER_MODULE: &str = "overlayContainer";
pub const MAX_INTERVAL_MS: u64 = 86_400_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingingConfig {
    pub app_name: String,
    pub blink_interval_ms: u64,
    pub time_since_interval_ms: u64,
    pub overlay_module: String,
    pub container_module: String,
    pub translations: Translations,
}

impl Default for RingingConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            blink_interval_ms: default_interval_ms(),
            time_since_interval_ms: default_interval_ms(),
            overlay_module: DEFAULT_OVERLAY_MODULE.to_string(),
            container_module: DEFAULT_CONTAINER_MODULE.to_string(),
            translations: Translations::english(),
        }
    }
}

impl RingingConfig {
    pub fn blink_interval(&self) -> chrono::Duration {
        clamp_ms_to_duration(self.blink_interval_ms)
    }

    pub fn time_since_interval(&self) -> chrono::Duration {
        clamp_ms_to_duration(self.time_since_interval_ms)
    }
}

pub fn load_ringing_config(path: &Path) -> Result<RingingConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read config file {}", path.display()))?;
    parse_ringing_config_text(&content)
}

pub fn parse_ringing_config_text(content: &str) -> Result<RingingConfig> {
    let raw = serde_json::from_str::<RingingConfigFile>(content).map_err(|err| {
        let line = err.line();
        let column = err.column();
        anyhow::anyhow!("invalid JSON at line {line}, column {column}: {err}")
    })?;

    if raw.version != 1 {
        bail!(
            "unsupported config version {}; expected version 1",
            raw.version
        );
    }
    for (field, value) in [
        ("blink_interval_ms", raw.blink_interval_ms),
        ("time_since_interval_ms", raw.time_since_interval_ms),
    ] {
        if value == 0 {
            bail!("{field} must be greater than zero");
        }
        if value > MAX_INTERVAL_MS {
            bail!("{field} ({value}) exceeds the {MAX_INTERVAL_MS}ms limit");
        }
    }
    for (field, value) in [
        ("app_name", &raw.app_name),
        ("overlay_module", &raw.overlay_module),
        ("container_module", &raw.container_module),
    ] {
        if value.trim().is_empty() {
            bail!("{field} must not be empty");
        }
    }

    let mut translations = Translations::english();
    if let Some(overrides) = raw.translations {
        translations.merge(overrides);
    }

    Ok(RingingConfig {
        app_name: raw.app_name,
        blink_interval_ms: raw.blink_interval_ms,
        time_since_interval_ms: raw.time_since_interval_ms,
        overlay_module: raw.overlay_module,
        container_module: raw.container_module,
        translations,
    })
}

fn clamp_ms_to_duration(ms: u64) -> chrono::Duration {
    let ms_i64 = i64::try_from(ms.min(MAX_INTERVAL_MS)).unwrap_or(i64::MAX);
    chrono::Duration::milliseconds(ms_i64)
}

#[derive(Debug, Deserialize)]
struct RingingConfigFile {
    version: u32,
    #[serde(default = "default_app_name")]
    app_name: String,
    #[serde(default = "default_interval_ms")]
    blink_interval_ms: u64,
    #[serde(default = "default_interval_ms")]
    time_since_interval_ms: u64,
    #[serde(default = "default_overlay_module")]
    overlay_module: String,
    #[serde(default = "default_container_module")]
    container_module: String,
    #[serde(default)]
    translations: Option<Translations>,
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

fn default_interval_ms() -> u64 {
    1_000
}

fn default_overlay_module() -> String {
    DEFAULT_OVERLAY_MODULE.to_string()
}

fn default_container_module() -> String {
    DEFAULT_CONTAINER_MODULE.to_string()
}
