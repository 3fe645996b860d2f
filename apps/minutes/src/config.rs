use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use client_core::http::normalize_base_url;
use serde::Deserialize;
use shared::domain::{TemplateId, DEFAULT_TEMPLATE_ID};

pub const CONFIG_FILE: &str = "minutes.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base_url: String,
    pub token_path: PathBuf,
    pub default_template: TemplateId,
    pub request_timeout_secs: u64,
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".into(),
            token_path: default_token_path(),
            default_template: DEFAULT_TEMPLATE_ID.into(),
            request_timeout_secs: 120,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    api_base_url: Option<String>,
    token_path: Option<PathBuf>,
    default_template: Option<String>,
    request_timeout_secs: Option<u64>,
    output_dir: Option<PathBuf>,
}

fn default_token_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("minutes"))
        .unwrap_or_else(|| PathBuf::from(".minutes"))
        .join("token")
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    config_file: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(config_file) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse '{}'", config_file.display()))?;
            if let Some(v) = file_cfg.api_base_url {
                settings.api_base_url = v;
            }
            if let Some(v) = file_cfg.token_path {
                settings.token_path = v;
            }
            if let Some(v) = file_cfg.default_template {
                settings.default_template = v.into();
            }
            if let Some(v) = file_cfg.request_timeout_secs {
                settings.request_timeout_secs = v;
            }
            if let Some(v) = file_cfg.output_dir {
                settings.output_dir = v;
            }
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", config_file.display()))
        }
    }

    if let Some(v) = env("MINUTES_API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("MINUTES_TOKEN_PATH") {
        settings.token_path = PathBuf::from(v);
    }

    if let Some(v) = env("MINUTES_DEFAULT_TEMPLATE") {
        settings.default_template = v.into();
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = v
            .trim()
            .parse()
            .with_context(|| format!("APP__REQUEST_TIMEOUT_SECS must be whole seconds, got '{v}'"))?;
    }

    if let Some(v) = env("MINUTES_OUTPUT_DIR") {
        settings.output_dir = PathBuf::from(v);
    }

    settings.api_base_url = normalize_base_url(&settings.api_base_url)?;
    Ok(settings)
}

pub fn apply_overrides(
    settings: &mut Settings,
    api_base_url: Option<&str>,
    token_path: Option<&Path>,
) -> anyhow::Result<()> {
    if let Some(url) = api_base_url {
        settings.api_base_url = normalize_base_url(url)?;
    }
    if let Some(path) = token_path {
        settings.token_path = path.to_path_buf();
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
