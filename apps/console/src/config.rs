use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "console.toml";
const ENV_PREFIX: &str = "APP__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Where the admin frontend is served; `/api` and `/auth` hang off it.
    pub root_url: String,
    pub page_size: u32,
    /// Prefix of the public short links shown next to each code.
    pub short_link_base: String,
    /// Value of the `jwt` cookie issued by the auth gateway.
    pub session_token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_url: "http://localhost:8080".into(),
            page_size: client_core::DEFAULT_PAGE_SIZE,
            short_link_base: "https://dxe.io/".into(),
            session_token: None,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    root_url: Option<String>,
    page_size: Option<u32>,
    short_link_base: Option<String>,
    session_token: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Layers a TOML document over the current values. Absent keys keep
    /// their previous value.
    pub fn apply_file(&mut self, raw: &str) -> Result<()> {
        let file: FileSettings = toml::from_str(raw).context("invalid console configuration")?;
        if let Some(v) = file.root_url {
            self.root_url = v;
        }
        if let Some(v) = file.page_size {
            self.page_size = v;
        }
        if let Some(v) = file.short_link_base {
            self.short_link_base = v;
        }
        if let Some(v) = file.session_token {
            self.session_token = Some(v);
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        Ok(())
    }

    /// Layers `APP__*` variables, looked up through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| lookup(&format!("{ENV_PREFIX}{key}")).filter(|v| !v.is_empty());

        if let Some(v) = var("ROOT_URL") {
            self.root_url = v;
        }
        if let Some(v) = var("PAGE_SIZE") {
            self.page_size = v
                .parse()
                .with_context(|| format!("{ENV_PREFIX}PAGE_SIZE must be a number, got '{v}'"))?;
        }
        if let Some(v) = var("SHORT_LINK_BASE") {
            self.short_link_base = v;
        }
        if let Some(v) = var("SESSION_TOKEN") {
            self.session_token = Some(v);
        }
        if let Some(v) = var("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = v.parse().with_context(|| {
                format!("{ENV_PREFIX}REQUEST_TIMEOUT_SECS must be a number, got '{v}'")
            })?;
        }
        Ok(())
    }
}

/// Defaults, then the configuration file, then the environment. An explicitly
/// named file must exist; the default one is optional.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();

    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    match fs::read_to_string(&path) {
        Ok(raw) => settings
            .apply_file(&raw)
            .with_context(|| format!("failed to load '{}'", path.display()))?,
        Err(err) if explicit.is_some() => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()));
        }
        Err(_) => {}
    }

    settings.apply_env(|key| std::env::var(key).ok())?;
    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
