// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use orco_app::TabKind;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const APP_NAME: &str = "orco-browser";
pub const CONFIG_PATH_ENV: &str = "ORCO_CONFIG_PATH";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_ORIGIN: &str = "http://localhost:8550";
const LOG_FILE_NAME: &str = "orco-browser.log";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            server: Server::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub origin: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            origin: Some(DEFAULT_ORIGIN.to_owned()),
            base_url: None,
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub default_view: Option<String>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            default_view: Some(TabKind::Builders.label().to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub file: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [server], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(origin) = &self.server.origin {
            orco_client::resolve_base_url(origin)
                .with_context(|| format!("server.origin in {} is invalid", path.display()))?;
        }

        if let Some(base_url) = &self.server.base_url {
            orco_client::parse_base_url(base_url)
                .with_context(|| format!("server.base_url in {} is invalid", path.display()))?;
        }

        if let Some(timeout) = &self.server.timeout {
            let parsed = parse_duration(timeout)
                .with_context(|| format!("server.timeout in {} is invalid", path.display()))?;
            if parsed <= Duration::ZERO {
                bail!(
                    "server.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(view) = &self.ui.default_view
            && TabKind::parse(view).is_none()
        {
            bail!(
                "ui.default_view in {} must be one of {}, got {:?}",
                path.display(),
                tab_labels(),
                view
            );
        }

        if let Some(file) = &self.log.file
            && file.trim().is_empty()
        {
            bail!("log.file in {} must not be empty", path.display());
        }

        Ok(())
    }

    /// An explicit `base_url` wins over the origin-derived address.
    pub fn base_url(&self) -> Result<Url> {
        if let Some(base_url) = &self.server.base_url {
            return orco_client::parse_base_url(base_url);
        }
        orco_client::resolve_base_url(self.server.origin.as_deref().unwrap_or(DEFAULT_ORIGIN))
    }

    pub fn timeout(&self) -> Result<Option<Duration>> {
        self.server
            .timeout
            .as_deref()
            .map(parse_duration)
            .transpose()
    }

    pub fn default_tab(&self) -> TabKind {
        self.ui
            .default_view
            .as_deref()
            .and_then(TabKind::parse)
            .unwrap_or(TabKind::Builders)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }

        let data_root = dirs::data_local_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].file to a writable log path")
        })?;
        Ok(data_root.join(APP_NAME).join(LOG_FILE_NAME))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# orco-browser config\n# Place this file at: {}\n\nversion = 1\n\n[server]\n# Address the dashboard was served from; requests go to <origin>/rest/\norigin = \"{}\"\n# Optional. Overrides the origin-derived REST address\n# base_url = \"http://localhost:8550/rest\"\n# Optional. No timeout when unset\n# timeout = \"5s\"\n\n[ui]\n# One of: {}\ndefault_view = \"{}\"\n\n[log]\n# Optional. Default is the platform data dir (for example ~/.local/share/{}/{})\n# file = \"/absolute/path/to/{}\"\n",
            path.display(),
            DEFAULT_ORIGIN,
            tab_labels(),
            TabKind::Builders.label(),
            APP_NAME,
            LOG_FILE_NAME,
            LOG_FILE_NAME,
        )
    }
}

fn tab_labels() -> String {
    TabKind::ALL
        .iter()
        .map(|tab| tab.label())
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("timeout duration {raw:?} is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}
