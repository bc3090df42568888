// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_FILTER_ENV: &str = "ORCO_LOG";
const DEFAULT_LOG_FILTER: &str = "info";

/// Sends `tracing` output to `path`; the terminal belongs to the TUI.
pub fn init(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;

    let filter = log_filter(env::var(LOG_FILTER_ENV).ok().as_deref())?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;

    tracing::info!(log = %path.display(), "logging started");
    Ok(())
}

fn log_filter(raw: Option<&str>) -> Result<EnvFilter> {
    let directives = raw
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .unwrap_or(DEFAULT_LOG_FILTER);
    EnvFilter::try_new(directives)
        .with_context(|| format!("invalid {LOG_FILTER_ENV} filter {directives:?}"))
}
