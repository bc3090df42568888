// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use orco_app::{Fetcher, Record, Resource, batch_from_value};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Origin of the frontend dev server; requests from it go to the backend directly.
pub const DEV_ORIGIN: &str = "http://localhost:3000";
pub const DEV_ENDPOINT: &str = "http://localhost:8550/";
pub const REST_PREFIX: &str = "rest/";

/// Resolves the REST base address for a dashboard served from `origin`.
pub fn resolve_base_url(origin: &str) -> Result<Url> {
    let origin = origin.trim();
    if origin.is_empty() {
        bail!("server origin must not be empty");
    }
    if origin.starts_with(DEV_ORIGIN) {
        return Url::parse(DEV_ENDPOINT).context("parse development endpoint");
    }
    let origin = Url::parse(origin).with_context(|| format!("parse server origin {origin:?}"))?;
    if origin.cannot_be_a_base() {
        bail!("server origin {origin} cannot carry a path; use an http(s) URL");
    }
    origin
        .join(&format!("/{REST_PREFIX}"))
        .with_context(|| format!("derive REST base from {origin}"))
}

/// Parses an explicit base URL, making sure it ends in `/` so resource paths
/// append instead of replacing the last segment.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let normalized = if raw.ends_with('/') {
        raw.to_owned()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&normalized).with_context(|| format!("parse base URL {raw:?}"))?;
    if url.cannot_be_a_base() {
        bail!("base URL {raw:?} cannot carry a path; use an http(s) URL");
    }
    Ok(url)
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: Url, timeout: Option<Duration>) -> Result<Self> {
        match base_url.scheme() {
            "http" | "https" => {}
            other => bail!("unsupported scheme {other:?} in {base_url}; use http or https"),
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn resource_url(&self, resource: &Resource) -> Result<Url> {
        self.base_url
            .join(&resource.path())
            .with_context(|| format!("build URL for {}", resource.path()))
    }

    pub fn get_json(&self, resource: &Resource) -> Result<Value> {
        let url = self.resource_url(resource)?;
        tracing::debug!(%url, "GET");
        let response = self
            .http
            .get(url.clone())
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .map_err(|error| connection_error(&url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let body = response
            .text()
            .with_context(|| format!("read response body from {url}"))?;
        serde_json::from_str(&body).with_context(|| format!("decode JSON from {url}"))
    }
}

impl Fetcher for Client {
    fn fetch(&self, resource: &Resource) -> Result<Vec<Record>> {
        let value = self.get_json(resource)?;
        batch_from_value(value).with_context(|| format!("decode {} response", resource.path()))
    }
}

fn connection_error(url: &Url, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- is the orco server running? ({})",
        url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body)
        && let Some(Value::String(message)) = fields.get("message")
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains('<') {
        return anyhow!("server error ({}): {}", status.as_u16(), trimmed);
    }

    anyhow!("server returned {}", status.as_u16())
}
