// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use orco_app::{Record, parse_batch};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tiny_http::{Header, Response, Server};

pub const BUILD_X_JOBS: &str = r#"[
  {"state": "f", "size": 2048, "comp_time": 1.2, "config": {"threads": 4}},
  {"state": "e", "size": 0, "comp_time": 0.1, "config": {"threads": 8}}
]"#;

pub const BUILDERS: &str = r#"[
  {"name": "buildX", "n_finished": 12, "n_in_progress": 1, "n_failed": 2, "size": 1048576},
  {"name": "render", "n_finished": 0, "n_in_progress": 0, "n_failed": 0, "size": 0}
]"#;

pub const COLLECTIONS: &str = r#"[
  {"name": "datasets", "count": 3, "size": 4096}
]"#;

pub const EXECUTORS: &str = r#"[
  {"id": 1, "status": "running", "type": "local", "version": "0.4",
   "resources": "cpus=8", "stats": {"n_tasks": 10, "n_completed": 4}},
  {"id": 2, "status": "stopped", "type": "local", "version": "0.4",
   "resources": "cpus=2", "stats": {"n_tasks": 0, "n_completed": 0}}
]"#;

pub const REPORTS: &str = r#"[
  {"timestamp": 1700000000, "type": "info", "message": "executor started",
   "executor": 1, "collection": null, "config": null},
  {"timestamp": 1700000060, "type": "error", "message": "job crashed",
   "executor": 1, "collection": "buildX", "config": {"threads": 8}}
]"#;

/// A mixed batch where one config is an object and the rest are not.
pub const MIXED_CONFIG_JOBS: &str = r#"[
  {"key": "k1", "state": "f", "config": {"a": 1}},
  {"key": "k2", "state": "r", "config": "raw"},
  {"key": "k3", "state": "F", "config": 3}
]"#;

pub fn records(body: &str) -> Result<Vec<Record>> {
    parse_batch(body)
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub content_type: &'static str,
}

impl MockResponse {
    pub fn json(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_owned(),
            content_type: "application/json",
        }
    }

    pub fn html(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_owned(),
            content_type: "text/html",
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_owned(),
            content_type: "application/json",
        }
    }
}

/// A local HTTP server answering fixed paths until dropped. Unknown paths get
/// a 404.
pub struct MockServer {
    server: Arc<Server>,
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    handle: Option<JoinHandle<()>>,
}

impl MockServer {
    /// Serves `routes` (path without leading slash, relative to `/rest/`).
    pub fn start(routes: Vec<(&str, MockResponse)>) -> Result<Self> {
        let server = Server::http("127.0.0.1:0")
            .map_err(|error| anyhow!("start mock server: {error}"))?;
        let server = Arc::new(server);
        let base_url = format!("http://{}/rest/", server.server_addr());
        let routes: BTreeMap<String, MockResponse> = routes
            .into_iter()
            .map(|(path, response)| (format!("/rest/{path}"), response))
            .collect();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let worker = Arc::clone(&server);
        let seen = Arc::clone(&requests);
        let handle = thread::spawn(move || {
            while let Ok(request) = worker.recv() {
                let url = request.url().to_owned();
                if let Ok(mut seen) = seen.lock() {
                    seen.push(url.clone());
                }
                let reply = routes
                    .get(&url)
                    .cloned()
                    .unwrap_or_else(|| MockResponse::status(404, r#"{"message": "not found"}"#));
                let mut response =
                    Response::from_string(reply.body).with_status_code(reply.status);
                if let Ok(header) = Header::from_bytes("Content-Type", reply.content_type) {
                    response = response.with_header(header);
                }
                let _ = request.respond(response);
            }
        });

        Ok(Self {
            server,
            base_url,
            requests,
            handle: Some(handle),
        })
    }

    /// Base URL ending in `/rest/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Origin without the REST prefix, as a user would configure it.
    pub fn origin(&self) -> String {
        format!("http://{}", self.server.server_addr())
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// An address nothing listens on.
pub fn unreachable_base_url() -> &'static str {
    "http://127.0.0.1:1/rest/"
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("config.toml");
    Ok((dir, path))
}

pub fn write_temp_config(contents: &str) -> Result<(tempfile::TempDir, PathBuf)> {
    let (dir, path) = temp_config_path()?;
    std::fs::write(&path, contents)
        .with_context(|| format!("write config fixture {}", path.display()))?;
    Ok((dir, path))
}

#[cfg(test)]
mod tests {
    use super::{BUILD_X_JOBS, BUILDERS, EXECUTORS, MIXED_CONFIG_JOBS, REPORTS, records};
    use anyhow::Result;

    #[test]
    fn fixtures_decode() -> Result<()> {
        assert_eq!(records(BUILD_X_JOBS)?.len(), 2);
        assert_eq!(records(BUILDERS)?.len(), 2);
        assert_eq!(records(EXECUTORS)?.len(), 2);
        assert_eq!(records(REPORTS)?.len(), 2);
        assert_eq!(records(MIXED_CONFIG_JOBS)?.len(), 3);
        Ok(())
    }
}
