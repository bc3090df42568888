// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use orco_app::{
    Cell, ErrorState, FETCH_ERROR_MESSAGE, FetchLifecycle, FetchPhase, Fetcher, Resource,
};
use orco_client::{Client, parse_base_url, resolve_base_url};
use orco_testkit::{
    BUILD_X_JOBS, BUILDERS, EXECUTORS, MockResponse, MockServer, REPORTS, unreachable_base_url,
};
use std::sync::{Arc, mpsc};
use std::time::Duration;

fn client_for(server: &MockServer) -> Result<Client> {
    Client::new(parse_base_url(server.base_url())?, Some(Duration::from_secs(5)))
}

#[test]
fn build_x_jobs_render_end_to_end() -> Result<()> {
    let server = MockServer::start(vec![("jobs/buildX", MockResponse::json(BUILD_X_JOBS))])?;
    let client = client_for(&server)?;
    let errors = ErrorState::new();
    let mut lifecycle = FetchLifecycle::new(Resource::Jobs("buildX".to_owned()), 1);

    lifecycle.load(&client, &errors);
    let table = lifecycle.table().expect("jobs should load");
    assert!(errors.is_ok());

    let config: Vec<_> = table
        .schema()
        .config_columns()
        .map(|column| column.header.as_str())
        .collect();
    assert_eq!(config, vec!["threads"]);

    let schema = table.schema();
    let position = |id: &str| {
        schema
            .columns()
            .iter()
            .position(|column| column.id == id)
            .expect("column present")
    };
    let (state, size, comptime) = (position("state"), position("size"), position("comptime"));

    let rows = table.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].cells[0], Cell::Text("4".to_owned()));
    assert_eq!(rows[1].cells[0], Cell::Text("8".to_owned()));
    assert_eq!(rows[0].cells[state].state().map(|s| s.label), Some("finished"));
    assert_eq!(rows[1].cells[state].state().map(|s| s.label), Some("errored"));
    assert_eq!(rows[0].cells[size].display(), "2.00 KiB");
    assert_eq!(rows[1].cells[size].display(), "0 B");
    assert_eq!(rows[0].cells[comptime].display(), "1.2s");
    assert_eq!(rows[1].cells[comptime].display(), "100ms");

    assert_eq!(server.requests(), vec!["/rest/jobs/buildX".to_owned()]);
    Ok(())
}

#[test]
fn origin_resolution_reaches_rest_prefix() -> Result<()> {
    let server = MockServer::start(vec![("builders", MockResponse::json(BUILDERS))])?;
    let client = Client::new(resolve_base_url(&server.origin())?, None)?;

    let records = client.fetch(&Resource::Builders)?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].text("name").as_deref(), Some("buildX"));
    Ok(())
}

#[test]
fn executors_and_reports_use_their_templates() -> Result<()> {
    let server = MockServer::start(vec![
        ("executors", MockResponse::json(EXECUTORS)),
        ("reports", MockResponse::json(REPORTS)),
    ])?;
    let client = client_for(&server)?;
    let errors = ErrorState::new();

    let mut executors = FetchLifecycle::new(Resource::Executors, 1);
    executors.load(&client, &errors);
    let text = executors.table().expect("executors load").render_text();
    assert!(text.contains("4/10"));
    assert!(text.contains("running"));

    let mut reports = FetchLifecycle::new(Resource::Reports, 2);
    reports.load(&client, &errors);
    let table = reports.table().expect("reports load");
    assert_eq!(table.schema().config_columns().count(), 0);
    let text = table.render_text();
    assert!(text.contains("2023-11-14 22:13:20"));
    assert!(text.contains("{\"threads\":8}"));
    Ok(())
}

#[test]
fn server_error_sets_generic_message() -> Result<()> {
    let server = MockServer::start(vec![(
        "builders",
        MockResponse::status(500, r#"{"message": "database locked"}"#),
    )])?;
    let client = client_for(&server)?;

    let error = client
        .fetch(&Resource::Builders)
        .expect_err("500 should fail");
    assert!(error.to_string().contains("database locked"));

    let errors = ErrorState::new();
    let mut lifecycle = FetchLifecycle::new(Resource::Builders, 1);
    assert_eq!(lifecycle.load(&client, &errors), &FetchPhase::Failed);
    assert_eq!(errors.message().as_deref(), Some(FETCH_ERROR_MESSAGE));
    Ok(())
}

#[test]
fn non_json_body_is_a_fetch_failure() -> Result<()> {
    let server = MockServer::start(vec![(
        "collections",
        MockResponse::html("<!doctype html><p>proxy login</p>"),
    )])?;
    let client = client_for(&server)?;

    let error = client
        .fetch(&Resource::Collections)
        .expect_err("html should not decode");
    assert!(format!("{error:#}").contains("decode JSON"));

    let errors = ErrorState::new();
    let mut lifecycle = FetchLifecycle::new(Resource::Collections, 1);
    lifecycle.load(&client, &errors);
    assert!(lifecycle.is_loading());
    assert!(errors.has_error());
    Ok(())
}

#[test]
fn json_object_body_is_rejected() -> Result<()> {
    let server = MockServer::start(vec![("builders", MockResponse::json(r#"{"a": 1}"#))])?;
    let client = client_for(&server)?;

    let error = client
        .fetch(&Resource::Builders)
        .expect_err("object is not a batch");
    assert!(format!("{error:#}").contains("expected a JSON array"));
    Ok(())
}

#[test]
fn unreachable_server_mentions_remediation() -> Result<()> {
    let client = Client::new(
        parse_base_url(unreachable_base_url())?,
        Some(Duration::from_millis(200)),
    )?;

    let error = client
        .fetch(&Resource::Builders)
        .expect_err("nothing listens on port 1");
    assert!(error.to_string().contains("is the orco server running?"));
    Ok(())
}

#[test]
fn first_failure_suppresses_later_views() -> Result<()> {
    let server = MockServer::start(vec![("executors", MockResponse::json(EXECUTORS))])?;
    let client = client_for(&server)?;
    let errors = ErrorState::new();

    let mut missing = FetchLifecycle::new(Resource::Jobs("nope".to_owned()), 1);
    assert_eq!(missing.load(&client, &errors), &FetchPhase::Failed);

    let mut executors = FetchLifecycle::new(Resource::Executors, 2);
    assert_eq!(executors.load(&client, &errors), &FetchPhase::Idle);
    assert_eq!(server.requests(), vec!["/rest/jobs/nope".to_owned()]);
    Ok(())
}

#[test]
fn background_fetch_resolves_through_channel() -> Result<()> {
    let server = MockServer::start(vec![("jobs/buildX", MockResponse::json(BUILD_X_JOBS))])?;
    let client: Arc<dyn Fetcher> = Arc::new(client_for(&server)?);
    let errors = ErrorState::new();
    let (tx, rx) = mpsc::channel();

    let mut lifecycle = FetchLifecycle::new(Resource::Jobs("buildX".to_owned()), 4);
    assert!(lifecycle.spawn(client, &errors, tx));
    let resolution = rx.recv_timeout(Duration::from_secs(5))?;
    assert!(lifecycle.accept(resolution, &errors));
    assert_eq!(lifecycle.table().map(|table| table.row_count()), Some(2));
    Ok(())
}
