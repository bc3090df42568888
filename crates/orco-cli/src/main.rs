// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use orco_app::{
    AppState, ErrorState, FETCH_ERROR_MESSAGE, FetchLifecycle, FetchPhase, Fetcher, Resource,
};
use orco_client::Client;
use orco_tui::DataSource;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `orco-browser --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let client = Client::new(config.base_url()?, config.timeout()?).with_context(|| {
        format!(
            "invalid [server] config in {}; fix origin/base_url/timeout values",
            options.config_path.display()
        )
    })?;
    if options.check_only {
        return Ok(());
    }

    let log_path = config.log_path()?;
    logging::init(&log_path)?;
    tracing::info!(base_url = %client.base_url(), "starting");

    let errors = ErrorState::new();
    if let Some(resource) = options.dump {
        let text = dump_resource(&client, &errors, resource, &log_path)?;
        print!("{text}");
        return Ok(());
    }

    let mut state = AppState {
        active_tab: config.default_tab(),
        ..AppState::default()
    };
    let source = DataSource::new(Arc::new(client), errors);
    orco_tui::run_app(&mut state, &source)
}

/// Loads one resource through the same lifecycle a TUI view uses and renders
/// it as aligned text.
fn dump_resource(
    fetcher: &dyn Fetcher,
    errors: &ErrorState,
    resource: Resource,
    log_path: &Path,
) -> Result<String> {
    let path = resource.path();
    let mut view = FetchLifecycle::new(resource, 1);
    match view.load(fetcher, errors) {
        FetchPhase::Ready(table) => Ok(table.render_text()),
        _ => {
            let message = errors
                .message()
                .unwrap_or_else(|| FETCH_ERROR_MESSAGE.to_owned());
            bail!("{message}: {path}; details in {}", log_path.display())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    dump: Option<Resource>,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        dump: None,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--dump" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow!("--dump requires a resource, e.g. builders or jobs/<name>")
                })?;
                options.dump = Some(Resource::parse(value.as_ref())?);
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("orco-browser");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config and server address");
    println!("  --dump <resource>        Print one resource as a table and exit");
    println!("                           (builders, collections, jobs/<name>,");
    println!("                            entries/<name>, executors, reports)");
    println!("  --help                   Show this help");
}
