//! Cloud SQL restore resource
//!
//! Implements the check / in / out resource protocol for restoring a
//! Cloud SQL instance from one of its backup runs.

// cloudsql-restore-resource/src/main.rs
mod check;
mod config;
mod errors;
mod fetch;
mod model;
mod operations;
mod restore;
mod sqladmin;
mod utils;

use anyhow::{Context, Result};
use config::{AppConfig, OperationConfig, load_check_config, load_in_config, load_out_config};
use fetch::poller::TokioDelay;
use sqladmin::SqlAdminClient;
use std::env;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Check,
    In,
    Out,
}

impl Verb {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "check" => Some(Verb::Check),
            "in" => Some(Verb::In),
            "out" => Some(Verb::Out),
            _ => None,
        }
    }
}

/// Main entry point; one verb per process invocation.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    utils::logging::init();
    match run_app().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let (verb, dir) = resolve_invocation(&args)?;

    let mut request = String::new();
    std::io::stdin()
        .read_to_string(&mut request)
        .context("Failed to read request from stdin")?;
    let mut app_config = AppConfig::load_from_json(&request)?;

    // Credentials are validated here, before any API call.
    let client = SqlAdminClient::from_source(&app_config.source).context("Failed to load source.private_key")?;

    match verb {
        Verb::Check => {
            let check_config = load_check_config(&app_config.raw_request)?;
            app_config.operation = Some(OperationConfig::Check(check_config));
            let versions = check::run_check_flow(&app_config, &client).await.context("Check failed")?;
            utils::output::emit(&versions)
        }
        Verb::In => {
            let in_config = load_in_config(&app_config.raw_request, dir.as_deref())?;
            app_config.operation = Some(OperationConfig::In(in_config));
            let output = fetch::run_in_flow(&app_config, &client, &TokioDelay)
                .await
                .context("In failed")?;
            utils::output::emit(&output)
        }
        Verb::Out => {
            let out_config = load_out_config(&app_config.raw_request, &app_config.source.target, dir.as_deref())?;
            app_config.operation = Some(OperationConfig::Out(out_config));
            let output = restore::run_out_flow(&app_config, &client).await.context("Out failed")?;
            utils::output::emit(&output)
        }
    }
}

/// The verb comes from the executable name (`/opt/resource/in`) or, failing
/// that, the first argument. The argument after it is the build directory.
fn resolve_invocation(args: &[String]) -> Result<(Verb, Option<PathBuf>)> {
    let program = args
        .first()
        .and_then(|arg| Path::new(arg).file_name())
        .and_then(|name| name.to_str())
        .and_then(Verb::parse);

    let (verb, rest) = match program {
        Some(verb) => (verb, args.get(1..).unwrap_or_default()),
        None => {
            let name = args
                .get(1)
                .context("Usage: cloudsql-restore-resource <check|in|out> [directory]")?;
            let verb = Verb::parse(name.trim())
                .with_context(|| format!("Invalid verb '{}'. Expected 'check', 'in', or 'out'.", name))?;
            (verb, args.get(2..).unwrap_or_default())
        }
    };

    Ok((verb, rest.first().map(PathBuf::from)))
}
