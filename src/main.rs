use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use yeetpost::config::Config;
use yeetpost::{PostError, PostOutcome, PostRequest, YeetpostClient};

const EXIT_SUCCESS: u8 = 0;
const EXIT_FAILURE: u8 = 1;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_tracing() {
        eprintln!("==> [yeetpost] failed with: {:#}", e);
        return ExitCode::from(EXIT_FAILURE);
    }

    let config = match Config::try_parse() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err.render());
            return ExitCode::from(parse_error_exit_code(err.kind()));
        }
    };

    let request = match prepare(&config, config.api_key()) {
        Ok(request) => request,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    match run(&config, &request).await {
        Ok(outcome) => {
            info!("Posted: {}", outcome);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(err) => {
            eprintln!("{}", failure_message(&err));
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Справка и версия не считаются ошибкой
fn parse_error_exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => EXIT_SUCCESS,
        _ => EXIT_FAILURE,
    }
}

/// Собирает запрос из аргументов или возвращает строку для stderr
fn prepare(config: &Config, api_key: Option<String>) -> Result<PostRequest, String> {
    let Some((connection, text)) = config.target() else {
        return Err("==> [yeetpost] connection and text are required".to_string());
    };

    let Some(api_key) = api_key else {
        return Err("==> [yeetpost] missing yeetpost API key".to_string());
    };

    Ok(PostRequest::new(connection, text).api_key(api_key))
}

fn failure_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<PostError>() {
        Some(PostError::RemoteRejection(response)) => {
            format!("==> [yeetpost] failed to post: {}", response)
        }
        _ => format!("==> [yeetpost] failed to post: {:#}", err),
    }
}

async fn run(config: &Config, request: &PostRequest) -> anyhow::Result<PostOutcome> {
    let mut builder = YeetpostClient::builder().base_url(&config.base_url);
    if let Some(timeout) = config.timeout() {
        builder = builder.timeout(timeout);
    }
    let client = builder.build().context("failed to create HTTP client")?;

    debug!("Posting via {}", client.endpoint(request.connection()));

    // Без suppress_errors None не возвращается
    let outcome = client
        .post(request)
        .await?
        .context("API returned no result")?;
    Ok(outcome)
}

/// Инициализирует систему логирования с использованием tracing
fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))?;

    debug!("Tracing initialized");
    Ok(())
}
