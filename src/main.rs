//! `minelaunchd`: serves the launch bridge as JSON lines over stdio.
//!
//! Each stdin line is a request `{"id": .., "command": "..", "args": {..}}`;
//! each stdout line is `{"id": .., "ok": ..}` or `{"id": .., "error": ..}`.
//! Logs go to stderr.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use minelaunch::{
    Bridge, BridgeError, ControllerSettings, LaunchController, LaunchErrorKind, SettingsError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::{
    io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::mpsc,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "minelaunchd", about = "Minecraft launch session host", version)]
struct Cli {
    /// Controller settings JSON file. Defaults apply when omitted.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Persist launch config updates to this file (overrides the settings).
    #[arg(long)]
    config_path: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Error)]
enum DaemonError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("failed to init tracing: {0}")]
    Tracing(String),

    #[error("stdio failure: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Value,
    command: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize)]
struct Response {
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    ok: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<BridgeError>,
}

impl Response {
    fn from_result(id: Value, result: Result<Value, BridgeError>) -> Self {
        match result {
            Ok(value) => Self {
                id,
                ok: Some(value),
                error: None,
            },
            Err(err) => Self {
                id,
                ok: None,
                error: Some(err),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), DaemonError> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    let mut settings = match &args.settings {
        Some(path) => ControllerSettings::load(path).await?,
        None => ControllerSettings::default(),
    };
    if args.config_path.is_some() {
        settings.config_path = args.config_path.clone();
    }

    let controller = LaunchController::new(settings);
    match controller.restore_config().await {
        Ok(Some(config)) => info!(version = %config.version, "restored launch config"),
        Ok(None) => {}
        Err(err) => warn!(%err, "could not restore launch config"),
    }

    let bridge = Bridge::new(controller.clone());
    info!("minelaunchd ready");
    serve(bridge).await?;

    if controller.status().is_active() {
        info!("stdin closed, stopping game");
        if let Err(err) = controller.stop().await {
            warn!(%err, "stop on shutdown failed");
        }
    }

    Ok(())
}

/// Requests run concurrently so a slow `launch_instance` or
/// `stop_instance` never holds up status polls.
async fn serve(bridge: Bridge) -> Result<(), DaemonError> {
    let (out_tx, mut out_rx) = mpsc::channel::<Response>(64);

    let writer = tokio::spawn(async move {
        let mut stdout = io::stdout();
        while let Some(response) = out_rx.recv().await {
            let mut line = match serde_json::to_vec(&response) {
                Ok(line) => line,
                Err(err) => {
                    warn!(%err, "dropping unencodable response");
                    continue;
                }
            };
            line.push(b'\n');
            stdout.write_all(&line).await?;
            stdout.flush().await?;
        }
        Ok::<(), std::io::Error>(())
    });

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let request: Request = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(err) => {
                let error = BridgeError {
                    kind: LaunchErrorKind::InvalidArguments,
                    message: format!("malformed request: {err}"),
                };
                let _ = out_tx.send(Response::from_result(Value::Null, Err(error))).await;
                continue;
            }
        };

        let bridge = bridge.clone();
        let out_tx = out_tx.clone();
        tokio::spawn(async move {
            let result = bridge.invoke(&request.command, request.args).await;
            let _ = out_tx.send(Response::from_result(request.id, result)).await;
        });
    }

    drop(out_tx);
    match writer.await {
        Ok(res) => res?,
        Err(err) => warn!(%err, "response writer panicked"),
    }
    Ok(())
}

fn init_tracing(log_format: LogFormat) -> Result<(), DaemonError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| DaemonError::Tracing(err.to_string()))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| DaemonError::Tracing(err.to_string()))?,
    }

    Ok(())
}
