use std::{
    io,
    path::PathBuf,
    process::ExitStatus,
    sync::{Arc, OnceLock},
    time::Duration,
};

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Child,
    sync::broadcast,
    time::timeout,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};
use uuid::Uuid;

use crate::{
    config::{
        LogLevel, LogMeta, StreamSource,
        stream::{LaunchEvent, StreamLine},
    },
    parser::{self, GameSignal},
};

/// Forwards the child's stdout and stderr to the event bus, line by line.
/// The pumps end on their own when the pipes close.
pub(crate) fn spawn_output_pumps(
    child: &mut Child,
    attempt: Uuid,
    events_tx: &broadcast::Sender<LaunchEvent>,
    crash_report: &Arc<OnceLock<PathBuf>>,
) {
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(pump(
            stdout,
            StreamSource::Stdout,
            attempt,
            events_tx.clone(),
            crash_report.clone(),
        ));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(pump(
            stderr,
            StreamSource::Stderr,
            attempt,
            events_tx.clone(),
            crash_report.clone(),
        ));
    }
}

async fn pump<R>(
    reader: R,
    source: StreamSource,
    attempt: Uuid,
    events_tx: broadcast::Sender<LaunchEvent>,
    crash_report: Arc<OnceLock<PathBuf>>,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                mirror_to_tracing(&attempt, source, &line);

                if let Some(GameSignal::CrashReport(path)) = parser::parse_line(&line) {
                    warn!(%attempt, path = %path.display(), "game wrote a crash report");
                    let _ = crash_report.set(path);
                }

                // No subscribers is fine.
                let _ = events_tx.send(LaunchEvent::line(attempt, StreamLine::new(line, source)));
            }
            Ok(None) => break,
            Err(err) => {
                debug!(%attempt, ?source, %err, "output pump stopped");
                break;
            }
        }
    }
}

fn mirror_to_tracing(attempt: &Uuid, source: StreamSource, line: &str) {
    let level = match LogMeta::new(line) {
        Some(meta) => meta.level,
        None if source == StreamSource::Stderr => LogLevel::Warn,
        None => LogLevel::Other,
    };
    match level {
        LogLevel::Info => debug!(target: "minelaunch::game", %attempt, "{line}"),
        LogLevel::Warn => warn!(target: "minelaunch::game", %attempt, "{line}"),
        LogLevel::Error => error!(target: "minelaunch::game", %attempt, "{line}"),
        LogLevel::Other => trace!(target: "minelaunch::game", %attempt, "{line}"),
    }
}

/// Owns the child until it exits. Firing `terminate` asks the process to
/// shut down, escalating to a hard kill once `grace` has passed.
pub(crate) async fn wait_for_exit(
    mut child: Child,
    terminate: CancellationToken,
    grace: Duration,
) -> io::Result<ExitStatus> {
    tokio::select! {
        status = child.wait() => return status,
        () = terminate.cancelled() => {}
    }

    request_shutdown(&mut child);

    match timeout(grace, child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            warn!(pid = ?child.id(), ?grace, "game ignored shutdown request, killing");
            if let Err(err) = child.start_kill() {
                debug!(%err, "kill failed");
            }
            child.wait().await
        }
    }
}

#[cfg(unix)]
fn request_shutdown(child: &mut Child) {
    use nix::{
        sys::signal::{Signal, kill},
        unistd::Pid,
    };

    let Some(pid) = child.id().and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    if let Err(err) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
        debug!(pid, %err, "SIGTERM failed");
    }
}

#[cfg(not(unix))]
fn request_shutdown(child: &mut Child) {
    if let Err(err) = child.start_kill() {
        debug!(%err, "kill failed");
    }
}
