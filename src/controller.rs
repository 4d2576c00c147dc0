//! The launch session controller.
//!
//! One controller owns at most one game process. Every status change is
//! made while holding `Shared::inner` and published through a watch
//! channel, so `status()` is a plain read that never waits on the lock.

use std::{process::Stdio, sync::Arc};

use chrono::Utc;
use tokio::{
    process::Child,
    sync::{Mutex, broadcast, watch},
    time::timeout,
};
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::{
    config::{ConfigStore, ControllerSettings, LaunchConfig, stream::LaunchEvent},
    error::LaunchError,
    instance::{
        self, AttemptSummary, ExitOutcome, JavaLauncher, LaunchAttempt, LaunchHandle,
        LaunchStatus, Launcher,
    },
};

const EVENT_CAPACITY: usize = 2048;

#[derive(Debug, Clone)]
pub struct LaunchController {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    settings: ControllerSettings,
    launcher: Arc<dyn Launcher>,
    store: Option<ConfigStore>,
    status_tx: watch::Sender<LaunchStatus>,
    events_tx: broadcast::Sender<LaunchEvent>,
    inner: Mutex<ControllerInner>,
}

#[derive(Debug, Default)]
struct ControllerInner {
    /// Config the last successful launch used.
    launched: Option<LaunchConfig>,
    /// Config accepted by the last `launch` or `update_config`.
    stored: Option<LaunchConfig>,
    pending: Option<PendingLaunch>,
    attempt: Option<LaunchAttempt>,
    last_error: Option<String>,
}

/// A launch between acceptance and spawn.
#[derive(Debug)]
struct PendingLaunch {
    id: Uuid,
    cancel: CancellationToken,
    settled: CancellationToken,
}

impl LaunchController {
    pub fn new(settings: ControllerSettings) -> Self {
        Self::with_launcher(settings, Arc::new(JavaLauncher))
    }

    pub fn with_launcher(settings: ControllerSettings, launcher: Arc<dyn Launcher>) -> Self {
        let store = settings.config_path.clone().map(ConfigStore::new);
        let (status_tx, _) = watch::channel(LaunchStatus::Idle);

        Self {
            shared: Arc::new(Shared {
                settings,
                launcher,
                store,
                status_tx,
                events_tx: broadcast::Sender::new(EVENT_CAPACITY),
                inner: Mutex::new(ControllerInner::default()),
            }),
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.shared.settings
    }

    pub fn status(&self) -> LaunchStatus {
        *self.shared.status_tx.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<LaunchStatus> {
        self.shared.status_tx.subscribe()
    }

    pub fn subscribe(&self) -> BroadcastStream<LaunchEvent> {
        BroadcastStream::new(self.shared.events_tx.subscribe())
    }

    /// `None` until a launch has reached `Running`.
    pub async fn current_config(&self) -> Option<LaunchConfig> {
        self.shared.inner.lock().await.launched.clone()
    }

    pub async fn stored_config(&self) -> LaunchConfig {
        self.shared
            .inner
            .lock()
            .await
            .stored
            .clone()
            .unwrap_or_default()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.shared.inner.lock().await.last_error.clone()
    }

    pub async fn last_attempt(&self) -> Option<AttemptSummary> {
        self.shared
            .inner
            .lock()
            .await
            .attempt
            .as_ref()
            .map(LaunchAttempt::summary)
    }

    /// Loads the persisted config, if a store is configured and holds a
    /// valid one.
    pub async fn restore_config(&self) -> Result<Option<LaunchConfig>, LaunchError> {
        let Some(store) = &self.shared.store else {
            return Ok(None);
        };

        let loaded = store
            .load()
            .await
            .map_err(|e| LaunchError::Persistence(e.to_string()))?;
        let Some(config) = loaded else {
            return Ok(None);
        };

        if let Err(err) = config.validate(&self.shared.settings.memory) {
            warn!(path = %store.path().display(), %err, "ignoring stored launch config");
            return Ok(None);
        }

        let mut inner = self.shared.inner.lock().await;
        inner.stored = Some(config.clone());
        Ok(Some(config))
    }

    /// Validates and stores `config` for later launches.
    pub async fn update_config(&self, config: LaunchConfig) -> Result<(), LaunchError> {
        config.validate(&self.shared.settings.memory)?;

        if let Some(store) = &self.shared.store {
            store
                .save(&config)
                .await
                .map_err(|e| LaunchError::Persistence(e.to_string()))?;
        }

        let mut inner = self.shared.inner.lock().await;
        inner.stored = Some(config);
        info!("launch config updated");
        Ok(())
    }

    pub async fn launch(&self, config: LaunchConfig) -> Result<LaunchHandle, LaunchError> {
        let (id, cancel) = {
            let mut inner = self.shared.inner.lock().await;
            let status = self.status();
            if status.is_active() {
                return Err(LaunchError::AlreadyRunning);
            }
            config.validate(&self.shared.settings.memory)?;

            let pending = PendingLaunch {
                id: Uuid::new_v4(),
                cancel: CancellationToken::new(),
                settled: CancellationToken::new(),
            };
            let (id, cancel) = (pending.id, pending.cancel.clone());

            inner.stored = Some(config.clone());
            inner.attempt = None;
            inner.last_error = None;
            inner.pending = Some(pending);
            self.shared.transition(&mut inner, Some(id), LaunchStatus::Launching);
            (id, cancel)
        };

        // Runs detached so a caller dropping this future cannot strand the
        // controller in `Launching`.
        let span = info_span!("launch", attempt = %id, version = %config.version);
        let this = self.clone();
        let task = tokio::spawn(
            async move { this.run_launch(id, cancel, config).await }.instrument(span),
        );

        match task.await {
            Ok(result) => result,
            Err(err) => {
                let detail = format!("launch task failed: {err}");
                Err(self.fail_launch(id, LaunchError::SpawnFailed(detail)).await)
            }
        }
    }

    async fn run_launch(
        &self,
        id: Uuid,
        cancel: CancellationToken,
        config: LaunchConfig,
    ) -> Result<LaunchHandle, LaunchError> {
        let prepared = tokio::select! {
            () = cancel.cancelled() => None,
            res = self.shared.launcher.prepare(&config) => Some(res),
        };

        let spawned = match prepared {
            None => None,
            Some(Err(err)) => {
                let detail = format!("cannot prepare game directory {}: {err}", config.game_dir);
                return Err(self.fail_launch(id, LaunchError::SpawnFailed(detail)).await);
            }
            Some(Ok(())) => {
                let mut command = self.shared.launcher.command(&config);
                command
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .kill_on_drop(true);

                match command.spawn() {
                    Ok(child) => Some(child),
                    Err(err) => {
                        let detail = format!("{}: {err}", config.java_path);
                        return Err(self.fail_launch(id, LaunchError::SpawnFailed(detail)).await);
                    }
                }
            }
        };

        let mut inner = self.shared.inner.lock().await;
        let Some(pending) = inner.pending.take_if(|p| p.id == id) else {
            // A timed out stop already settled this launch.
            if let Some(child) = spawned {
                reap_in_background(child);
            }
            return Err(LaunchError::Cancelled);
        };

        let mut child = match spawned {
            Some(child) if !pending.cancel.is_cancelled() => child,
            spawned => {
                if let Some(child) = spawned {
                    reap_in_background(child);
                }
                info!("launch cancelled before the game started");
                self.shared.transition(&mut inner, Some(id), LaunchStatus::Stopped);
                pending.settled.cancel();
                return Err(LaunchError::Cancelled);
            }
        };

        let early_exit = match child.try_wait() {
            Ok(None) => None,
            Ok(Some(status)) => Some(LaunchError::SpawnFailed(format!(
                "process {} right after start",
                ExitOutcome::from(status)
            ))),
            Err(err) => Some(LaunchError::ProcessWatchFailure(err.to_string())),
        };
        if let Some(err) = early_exit {
            warn!(%err, "game did not stay up");
            inner.last_error = Some(err.to_string());
            self.shared.transition(&mut inner, Some(id), LaunchStatus::Crashed);
            pending.settled.cancel();
            return Err(err);
        }

        let attempt = LaunchAttempt::new(id, child.id());
        instance::spawn_output_pumps(
            &mut child,
            id,
            &self.shared.events_tx,
            &attempt.crash_report,
        );
        self.spawn_monitor(id, child, attempt.terminate.clone());

        let handle = attempt.handle();
        info!(pid = ?handle.pid, java = %config.java_path, memory_mb = config.memory_mb, "game started");

        inner.attempt = Some(attempt);
        inner.launched = Some(config);
        self.shared.transition(&mut inner, Some(id), LaunchStatus::Running);
        pending.settled.cancel();

        Ok(handle)
    }

    async fn fail_launch(&self, id: Uuid, err: LaunchError) -> LaunchError {
        let mut inner = self.shared.inner.lock().await;
        let Some(pending) = inner.pending.take_if(|p| p.id == id) else {
            return LaunchError::Cancelled;
        };

        if pending.cancel.is_cancelled() {
            debug!(%err, "launch failed after it was cancelled");
            self.shared.transition(&mut inner, Some(id), LaunchStatus::Stopped);
            pending.settled.cancel();
            return LaunchError::Cancelled;
        }

        warn!(%err, "launch failed");
        inner.last_error = Some(err.to_string());
        self.shared.transition(&mut inner, Some(id), LaunchStatus::Crashed);
        pending.settled.cancel();
        err
    }

    fn spawn_monitor(&self, id: Uuid, child: Child, terminate: CancellationToken) {
        let shared = self.shared.clone();
        let grace = shared.settings.kill_grace();
        tokio::spawn(async move {
            let result = instance::wait_for_exit(child, terminate, grace)
                .await
                .map(ExitOutcome::from)
                .map_err(|e| e.to_string());
            shared.finish_attempt(id, result).await;
        });
    }

    pub async fn stop(&self) -> Result<(), LaunchError> {
        let stop_timeout = self.shared.settings.stop_timeout();

        let mut inner = self.shared.inner.lock().await;
        match self.status() {
            LaunchStatus::Launching => {
                let Some(pending) = inner.pending.as_ref() else {
                    return Err(LaunchError::NotRunning);
                };
                info!(attempt = %pending.id, "stop requested while launching, cancelling");
                pending.cancel.cancel();
                let id = pending.id;
                let settled = pending.settled.clone();
                drop(inner);

                if timeout(stop_timeout, settled.cancelled()).await.is_ok() {
                    return Ok(());
                }
                self.force_cancelled(id).await
            }
            LaunchStatus::Running => {
                let Some(attempt) = inner.attempt.as_mut() else {
                    return Err(LaunchError::NotRunning);
                };
                info!(attempt = %attempt.id, pid = ?attempt.pid, "stopping game");
                attempt.stop_requested = true;
                attempt.terminate.cancel();
                let id = attempt.id;
                let resolved = attempt.resolved.clone();
                drop(inner);

                if timeout(stop_timeout, resolved.cancelled()).await.is_ok() {
                    return Ok(());
                }
                self.force_stopped(id).await
            }
            _ => Err(LaunchError::NotRunning),
        }
    }

    async fn force_stopped(&self, id: Uuid) -> Result<(), LaunchError> {
        let mut inner = self.shared.inner.lock().await;
        let Some(attempt) = inner.attempt.as_mut().filter(|a| a.id == id) else {
            return Ok(());
        };
        if attempt.is_resolved() {
            return Ok(());
        }

        attempt.ended_at = Some(Utc::now());
        let resolved = attempt.resolved.clone();
        let caveat = format!(
            "process {} did not exit within {:?}; marked stopped",
            attempt.pid.map_or_else(|| "?".to_string(), |p| p.to_string()),
            self.shared.settings.stop_timeout()
        );
        warn!(attempt = %id, "{caveat}");
        inner.last_error = Some(caveat);
        self.shared.transition(&mut inner, Some(id), LaunchStatus::Stopped);
        resolved.cancel();

        Err(LaunchError::StopTimeout)
    }

    /// Settles a launch that did not react to cancellation in time. The
    /// launch task finds its pending entry gone and reaps whatever it
    /// spawned.
    async fn force_cancelled(&self, id: Uuid) -> Result<(), LaunchError> {
        let mut inner = self.shared.inner.lock().await;
        let Some(pending) = inner.pending.take_if(|p| p.id == id) else {
            return Ok(());
        };

        let caveat = format!(
            "launch did not settle within {:?}; marked stopped",
            self.shared.settings.stop_timeout()
        );
        warn!(attempt = %id, "{caveat}");
        inner.last_error = Some(caveat);
        self.shared.transition(&mut inner, Some(id), LaunchStatus::Stopped);
        pending.settled.cancel();

        Err(LaunchError::StopTimeout)
    }
}

impl Shared {
    /// Takes the locked inner state so that status writes only happen
    /// under the lock.
    fn transition(&self, _inner: &mut ControllerInner, attempt: Option<Uuid>, new: LaunchStatus) {
        let old = self.status_tx.send_replace(new);
        if old == new {
            return;
        }
        info!(?attempt, %old, %new, "launch status changed");
        let _ = self
            .events_tx
            .send(LaunchEvent::state_change(attempt, old, new));
    }

    /// Applies the exit monitor's report. Reports for an attempt that was
    /// superseded or already resolved are dropped.
    async fn finish_attempt(&self, id: Uuid, result: Result<ExitOutcome, String>) {
        let mut inner = self.inner.lock().await;
        let clean_exit_is_stop = self.settings.clean_exit_is_stop;

        let Some(attempt) = inner.attempt.as_mut().filter(|a| a.id == id) else {
            debug!(attempt = %id, "exit report for a retired attempt");
            return;
        };
        if attempt.is_resolved() {
            debug!(attempt = %id, ?result, "late exit report ignored");
            return;
        }

        attempt.ended_at = Some(Utc::now());
        let resolved = attempt.resolved.clone();

        let (status, error) = match result {
            Ok(outcome) => {
                attempt.outcome = Some(outcome);
                if attempt.stop_requested || (clean_exit_is_stop && outcome.is_clean()) {
                    info!(attempt = %id, %outcome, "game stopped");
                    (LaunchStatus::Stopped, None)
                } else {
                    let mut reason = format!("Minecraft crashed: {outcome}");
                    if let Some(path) = attempt.crash_report.get() {
                        reason.push_str(&format!(" (crash report: {})", path.display()));
                    }
                    warn!(attempt = %id, %outcome, "game crashed");
                    (LaunchStatus::Crashed, Some(reason))
                }
            }
            Err(detail) => {
                attempt.outcome = Some(ExitOutcome::Unknown);
                // The process may still be alive; make sure it goes away.
                attempt.terminate.cancel();
                let err = LaunchError::ProcessWatchFailure(detail);
                warn!(attempt = %id, %err, "lost the game process");
                if attempt.stop_requested {
                    (LaunchStatus::Stopped, Some(err.to_string()))
                } else {
                    (LaunchStatus::Crashed, Some(err.to_string()))
                }
            }
        };

        if error.is_some() {
            inner.last_error = error;
        }
        self.transition(&mut inner, Some(id), status);
        // Only after the status is published: `stop()` returns on this.
        resolved.cancel();
    }
}

fn reap_in_background(mut child: Child) {
    if let Err(err) = child.start_kill() {
        debug!(%err, "kill of cancelled launch failed");
    }
    tokio::spawn(async move {
        let _ = child.wait().await;
    });
}
