use std::{
    fmt::{self, Display},
    path::PathBuf,
    process::ExitStatus,
    sync::{Arc, OnceLock},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchStatus {
    Idle,
    Launching,
    Running,
    Crashed,
    Stopped,
}

impl LaunchStatus {
    /// `Launching` or `Running`: a new launch must be refused.
    pub fn is_active(self) -> bool {
        matches!(self, LaunchStatus::Launching | LaunchStatus::Running)
    }
}

impl Display for LaunchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LaunchStatus::Idle => "Idle",
            LaunchStatus::Launching => "Launching",
            LaunchStatus::Running => "Running",
            LaunchStatus::Crashed => "Crashed",
            LaunchStatus::Stopped => "Stopped",
        };
        f.write_str(s)
    }
}

/// How a game process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExitOutcome {
    Exited { code: i32 },
    Signaled { signal: Option<i32> },
    /// The exit could not be observed.
    Unknown,
}

impl ExitOutcome {
    pub fn is_clean(&self) -> bool {
        matches!(self, ExitOutcome::Exited { code: 0 })
    }
}

impl From<ExitStatus> for ExitOutcome {
    fn from(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => ExitOutcome::Exited { code },
            None => ExitOutcome::Signaled {
                signal: signal_of(&status),
            },
        }
    }
}

#[cfg(unix)]
fn signal_of(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn signal_of(_status: &ExitStatus) -> Option<i32> {
    None
}

impl Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Exited { code } => write!(f, "exited with code {code}"),
            ExitOutcome::Signaled { signal: Some(sig) } => {
                write!(f, "terminated by signal {sig}")
            }
            ExitOutcome::Signaled { signal: None } => write!(f, "terminated by signal"),
            ExitOutcome::Unknown => write!(f, "exit status unknown"),
        }
    }
}

/// Identifies an accepted launch; returned by `launch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchHandle {
    pub attempt_id: Uuid,
    pub pid: Option<u32>,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptSummary {
    pub attempt_id: Uuid,
    pub pid: Option<u32>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub outcome: Option<ExitOutcome>,
    pub stop_requested: bool,
    pub crash_report: Option<PathBuf>,
}

/// A spawned game process as tracked by the controller.
#[derive(Debug)]
pub(crate) struct LaunchAttempt {
    pub id: Uuid,
    pub pid: Option<u32>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub outcome: Option<ExitOutcome>,
    pub stop_requested: bool,
    /// Filled by the output pumps if the game prints its crash banner.
    pub crash_report: Arc<OnceLock<PathBuf>>,
    /// Fired to ask the exit monitor to terminate the process.
    pub terminate: CancellationToken,
    /// Fired once the attempt reached its terminal status.
    pub resolved: CancellationToken,
}

impl LaunchAttempt {
    pub fn new(id: Uuid, pid: Option<u32>) -> Self {
        Self {
            id,
            pid,
            started_at: Utc::now(),
            ended_at: None,
            outcome: None,
            stop_requested: false,
            crash_report: Arc::new(OnceLock::new()),
            terminate: CancellationToken::new(),
            resolved: CancellationToken::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_cancelled()
    }

    pub fn handle(&self) -> LaunchHandle {
        LaunchHandle {
            attempt_id: self.id,
            pid: self.pid,
            started_at: self.started_at,
        }
    }

    pub fn summary(&self) -> AttemptSummary {
        AttemptSummary {
            attempt_id: self.id,
            pid: self.pid,
            started_at: self.started_at,
            ended_at: self.ended_at,
            outcome: self.outcome,
            stop_requested: self.stop_requested,
            crash_report: self.crash_report.get().cloned(),
        }
    }
}
