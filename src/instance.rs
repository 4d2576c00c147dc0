mod handle;
mod launcher;
mod types;

pub(crate) use handle::{spawn_output_pumps, wait_for_exit};
pub use launcher::{JavaLauncher, Launcher, MAIN_CLASS, build_launch_args};
pub(crate) use types::LaunchAttempt;
pub use types::{AttemptSummary, ExitOutcome, LaunchHandle, LaunchStatus};
