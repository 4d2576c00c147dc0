//! Launch session controller for a Minecraft desktop launcher.
//!
//! A [`LaunchController`] owns at most one game process at a time and
//! tracks it through [`LaunchStatus`]. The [`Bridge`] exposes the controller
//! as the named commands the launcher UI invokes and polls.

pub mod bridge;
pub mod config;
pub mod controller;
pub mod error;
pub mod instance;
pub mod parser;
pub mod utils;

pub use bridge::{Bridge, BridgeError};
pub use config::{ControllerSettings, LaunchConfig, MemoryBounds};
pub use controller::LaunchController;
pub use error::{ConfigError, LaunchError, LaunchErrorKind, SettingsError};
pub use instance::{AttemptSummary, ExitOutcome, LaunchHandle, LaunchStatus, Launcher};
