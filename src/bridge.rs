//! Named operations the launcher UI invokes.
//!
//! Each operation exists as a typed method and behind [`Bridge::invoke`],
//! which takes a command name and a JSON object of named arguments the
//! way the UI's invoke layer sends them.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::{
    config::LaunchConfig,
    controller::LaunchController,
    error::{LaunchError, LaunchErrorKind},
    instance::{AttemptSummary, LaunchStatus},
};

pub const COMMANDS: &[&str] = &[
    "launch_instance",
    "stop_instance",
    "get_launch_status",
    "get_launch_config",
    "update_launch_config",
    "get_last_error",
    "get_last_attempt",
];

/// Error payload handed back across the invoke boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct BridgeError {
    pub kind: LaunchErrorKind,
    pub message: String,
}

impl BridgeError {
    fn new<S: Into<String>>(kind: LaunchErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<LaunchError> for BridgeError {
    fn from(err: LaunchError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OptionalConfigArgs {
    #[serde(default)]
    config: Option<LaunchConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigArgs {
    config: LaunchConfig,
}

#[derive(Debug, Clone)]
pub struct Bridge {
    controller: LaunchController,
}

impl Bridge {
    pub fn new(controller: LaunchController) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &LaunchController {
        &self.controller
    }

    /// Launches with `config`, or with the stored config when `None`.
    pub async fn launch_instance(
        &self,
        config: Option<LaunchConfig>,
    ) -> Result<String, BridgeError> {
        let config = match config {
            Some(config) => config,
            None => self.controller.stored_config().await,
        };
        let handle = self.controller.launch(config).await?;
        Ok(match handle.pid {
            Some(pid) => format!("Minecraft launched (pid {pid})"),
            None => "Minecraft launched".to_string(),
        })
    }

    pub async fn stop_instance(&self) -> Result<String, BridgeError> {
        self.controller.stop().await?;
        Ok("Minecraft stopped".to_string())
    }

    pub fn get_launch_status(&self) -> LaunchStatus {
        self.controller.status()
    }

    pub async fn get_launch_config(&self) -> LaunchConfig {
        self.controller.stored_config().await
    }

    pub async fn update_launch_config(&self, config: LaunchConfig) -> Result<String, BridgeError> {
        self.controller.update_config(config).await?;
        Ok("Launch config updated".to_string())
    }

    pub async fn get_last_error(&self) -> Option<String> {
        self.controller.last_error().await
    }

    pub async fn get_last_attempt(&self) -> Option<AttemptSummary> {
        self.controller.last_attempt().await
    }

    /// Dispatches a named command. `args` may be `null` for commands
    /// without parameters.
    pub async fn invoke(&self, command: &str, args: Value) -> Result<Value, BridgeError> {
        debug!(command, "invoke");
        match command {
            "launch_instance" => {
                let args: OptionalConfigArgs = parse_args(args)?;
                encode(self.launch_instance(args.config).await?)
            }
            "stop_instance" => {
                no_args(command, &args)?;
                encode(self.stop_instance().await?)
            }
            "get_launch_status" => {
                no_args(command, &args)?;
                encode(self.get_launch_status())
            }
            "get_launch_config" => {
                no_args(command, &args)?;
                encode(self.get_launch_config().await)
            }
            "update_launch_config" => {
                let args: ConfigArgs = parse_args(args)?;
                encode(self.update_launch_config(args.config).await?)
            }
            "get_last_error" => {
                no_args(command, &args)?;
                encode(self.get_last_error().await)
            }
            "get_last_attempt" => {
                no_args(command, &args)?;
                encode(self.get_last_attempt().await)
            }
            other => Err(BridgeError::new(
                LaunchErrorKind::UnknownCommand,
                format!("unknown command {other:?}, expected one of {}", COMMANDS.join(", ")),
            )),
        }
    }
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, BridgeError> {
    let args = match args {
        Value::Null => Value::Object(Map::new()),
        args => args,
    };
    serde_json::from_value(args).map_err(invalid_args)
}

fn no_args(command: &str, args: &Value) -> Result<(), BridgeError> {
    match args {
        Value::Null => Ok(()),
        Value::Object(map) if map.is_empty() => Ok(()),
        _ => Err(BridgeError::new(
            LaunchErrorKind::InvalidArguments,
            format!("{command} takes no arguments"),
        )),
    }
}

fn invalid_args(err: serde_json::Error) -> BridgeError {
    BridgeError::new(
        LaunchErrorKind::InvalidArguments,
        format!("invalid arguments: {err}"),
    )
}

fn encode<T: Serialize>(value: T) -> Result<Value, BridgeError> {
    serde_json::to_value(value)
        .map_err(|e| BridgeError::new(LaunchErrorKind::Encoding, e.to_string()))
}
