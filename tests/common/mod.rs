#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use minelaunch::{
    ControllerSettings, LaunchConfig, LaunchController, LaunchStatus, Launcher,
};
use tempfile::TempDir;
use tokio::{process::Command, time::timeout};

/// Runs `sh -c <script>` in place of the game.
#[derive(Debug)]
pub struct Shell {
    pub script: String,
}

#[async_trait]
impl Launcher for Shell {
    fn command(&self, _config: &LaunchConfig) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(&self.script);
        command
    }
}

/// Waits for the game to hang around until it is stopped.
pub const LONG_RUNNING: &str = "exec sleep 30";

pub fn controller(script: &str, settings: ControllerSettings) -> LaunchController {
    LaunchController::with_launcher(
        settings,
        Arc::new(Shell {
            script: script.to_string(),
        }),
    )
}

pub fn config_in(dir: &TempDir) -> LaunchConfig {
    LaunchConfig {
        java_path: "java".into(),
        memory_mb: 4096,
        version: "1.20.4".into(),
        game_dir: dir.path().to_string_lossy().into_owned(),
        assets_dir: dir.path().join("assets").to_string_lossy().into_owned(),
        username: "Steve".into(),
        uuid: "00000000-0000-0000-0000-000000000000".into(),
        access_token: None,
    }
}

pub async fn wait_for_status(controller: &LaunchController, wanted: LaunchStatus) {
    let mut rx = controller.watch_status();
    timeout(Duration::from_secs(10), rx.wait_for(|s| *s == wanted))
        .await
        .expect("timed out waiting for status")
        .expect("status channel closed");
}
