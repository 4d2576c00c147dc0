use std::{fmt::Debug, io};

use async_trait::async_trait;
use tokio::{fs, process::Command};

use crate::config::LaunchConfig;

pub const MAIN_CLASS: &str = "net.minecraft.client.main.Main";

/// Turns a validated [`LaunchConfig`] into a process to spawn.
///
/// The controller overrides stdio on the returned command: stdin is
/// closed and stdout/stderr are always piped to the output pumps.
#[async_trait]
pub trait Launcher: Send + Sync + Debug {
    /// Runs while the controller is `Launching`, before the spawn.
    async fn prepare(&self, config: &LaunchConfig) -> io::Result<()> {
        fs::create_dir_all(&config.game_dir).await
    }

    fn command(&self, config: &LaunchConfig) -> Command;
}

/// Starts the vanilla client main class with the configured JVM.
#[derive(Debug, Default, Clone, Copy)]
pub struct JavaLauncher;

#[async_trait]
impl Launcher for JavaLauncher {
    fn command(&self, config: &LaunchConfig) -> Command {
        let mut command = Command::new(&config.java_path);
        command
            .args(build_launch_args(config))
            .current_dir(&config.game_dir);

        #[cfg(unix)]
        command.process_group(0);

        command
    }
}

/// JVM and game arguments, in launch order.
pub fn build_launch_args(config: &LaunchConfig) -> Vec<String> {
    let version_type = config.minecraft_version().version_type();

    let mut args = vec![
        format!("-Xmx{}M", config.memory_mb),
        format!("-Xms{}M", (config.memory_mb / 2).max(1)),
        "-cp".to_string(),
        format!("{}/libraries/*", config.game_dir),
        MAIN_CLASS.to_string(),
        "--version".to_string(),
        config.version.clone(),
        "--versionType".to_string(),
        version_type.to_string(),
        "--gameDir".to_string(),
        config.game_dir.clone(),
        "--assetsDir".to_string(),
        config.assets_dir.clone(),
        "--assetIndex".to_string(),
        config.version.clone(),
        "--uuid".to_string(),
        config.uuid.clone(),
        "--username".to_string(),
        config.username.clone(),
    ];

    match config.online_token() {
        Some(token) => {
            args.push("--accessToken".to_string());
            args.push(token.to_string());
            args.push("--userType".to_string());
            args.push("msa".to_string());
        }
        None => {
            args.push("--userType".to_string());
            args.push("legacy".to_string());
        }
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn offline_args() {
        let config = LaunchConfig::default();
        let args = build_launch_args(&config);

        assert_eq!(args[0], "-Xmx2048M");
        assert_eq!(args[1], "-Xms1024M");
        assert!(args.contains(&MAIN_CLASS.to_string()));
        assert_eq!(value_after(&args, "--version"), Some("1.20.4"));
        assert_eq!(value_after(&args, "--versionType"), Some("release"));
        assert_eq!(value_after(&args, "--username"), Some("Steve"));
        assert_eq!(value_after(&args, "--gameDir"), Some("./.minecraft"));
        assert_eq!(value_after(&args, "--userType"), Some("legacy"));
        assert!(!args.iter().any(|a| a == "--accessToken"));
    }

    #[test]
    fn online_args_carry_token() {
        let config = LaunchConfig {
            access_token: Some("secret".into()),
            version: "24w10a".into(),
            ..LaunchConfig::default()
        };
        let args = build_launch_args(&config);

        assert_eq!(value_after(&args, "--accessToken"), Some("secret"));
        assert_eq!(value_after(&args, "--userType"), Some("msa"));
        assert_eq!(value_after(&args, "--versionType"), Some("snapshot"));
    }

    #[test]
    fn empty_token_counts_as_offline() {
        let config = LaunchConfig {
            access_token: Some(String::new()),
            ..LaunchConfig::default()
        };
        let args = build_launch_args(&config);
        assert_eq!(value_after(&args, "--userType"), Some("legacy"));
    }

    #[test]
    fn java_command_uses_configured_binary() {
        let config = LaunchConfig {
            java_path: "/opt/jdk/bin/java".into(),
            ..LaunchConfig::default()
        };
        let command = JavaLauncher.command(&config);
        assert_eq!(command.as_std().get_program(), "/opt/jdk/bin/java");
        assert_eq!(
            command.as_std().get_current_dir(),
            Some(std::path::Path::new("./.minecraft"))
        );
    }

    #[tokio::test]
    async fn prepare_creates_game_dir() {
        let dir = tempfile::tempdir().unwrap();
        let game_dir = dir.path().join("instances/main");
        let config = LaunchConfig {
            game_dir: game_dir.to_string_lossy().into_owned(),
            ..LaunchConfig::default()
        };

        JavaLauncher.prepare(&config).await.unwrap();
        assert!(game_dir.is_dir());
    }
}
