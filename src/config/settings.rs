use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tokio::{
    fs::{self, File},
    io::{self, AsyncWriteExt},
};
use tracing::debug;

use crate::error::SettingsError;

use super::{LaunchConfig, MemoryBounds};

/// Tunables for a [`LaunchController`](crate::controller::LaunchController).
///
/// Read from a JSON file; every field is optional there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    pub memory: MemoryBounds,
    /// How long `stop` waits for the game to exit before forcing `Stopped`.
    pub stop_timeout_ms: u64,
    /// Time between the polite shutdown signal and a hard kill.
    pub kill_grace_ms: u64,
    /// Report an exit with code 0 that nobody asked for as `Stopped`
    /// instead of `Crashed`.
    pub clean_exit_is_stop: bool,
    /// Where `update_launch_config` persists the stored config.
    pub config_path: Option<PathBuf>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            memory: MemoryBounds::default(),
            stop_timeout_ms: 10_000,
            kill_grace_ms: 5_000,
            clean_exit_is_stop: false,
            config_path: None,
        }
    }
}

impl ControllerSettings {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }

    pub fn from_json(data: &[u8]) -> Result<Self, SettingsError> {
        let settings: ControllerSettings = serde_json::from_slice(data)?;
        settings.check()?;
        Ok(settings)
    }

    pub async fn load(path: &Path) -> Result<Self, SettingsError> {
        let data = fs::read(path).await.map_err(SettingsError::Read)?;
        let settings = Self::from_json(&data)?;
        debug!(path = %path.display(), ?settings, "loaded controller settings");
        Ok(settings)
    }

    fn check(&self) -> Result<(), SettingsError> {
        if self.memory.min_mb > self.memory.max_mb {
            return Err(SettingsError::InvertedMemoryBounds {
                min: self.memory.min_mb,
                max: self.memory.max_mb,
            });
        }
        Ok(())
    }
}

/// JSON file holding the last stored [`LaunchConfig`].
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `Ok(None)` when nothing has been stored yet.
    pub async fn load(&self) -> Result<Option<LaunchConfig>, SettingsError> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SettingsError::Read(e)),
        };

        let config: LaunchConfig = serde_json::from_slice(&data)?;
        Ok(Some(config))
    }

    pub async fn save(&self, config: &LaunchConfig) -> Result<(), SettingsError> {
        let json = serde_json::to_vec_pretty(config)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(SettingsError::Write)?;
        }

        let mut out = File::create(&self.path)
            .await
            .map_err(SettingsError::Write)?;
        out.write_all(&json).await.map_err(SettingsError::Write)?;
        out.flush().await.map_err(SettingsError::Write)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let settings = ControllerSettings::from_json(b"{}").unwrap();
        assert_eq!(settings, ControllerSettings::default());
        assert_eq!(settings.stop_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn partial_settings_override_fields() {
        let settings = ControllerSettings::from_json(
            br#"{"memory": {"min_mb": 1024, "max_mb": 4096}, "clean_exit_is_stop": true}"#,
        )
        .unwrap();
        assert_eq!(settings.memory.min_mb, 1024);
        assert_eq!(settings.memory.max_mb, 4096);
        assert!(settings.clean_exit_is_stop);
        assert_eq!(settings.stop_timeout_ms, 10_000);
    }

    #[test]
    fn rejects_inverted_bounds() {
        let err = ControllerSettings::from_json(br#"{"memory": {"min_mb": 8192, "max_mb": 1024}}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            SettingsError::InvertedMemoryBounds {
                min: 8192,
                max: 1024
            }
        ));
    }

    #[tokio::test]
    async fn store_returns_none_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("launch.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn store_saves_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested/launch.json"));

        let mut config = LaunchConfig::default();
        config.username = "Alex".into();
        config.access_token = Some("token".into());
        store.save(&config).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(config));
    }
}
