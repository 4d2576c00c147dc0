use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConfigError;

mod settings;
pub mod stream;
mod version;

pub use settings::{ConfigStore, ControllerSettings};
pub use stream::{LogLevel, LogMeta, StreamSource};
pub use version::{MinecraftVersion, Snapshot, Version};

pub const DEFAULT_JAVA_PATH: &str = "java";
pub const DEFAULT_MEMORY_MB: u32 = 2048;
pub const DEFAULT_VERSION: &str = "1.20.4";
pub const DEFAULT_USERNAME: &str = "Steve";
/// Offline-mode placeholder account.
pub const DEFAULT_UUID: &str = "069a79f4-44e9-4726-a5be-fca90e38aaf5";

/// Everything needed to start one game process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfig {
    pub java_path: String,
    pub memory_mb: u32,
    pub version: String,
    pub game_dir: String,
    pub assets_dir: String,
    pub username: String,
    pub uuid: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            java_path: DEFAULT_JAVA_PATH.to_string(),
            memory_mb: DEFAULT_MEMORY_MB,
            version: DEFAULT_VERSION.to_string(),
            game_dir: "./.minecraft".to_string(),
            assets_dir: "./.minecraft/assets".to_string(),
            username: DEFAULT_USERNAME.to_string(),
            uuid: DEFAULT_UUID.to_string(),
            access_token: None,
        }
    }
}

/// Inclusive range of accepted `memory_mb` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryBounds {
    pub min_mb: u32,
    pub max_mb: u32,
}

impl Default for MemoryBounds {
    fn default() -> Self {
        Self {
            min_mb: 512,
            max_mb: 65536,
        }
    }
}

impl LaunchConfig {
    pub fn validate(&self, bounds: &MemoryBounds) -> Result<(), ConfigError> {
        if self.java_path.trim().is_empty() {
            return Err(ConfigError::EmptyJavaPath);
        }
        if self.version.trim().is_empty() {
            return Err(ConfigError::EmptyVersion);
        }
        if self.username.trim().is_empty() {
            return Err(ConfigError::EmptyUsername);
        }
        if self.memory_mb == 0 {
            return Err(ConfigError::ZeroMemory);
        }
        if !(bounds.min_mb..=bounds.max_mb).contains(&self.memory_mb) {
            return Err(ConfigError::MemoryOutOfRange {
                value: self.memory_mb,
                min: bounds.min_mb,
                max: bounds.max_mb,
            });
        }
        Uuid::parse_str(self.uuid.trim()).map_err(|_| ConfigError::InvalidUuid(self.uuid.clone()))?;

        Ok(())
    }

    pub fn minecraft_version(&self) -> MinecraftVersion {
        MinecraftVersion::classify(&self.version)
    }

    /// The access token, if the account is signed in. An empty token
    /// counts as offline.
    pub fn online_token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }
}
