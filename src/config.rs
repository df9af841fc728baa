use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Per-session tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SessionConfig {
    /// How many logic-bearing info nodes may be passed through in one transition.
    pub max_auto_route_hops: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_auto_route_hops: 32,
        }
    }
}

/// Engine configuration, usually read from a `diagflow.yaml` file.
///
/// ```yaml
/// manifest: flows/manifest.json
/// session_dir: .diagflow
/// log_level: info
/// session:
///   max_auto_route_hops: 16
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Flow manifest to load. Ignored when `bundle` is set.
    pub manifest: Option<PathBuf>,
    /// Pre-built flow bundle to load instead of a manifest.
    pub bundle: Option<PathBuf>,
    /// Directory the active session is persisted in. No persistence when absent.
    pub session_dir: Option<PathBuf>,
    pub log_level: String,
    pub session: SessionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            manifest: None,
            bundle: None,
            session_dir: None,
            log_level: "info".to_string(),
            session: SessionConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_yaml(&content)?;

        // Relative paths are resolved against the config file's directory.
        if let Some(base) = path.parent() {
            for slot in [&mut config.manifest, &mut config.bundle, &mut config.session_dir] {
                if let Some(p) = slot.as_mut().filter(|p| p.is_relative()) {
                    *p = base.join(&*p);
                }
            }
        }
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }
}
