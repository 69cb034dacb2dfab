//! # Engine Configuration
//!
//! Configuration for the scene loading pipeline and the transform resolver.
//!
//! ## Configuration Categories
//!
//! - **Engine Config**: logging and the nested subsystem sections
//! - **Scene Config**: where scene files live and how strictly they are checked
//! - **Transform Config**: when the transform hierarchy is resolved

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError, ConfigFormat};

/// # Scene Configuration
///
/// Controls header checks, the unregistered-type policy and reader selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Base directory that relative scene paths are resolved against
    pub assets_dir: String,
    /// Header signature to enforce; `None` accepts any signature
    pub expected_signature: Option<String>,
    /// Highest header version accepted
    pub max_version: u8,
    /// Abort the whole load when a node names an unregistered type
    ///
    /// When false the node is skipped and the load continues.
    pub abort_on_unregistered_type: bool,
    /// File extension handled by the binary reader
    pub scene_extension: String,
}

impl SceneConfig {
    /// Create a scene configuration with defaults
    pub fn new() -> Self {
        Self {
            assets_dir: String::new(),
            expected_signature: None,
            max_version: u8::MAX,
            abort_on_unregistered_type: true,
            scene_extension: "ssd".to_string(),
        }
    }

    /// Set the assets directory
    pub fn with_assets_dir(mut self, dir: impl Into<String>) -> Self {
        self.assets_dir = dir.into();
        self
    }

    /// Enforce a header signature
    pub fn with_expected_signature(mut self, signature: impl Into<String>) -> Self {
        self.expected_signature = Some(signature.into());
        self
    }

    /// Set the highest accepted header version
    pub fn with_max_version(mut self, version: u8) -> Self {
        self.max_version = version;
        self
    }

    /// Set the unregistered-type policy
    pub fn with_abort_on_unregistered_type(mut self, abort: bool) -> Self {
        self.abort_on_unregistered_type = abort;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(signature) = &self.expected_signature {
            if signature.len() != 3 {
                return Err(ConfigError::Invalid(format!(
                    "Scene signature must be exactly 3 bytes, got {:?}",
                    signature
                )));
            }
        }
        if self.scene_extension.is_empty() {
            return Err(ConfigError::Invalid("Scene extension cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Transform Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Resolve every transform, static ones included, when the system initializes
    pub resolve_on_initialize: bool,
    /// Skip non-dynamic transforms during per-tick updates
    pub update_ignores_static: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            resolve_on_initialize: true,
            update_ignores_static: true,
        }
    }
}

/// # Engine Configuration
///
/// Top-level configuration applications load once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level for the engine
    pub log_level: String,
    /// Scene loading configuration
    pub scene: SceneConfig,
    /// Transform resolver configuration
    pub transforms: TransformConfig,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            scene: SceneConfig::default(),
            transforms: TransformConfig::default(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Replace the scene section
    pub fn with_scene(mut self, scene: SceneConfig) -> Self {
        self.scene = scene;
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if crate::foundation::logging::parse_level(&self.log_level).is_none() {
            return Err(ConfigError::Invalid(format!("Unknown log level: {}", self.log_level)));
        }
        self.scene.validate()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for EngineConfig {}
