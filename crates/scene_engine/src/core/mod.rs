//! # Core Engine Module
//!
//! Shared configuration and the re-exports other subsystems lean on.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration for the loader and transform resolver
//! - **Foundation**: Low-level utilities (math, logging)
//! - **Serialization**: Wire format, reflection and id remapping
//! - **ECS**: Component store and systems

pub mod config;

pub use crate::ecs;
pub use crate::foundation;
pub use crate::serialization;

pub use config::{Config, ConfigError, ConfigFormat, EngineConfig, SceneConfig, TransformConfig};
