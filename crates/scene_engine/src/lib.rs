//! # Scene Engine
//!
//! Scene description loading, reflection and transform hierarchy resolution
//! for a real-time engine.
//!
//! ## Features
//!
//! - **Binary Scene Format**: Tag-delimited node/attribute trees, read and written
//! - **Reflection**: Types expose and consume named, typed attributes through one trait
//! - **Unique IDs**: File-local ids remapped into one global id space per context
//! - **ECS Storage**: Components keyed by type name and entity id
//! - **Transform Hierarchy**: Local and world matrices across parent chains
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default();
//!     scene_engine::foundation::logging::init_with_level(&config.log_level);
//!
//!     let context = SerializationContext::with_builtin_types();
//!     let mut scene = Scene::new(config);
//!     scene.load(&context, "levels/start.ssd")?;
//!     scene.initialize();
//!     scene.update();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;

pub mod assets;
pub mod config;
pub mod ecs;
pub mod foundation;
pub mod scene;
pub mod serialization;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{AssetStore, ExternalAsset, Material, Mesh, Shader, ShaderSource},
        core::config::{Config, EngineConfig, SceneConfig, TransformConfig},
        ecs::{
            components::{LightComponent, ObjectMetadataComponent, RendererComponent, TransformComponent},
            Component, ComponentStore, EntityId, EntityManager, System, SystemRunner, TransformSystem,
        },
        foundation::math::{Mat4, Quat, Transform, Vec3},
        scene::{LoadError, Scene, SceneLoader, SceneSaver},
        serialization::{
            Attribute, AttributeValue, Identifier, SerializationContext, Serialized, SerializedType,
            TypeRegistry, NULL_ID,
        },
    };
}
