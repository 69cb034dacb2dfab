//! Scene management
//!
//! A [`Scene`] owns the live component and asset stores plus the systems that
//! run over them. [`SceneLoader`] and [`SceneSaver`] move it to and from
//! scene files.

pub mod loader;
pub mod saver;

pub use loader::{LoadError, LoadSummary, SceneLoader};
pub use saver::{SaveError, SceneSaver};

use std::path::Path;

use crate::assets::AssetStore;
use crate::core::config::EngineConfig;
use crate::ecs::component::EntityId;
use crate::ecs::component_store::ComponentStore;
use crate::ecs::components::TransformComponent;
use crate::ecs::system::{System, SystemRunner};
use crate::ecs::systems::TransformSystem;
use crate::foundation::math::Mat4;
use crate::serialization::SerializationContext;

/// Live scene state
pub struct Scene {
    /// Components by type and entity
    pub components: ComponentStore,
    /// Assets by type and id
    pub assets: AssetStore,
    systems: SystemRunner,
    config: EngineConfig,
}

impl Scene {
    /// Empty scene running a [`TransformSystem`]
    pub fn new(config: EngineConfig) -> Self {
        let mut systems = SystemRunner::new();
        systems.add_system(Box::new(TransformSystem::new(config.transforms.clone())));
        Self {
            components: ComponentStore::new(),
            assets: AssetStore::new(),
            systems,
            config,
        }
    }

    /// Append a system after the built-in ones
    pub fn add_system(&mut self, system: Box<dyn System>) {
        self.systems.add_system(system);
    }

    /// Load a scene file into this scene
    pub fn load(
        &mut self,
        context: &SerializationContext,
        path: impl AsRef<Path>,
    ) -> Result<LoadSummary, LoadError> {
        SceneLoader::new(context, self.config.scene.clone()).load_scene(
            path,
            &mut self.components,
            &mut self.assets,
        )
    }

    /// Write this scene to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SaveError> {
        SceneSaver::new().save_scene(path, &self.components, &self.assets)
    }

    /// Initialize every system
    pub fn initialize(&mut self) -> bool {
        self.systems.initialize(&mut self.components)
    }

    /// Run one step of every system
    pub fn update(&mut self) -> bool {
        self.systems.update(&mut self.components)
    }

    /// Resolved world matrix of an entity
    pub fn world_transform(&self, entity: EntityId) -> Option<&Mat4> {
        self.components
            .get::<TransformComponent>(entity)
            .map(TransformComponent::world_transform)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests;
