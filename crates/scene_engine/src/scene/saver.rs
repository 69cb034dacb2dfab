//! Scene and asset file saving
//!
//! Components are regrouped under one `Entity` node per entity id, followed by
//! every stored asset. Ids are compacted into the file's local id space on the
//! way out, so a saved scene loads back with fresh global ids.

use std::path::Path;

use thiserror::Error;

use crate::assets::AssetStore;
use crate::ecs::component_store::ComponentStore;
use crate::ecs::entity::Entity;
use crate::serialization::{
    DataNode, EncodeError, Header, SceneDocument, SceneWriter, SerializeError, Serialized,
    Serializer, WriteError,
};

/// Scene and asset save failures
#[derive(Debug, Error)]
pub enum SaveError {
    /// Too many objects for one file
    #[error(transparent)]
    Serialize(#[from] SerializeError),

    /// A node could not be narrowed to the wire format
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The file could not be written
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Writes live stores back to scene files
#[derive(Debug, Clone, Default)]
pub struct SceneSaver {
    header: Header,
}

impl SceneSaver {
    /// Saver writing the current header
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: Set the header written to every file
    pub fn with_header(mut self, header: Header) -> Self {
        self.header = header;
        self
    }

    /// Build the document for a scene without writing it
    pub fn scene_document(
        &self,
        components: &ComponentStore,
        assets: &AssetStore,
    ) -> Result<SceneDocument, SaveError> {
        let entities: Vec<Entity> = components
            .entity_ids()
            .into_iter()
            .map(|entity_id| {
                let mut entity = Entity::new(entity_id);
                entity.components = components
                    .entity_components(entity_id)
                    .map(|component| component.clone_boxed())
                    .collect();
                entity
            })
            .collect();

        let roots: Vec<&dyn Serialized> = entities
            .iter()
            .map(|entity| entity as &dyn Serialized)
            .chain(assets.iter_all())
            .collect();
        log::debug!(
            "Saving {} entities and {} assets",
            entities.len(),
            roots.len() - entities.len()
        );
        self.document(&roots)
    }

    /// Build the document for a set of root objects
    pub fn document(&self, roots: &[&dyn Serialized]) -> Result<SceneDocument, SaveError> {
        let nodes = Serializer::new()
            .serialize_all(roots)?
            .into_iter()
            .map(DataNode::into_raw)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SceneDocument {
            header: self.header,
            nodes,
        })
    }

    /// Write a scene file
    pub fn save_scene(
        &self,
        path: impl AsRef<Path>,
        components: &ComponentStore,
        assets: &AssetStore,
    ) -> Result<(), SaveError> {
        let document = self.scene_document(components, assets)?;
        self.write(path.as_ref(), &document)
    }

    /// Write a single-object asset file
    pub fn save_asset(&self, path: impl AsRef<Path>, asset: &dyn Serialized) -> Result<(), SaveError> {
        let document = self.document(&[asset])?;
        self.write(path.as_ref(), &document)
    }

    fn write(&self, path: &Path, document: &SceneDocument) -> Result<(), SaveError> {
        SceneWriter::create(path)?.write_document(document)?;
        log::info!("Saved {} root objects to {}", document.nodes.len(), path.display());
        Ok(())
    }
}
