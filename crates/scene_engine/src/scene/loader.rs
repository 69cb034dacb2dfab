//! Scene and asset file loading
//!
//! A load reads one file, remaps its local ids into the context's global id
//! space, deserializes every root node and routes the results:
//!
//! - `Entity` nodes give their components to the [`ComponentStore`] under the
//!   entity's id
//! - free-standing components are stored under their own id
//! - `ExternalAsset` nodes load the referenced file, which keeps the
//!   placeholder's id
//! - everything else goes to the [`AssetStore`]

use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::assets::{AssetOrigin, AssetStore, ExternalAsset};
use crate::core::config::SceneConfig;
use crate::ecs::component_store::ComponentStore;
use crate::ecs::entity::Entity;
use crate::serialization::{
    DataNode, DeserializeError, Deserializer, Header, IdSpaceExhausted, Identifier, ReadError,
    RemapReport, SceneDocument, SceneReader, SerializationContext, Serialized, UniqueIdSetter,
};

/// Scene and asset load failures
#[derive(Debug, Error)]
pub enum LoadError {
    /// The stream is structurally broken
    #[error(transparent)]
    Read(#[from] ReadError),

    /// A node names an unregistered type and the config says to abort
    #[error(transparent)]
    Deserialize(#[from] DeserializeError),

    /// The context ran out of unique ids while remapping
    #[error(transparent)]
    IdSpaceExhausted(#[from] IdSpaceExhausted),

    /// No reader handles the file's extension
    #[error("No scene reader for {}", .path.display())]
    UnsupportedFormat {
        /// Rejected path
        path: PathBuf,
    },

    /// An asset file without any root node
    #[error("Asset file {} holds no objects", .path.display())]
    EmptyAsset {
        /// Asset file
        path: PathBuf,
    },

    /// The header signature differs from the configured one
    #[error("Expected signature {expected:?}, found {found:?}")]
    SignatureMismatch {
        /// Configured signature
        expected: String,
        /// Signature in the file
        found: String,
    },

    /// The header version is newer than the configured maximum
    #[error("Format version {version} is newer than the supported {max}")]
    UnsupportedVersion {
        /// Version in the file
        version: u8,
        /// Highest accepted version
        max: u8,
    },
}

/// What one scene load produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadSummary {
    /// Entity nodes dissolved into the component store
    pub entities: usize,
    /// Components added to the component store
    pub components: usize,
    /// Objects added to the asset store, external ones included
    pub assets: usize,
    /// External asset files loaded
    pub external_assets: usize,
    /// Type names of root nodes skipped as unregistered
    pub skipped: Vec<String>,
    /// Id remapping outcome
    pub remap: RemapReport,
}

/// Loads scene and asset files into live stores
pub struct SceneLoader<'a> {
    context: &'a SerializationContext,
    config: SceneConfig,
}

impl<'a> SceneLoader<'a> {
    /// Loader drawing types and ids from `context`
    pub fn new(context: &'a SerializationContext, config: SceneConfig) -> Self {
        Self { context, config }
    }

    /// Loader configuration
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Resolve a path against the configured assets directory
    ///
    /// Absolute paths and an empty assets directory leave the path unchanged.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if self.config.assets_dir.is_empty() || path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(&self.config.assets_dir).join(path)
        }
    }

    /// Load a scene file into the stores
    pub fn load_scene(
        &self,
        path: impl AsRef<Path>,
        components: &mut ComponentStore,
        assets: &mut AssetStore,
    ) -> Result<LoadSummary, LoadError> {
        let path = self.resolve_path(path);
        let document = self.read_file(&path)?;
        self.load_document(document, &path, components, assets)
    }

    /// Load a scene from any byte source
    ///
    /// `origin` names the scene for asset bookkeeping; external assets are
    /// resolved relative to its directory.
    pub fn load_scene_from_reader<R: Read>(
        &self,
        reader: R,
        origin: impl AsRef<Path>,
        components: &mut ComponentStore,
        assets: &mut AssetStore,
    ) -> Result<LoadSummary, LoadError> {
        let document = self.read_stream(reader)?;
        self.load_document(document, origin.as_ref(), components, assets)
    }

    /// Load a single-object asset file and return the asset's id
    ///
    /// With `forced_id` the root object takes that id instead of a fresh one.
    pub fn load_asset(
        &self,
        path: impl AsRef<Path>,
        forced_id: Option<Identifier>,
        assets: &mut AssetStore,
    ) -> Result<Identifier, LoadError> {
        let path = self.resolve_path(path);
        self.load_asset_at(&path, forced_id, assets)
    }

    fn load_asset_at(
        &self,
        path: &Path,
        forced_id: Option<Identifier>,
        assets: &mut AssetStore,
    ) -> Result<Identifier, LoadError> {
        let document = self.read_file(path)?;
        let (mut nodes, _) = self.remap(document)?;
        if nodes.len() > 1 {
            log::warn!(
                "Asset file {} holds {} root objects, only the first is loaded",
                path.display(),
                nodes.len()
            );
        }
        if nodes.is_empty() {
            return Err(LoadError::EmptyAsset {
                path: path.to_path_buf(),
            });
        }
        let root = nodes.swap_remove(0);

        let mut asset = Deserializer::new(&self.context.registry)
            .with_ids(&self.context.ids)
            .deserialize(root)?;
        if let Some(id) = forced_id {
            asset.set_unique_id(id);
        }
        let id = asset.unique_id();
        log::debug!("Loaded {} {} from {}", asset.type_name(), id, path.display());
        assets.add_from(asset, AssetOrigin::External, path);
        Ok(id)
    }

    fn read_file(&self, path: &Path) -> Result<SceneDocument, LoadError> {
        self.check_extension(path)?;
        let mut reader = SceneReader::open(path)?;
        let document = reader.read_document()?;
        self.check_header(&document.header)?;
        Ok(document)
    }

    fn read_stream<R: Read>(&self, reader: R) -> Result<SceneDocument, LoadError> {
        let document = SceneReader::new(reader).read_document()?;
        self.check_header(&document.header)?;
        Ok(document)
    }

    fn check_extension(&self, path: &Path) -> Result<(), LoadError> {
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.config.scene_extension));
        if matches {
            Ok(())
        } else {
            Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    }

    fn check_header(&self, header: &Header) -> Result<(), LoadError> {
        if let Some(expected) = &self.config.expected_signature {
            if expected.as_bytes() != header.signature.as_slice() {
                return Err(LoadError::SignatureMismatch {
                    expected: expected.clone(),
                    found: header.signature_str(),
                });
            }
        }
        if header.version > self.config.max_version {
            return Err(LoadError::UnsupportedVersion {
                version: header.version,
                max: self.config.max_version,
            });
        }
        Ok(())
    }

    fn remap(&self, document: SceneDocument) -> Result<(Vec<DataNode>, RemapReport), LoadError> {
        let mut nodes: Vec<DataNode> = document.nodes.into_iter().map(DataNode::from_raw).collect();
        let report = UniqueIdSetter::new(&self.context.ids).set_unique_ids(&mut nodes)?;
        Ok((nodes, report))
    }

    fn load_document(
        &self,
        document: SceneDocument,
        origin: &Path,
        components: &mut ComponentStore,
        assets: &mut AssetStore,
    ) -> Result<LoadSummary, LoadError> {
        let (nodes, remap) = self.remap(document)?;
        let mut summary = LoadSummary {
            remap,
            ..Default::default()
        };

        let deserializer = Deserializer::new(&self.context.registry).with_ids(&self.context.ids);
        let mut instances = Vec::with_capacity(nodes.len());
        for node in nodes {
            let root_name = node.name.clone();
            match deserializer.deserialize(node) {
                Ok(instance) => instances.push(instance),
                Err(err) if self.config.abort_on_unregistered_type => return Err(err.into()),
                Err(DeserializeError::UnregisteredType { name, id }) => {
                    log::warn!(
                        "Skipping root {:?}: node {} has unregistered type {:?}",
                        root_name,
                        id,
                        name
                    );
                    summary.skipped.push(root_name);
                }
            }
        }

        for instance in instances {
            self.route(instance, origin, components, assets, &mut summary)?;
        }

        log::info!(
            "Loaded {}: {} entities, {} components, {} assets ({} external), {} skipped, {} dangling references",
            origin.display(),
            summary.entities,
            summary.components,
            summary.assets,
            summary.external_assets,
            summary.skipped.len(),
            summary.remap.dangling.len()
        );
        Ok(summary)
    }

    fn route(
        &self,
        instance: Box<dyn Serialized>,
        origin: &Path,
        components: &mut ComponentStore,
        assets: &mut AssetStore,
        summary: &mut LoadSummary,
    ) -> Result<(), LoadError> {
        if instance.is::<Entity>() {
            if let Some(entity) = instance.downcast::<Entity>() {
                self.dissolve_entity(*entity, origin, components, assets, summary);
            }
            return Ok(());
        }

        if instance.is::<ExternalAsset>() {
            if let Some(external) = instance.downcast::<ExternalAsset>() {
                let directory = origin.parent().unwrap_or_else(|| Path::new(""));
                let path = directory.join(&external.file_name);
                self.load_asset_at(&path, Some(external.unique_id()), assets)?;
                summary.external_assets += 1;
                summary.assets += 1;
            }
            return Ok(());
        }

        if !self.context.registry.is_component_instance(instance.as_ref()) {
            assets.add_from(instance, AssetOrigin::Scene, origin);
            summary.assets += 1;
            return Ok(());
        }
        if let Some(mut component) = self.context.registry.into_component(instance) {
            let id = component.unique_id();
            component.set_entity_id(id);
            components.add(component);
            summary.components += 1;
        }
        Ok(())
    }

    fn dissolve_entity(
        &self,
        entity: Entity,
        origin: &Path,
        components: &mut ComponentStore,
        assets: &mut AssetStore,
        summary: &mut LoadSummary,
    ) {
        let registry = &self.context.registry;
        let entity_id = entity.unique_id();
        for object in entity.components {
            if !registry.is_component_instance(object.as_ref()) {
                log::debug!(
                    "Entity {} holds non-component {}, storing it as an asset",
                    entity_id,
                    object.type_name()
                );
                assets.add_from(object, AssetOrigin::Scene, origin);
                summary.assets += 1;
                continue;
            }
            if let Some(mut component) = registry.into_component(object) {
                component.set_entity_id(entity_id);
                components.add(component);
                summary.components += 1;
            }
        }
        summary.entities += 1;
    }
}
