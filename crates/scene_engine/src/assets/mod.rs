//! Asset management system
//!
//! Assets are any deserialized object that is not a component: materials,
//! meshes, shaders. The [`AssetStore`] indexes them by type name and global id
//! and remembers which file each one came from.

pub mod external;
pub mod material;
pub mod mesh;
pub mod shader;

pub use external::ExternalAsset;
pub use material::Material;
pub use mesh::Mesh;
pub use shader::{Shader, ShaderSource};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::serialization::{Identifier, Serialized, SerializedType, TypeRegistry};

/// Register every built-in asset type
pub fn register_types(registry: &mut TypeRegistry) {
    registry
        .register::<Material>()
        .register::<Mesh>()
        .register::<Shader>()
        .register::<ShaderSource>()
        .register::<ExternalAsset>();
}

/// Where a stored asset was loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetOrigin {
    /// Declared inline in a scene file
    Scene,
    /// Loaded from its own asset file
    External,
}

/// File an asset was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSource {
    /// Inline or external
    pub origin: AssetOrigin,
    /// File the asset was read from
    pub file_name: PathBuf,
}

/// Live assets keyed by type name, then global id
#[derive(Default)]
pub struct AssetStore {
    assets: IndexMap<String, IndexMap<Identifier, Box<dyn Serialized>>>,
    sources: HashMap<Identifier, AssetSource>,
}

impl AssetStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an asset under its type name and unique id
    ///
    /// An existing asset with the same key is replaced and returned.
    pub fn add(&mut self, asset: Box<dyn Serialized>) -> Option<Box<dyn Serialized>> {
        let type_name = asset.type_name();
        let id = asset.unique_id();
        let replaced = self
            .assets
            .entry(type_name.to_string())
            .or_default()
            .insert(id, asset);
        if replaced.is_some() {
            log::debug!("Replaced {} asset {}", type_name, id);
        }
        replaced
    }

    /// Insert an asset and record the file it came from
    pub fn add_from(
        &mut self,
        asset: Box<dyn Serialized>,
        origin: AssetOrigin,
        file_name: impl Into<PathBuf>,
    ) -> Option<Box<dyn Serialized>> {
        self.sources.insert(
            asset.unique_id(),
            AssetSource {
                origin,
                file_name: file_name.into(),
            },
        );
        self.add(asset)
    }

    /// Asset of a type by id
    pub fn get(&self, type_name: &str, id: Identifier) -> Option<&dyn Serialized> {
        let asset = self.assets.get(type_name)?.get(&id)?;
        Some(&**asset)
    }

    /// Mutable asset of a type by id
    pub fn get_mut(&mut self, type_name: &str, id: Identifier) -> Option<&mut dyn Serialized> {
        let asset = self.assets.get_mut(type_name)?.get_mut(&id)?;
        Some(&mut **asset)
    }

    /// Typed lookup by id
    pub fn get_typed<T: Serialized + SerializedType>(&self, id: Identifier) -> Option<&T> {
        self.get(T::TYPE_NAME, id)?.downcast_ref::<T>()
    }

    /// Asset of any type by id
    pub fn find_by_id(&self, id: Identifier) -> Option<&dyn Serialized> {
        self.assets
            .values()
            .find_map(|map| map.get(&id))
            .map(|asset| &**asset)
    }

    /// Every asset of a type, in insertion order
    pub fn iter_of_type<'s>(&'s self, type_name: &str) -> impl Iterator<Item = &'s dyn Serialized> {
        self.assets
            .get(type_name)
            .into_iter()
            .flat_map(|map| map.values())
            .map(|asset| &**asset)
    }

    /// Every asset, grouped by type in insertion order
    pub fn iter_all(&self) -> impl Iterator<Item = &dyn Serialized> {
        self.assets
            .values()
            .flat_map(|map| map.values())
            .map(|asset| &**asset)
    }

    /// Every asset of type `T`
    pub fn iter<T: Serialized + SerializedType>(&self) -> impl Iterator<Item = &T> {
        self.iter_of_type(T::TYPE_NAME)
            .filter_map(|asset| asset.downcast_ref::<T>())
    }

    /// Remove one asset
    pub fn remove(&mut self, type_name: &str, id: Identifier) -> Option<Box<dyn Serialized>> {
        let removed = self.assets.get_mut(type_name)?.shift_remove(&id);
        if removed.is_some() {
            self.sources.remove(&id);
        }
        removed
    }

    /// Drop every asset of a type; returns how many were removed
    pub fn remove_type(&mut self, type_name: &str) -> usize {
        let Some(map) = self.assets.shift_remove(type_name) else {
            return 0;
        };
        for id in map.keys() {
            self.sources.remove(id);
        }
        map.len()
    }

    /// File an asset was loaded from
    pub fn source(&self, id: Identifier) -> Option<&AssetSource> {
        self.sources.get(&id)
    }

    /// Ids and paths of every asset loaded from its own file
    pub fn external_paths(&self) -> impl Iterator<Item = (Identifier, &Path)> {
        self.sources
            .iter()
            .filter(|(_, source)| source.origin == AssetOrigin::External)
            .map(|(id, source)| (*id, source.file_name.as_path()))
    }

    /// Stored type names, in insertion order
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(String::as_str)
    }

    /// Total number of assets
    pub fn len(&self) -> usize {
        self.assets.values().map(IndexMap::len).sum()
    }

    /// True when no asset is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every asset
    pub fn clear(&mut self) {
        self.assets.clear();
        self.sources.clear();
    }
}

impl std::fmt::Debug for AssetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.assets.iter().map(|(name, map)| (name, map.len())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(id: Identifier, name: &str) -> Box<dyn Serialized> {
        let mut material = Material::named(name);
        material.set_unique_id(id);
        Box::new(material)
    }

    fn mesh(id: Identifier) -> Box<dyn Serialized> {
        let mut mesh = Mesh::default();
        mesh.set_unique_id(id);
        Box::new(mesh)
    }

    #[test]
    fn test_lookup_by_type_and_id() {
        let mut store = AssetStore::new();
        store.add(material(3, "stone"));
        store.add(mesh(4));

        assert_eq!(store.get("Material", 3).unwrap().unique_id(), 3);
        assert!(store.get("Material", 4).is_none());
        assert_eq!(store.get_typed::<Material>(3).unwrap().name, "stone");
        assert!(store.get_typed::<Mesh>(3).is_none());
        assert_eq!(store.find_by_id(4).unwrap().type_name(), "Mesh");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_replace_and_iterate() {
        let mut store = AssetStore::new();
        store.add(material(5, "a"));
        store.add(material(2, "b"));
        assert!(store.add(material(5, "c")).is_some());

        let names: Vec<_> = store.iter::<Material>().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["c", "b"]);
        assert_eq!(store.iter_of_type("Mesh").count(), 0);
    }

    #[test]
    fn test_remove_type_forgets_sources() {
        let mut store = AssetStore::new();
        store.add_from(material(7, "ext"), AssetOrigin::External, "assets/ext.ssd");
        store.add_from(mesh(8), AssetOrigin::Scene, "scene.ssd");

        let external: Vec<_> = store.external_paths().collect();
        assert_eq!(external, vec![(7, Path::new("assets/ext.ssd"))]);
        assert_eq!(store.source(8).unwrap().origin, AssetOrigin::Scene);

        assert_eq!(store.remove_type("Material"), 1);
        assert_eq!(store.remove_type("Material"), 0);
        assert!(store.source(7).is_none());
        assert!(store.remove("Mesh", 8).is_some());
        assert!(store.is_empty());
    }
}
