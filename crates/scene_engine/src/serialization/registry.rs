//! Reflection contract and type registry
//!
//! Every type that can appear in a scene file implements [`Serialized`]:
//! it owns a unique id, reports a stable type name and exposes its state as
//! named [`Attribute`]s. The [`TypeRegistry`] maps type names read from disk
//! to constructors.

use std::any::{self, Any};
use std::collections::HashMap;
use std::fmt;

use super::attribute::{Attribute, Identifier};
use super::unique_id::IdAllocator;
use super::wire::NodeTag;
use crate::ecs::component::Component;

/// Object-safe plumbing shared by every [`Serialized`] type
///
/// Implemented automatically for any `Serialized + Clone` type.
pub trait SerializedBase {
    /// Borrow as [`Any`] for downcasting
    fn as_any(&self) -> &dyn Any;
    /// Mutably borrow as [`Any`] for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Convert into a boxed [`Any`] for owned downcasting
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    /// Clone behind a box
    fn clone_boxed(&self) -> Box<dyn Serialized>;
}

impl<T: Serialized + Clone> SerializedBase for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_boxed(&self) -> Box<dyn Serialized> {
        Box::new(self.clone())
    }
}

/// Compile-time type name of a serializable type
///
/// Used by typed lookups that have no instance at hand.
pub trait SerializedType {
    /// Name written to and matched against scene files
    const TYPE_NAME: &'static str;
}

/// Reflection contract for anything that can be loaded from a scene file
pub trait Serialized: SerializedBase + fmt::Debug + 'static {
    /// Stable type name, matching the node name on disk
    fn type_name(&self) -> &'static str;

    /// Globally unique id, [`super::NULL_ID`] until assigned
    fn unique_id(&self) -> Identifier;

    /// Assign the unique id
    fn set_unique_id(&mut self, id: Identifier);

    /// Names accepted by [`Serialized::get_attribute`], in declaration order
    fn attribute_names(&self) -> &'static [&'static str];

    /// Apply an attribute
    ///
    /// Unknown names and mismatched element types leave the object unchanged.
    fn set_attribute(&mut self, attribute: Attribute);

    /// Current value of a declared attribute
    fn get_attribute(&self, name: &str) -> Option<Attribute>;

    /// Every declared attribute, in declaration order
    fn get_all_attributes(&self) -> Vec<Attribute> {
        self.attribute_names()
            .iter()
            .filter_map(|name| self.get_attribute(name))
            .collect()
    }

    /// Apply several attributes in order
    fn set_attributes(&mut self, attributes: Vec<Attribute>) {
        for attribute in attributes {
            self.set_attribute(attribute);
        }
    }

    /// Objects written as child nodes rather than attributes
    fn child_objects(&self) -> Vec<&dyn Serialized> {
        Vec::new()
    }

    /// Structural tag written to the node header
    fn node_tag(&self) -> NodeTag {
        NodeTag::Data
    }

    /// Materialize nested single-object fields on a freshly created instance
    fn prime(&mut self, _registry: &TypeRegistry, _ids: &IdAllocator) {}
}

impl dyn Serialized {
    /// True when the concrete type is `T`
    pub fn is<T: Serialized>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcast a borrowed instance
    pub fn downcast_ref<T: Serialized>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Downcast a mutably borrowed instance
    pub fn downcast_mut<T: Serialized>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Downcast an owned instance
    ///
    /// The instance is dropped on mismatch; test with [`is`](Self::is) first to keep it.
    pub fn downcast<T: Serialized>(self: Box<Self>) -> Option<Box<T>> {
        self.into_any().downcast::<T>().ok()
    }
}

impl Clone for Box<dyn Serialized> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

type Constructor = fn() -> Box<dyn Serialized>;
type InstanceCheck = fn(&dyn Serialized) -> bool;
type ComponentCast = fn(Box<dyn Serialized>) -> Option<Box<dyn Component>>;

#[derive(Clone, Copy)]
struct TypeEntry {
    display_name: &'static str,
    constructor: Constructor,
    is_instance: InstanceCheck,
    component: Option<ComponentCast>,
}

fn construct<T: Serialized + Default>() -> Box<dyn Serialized> {
    Box::new(T::default())
}

fn is_instance<T: Serialized>(instance: &dyn Serialized) -> bool {
    instance.is::<T>()
}

fn cast_component<T: Component>(instance: Box<dyn Serialized>) -> Option<Box<dyn Component>> {
    instance.downcast::<T>().map(|component| component as Box<dyn Component>)
}

/// Name-to-constructor registry
///
/// Built once at startup and then shared read-only with every loader.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeEntry>,
    display_names: HashMap<&'static str, &'static str>,
}

impl TypeRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in component and asset type
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        registry.register::<crate::ecs::entity::Entity>();
        crate::ecs::components::register_types(&mut registry);
        crate::assets::register_types(&mut registry);
        registry
    }

    /// Register a plain serializable type under its [`SerializedType::TYPE_NAME`]
    pub fn register<T: Serialized + SerializedType + Default>(&mut self) -> &mut Self {
        self.insert::<T>(TypeEntry {
            display_name: T::TYPE_NAME,
            constructor: construct::<T>,
            is_instance: is_instance::<T>,
            component: None,
        })
    }

    /// Register a component type, enabling [`TypeRegistry::into_component`] for it
    pub fn register_component<T: Component + SerializedType + Default>(&mut self) -> &mut Self {
        self.insert::<T>(TypeEntry {
            display_name: T::TYPE_NAME,
            constructor: construct::<T>,
            is_instance: is_instance::<T>,
            component: Some(cast_component::<T>),
        })
    }

    fn insert<T: 'static>(&mut self, entry: TypeEntry) -> &mut Self {
        if self.types.contains_key(entry.display_name) {
            log::warn!("Type {} is already registered, keeping the first registration", entry.display_name);
            return self;
        }
        log::trace!("Registered type {}", entry.display_name);
        self.display_names.insert(any::type_name::<T>(), entry.display_name);
        self.types.insert(entry.display_name.to_string(), entry);
        self
    }

    /// Make `alias` construct the same type as `type_name`
    ///
    /// Returns false when `type_name` is unknown or `alias` is taken.
    pub fn register_alias(&mut self, alias: &str, type_name: &str) -> bool {
        if self.types.contains_key(alias) {
            log::warn!("Alias {} is already registered", alias);
            return false;
        }
        match self.types.get(type_name).copied() {
            Some(entry) => {
                self.types.insert(alias.to_string(), entry);
                true
            }
            None => {
                log::warn!("Cannot alias {} to unregistered type {}", alias, type_name);
                false
            }
        }
    }

    /// True when `type_name` (or an alias) is registered
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// True when `type_name` is registered as a component
    pub fn is_component(&self, type_name: &str) -> bool {
        self.types
            .get(type_name)
            .map_or(false, |entry| entry.component.is_some())
    }

    /// True when `instance` can be moved into [`TypeRegistry::into_component`]
    pub fn is_component_instance(&self, instance: &dyn Serialized) -> bool {
        self.types
            .get(instance.type_name())
            .map_or(false, |entry| entry.component.is_some() && (entry.is_instance)(instance))
    }

    /// Canonical name a registered name or alias resolves to
    pub fn canonical_name(&self, type_name: &str) -> Option<&'static str> {
        self.types.get(type_name).map(|entry| entry.display_name)
    }

    /// Display name for a Rust type name as returned by [`std::any::type_name`]
    pub fn display_name(&self, rust_type_name: &str) -> Option<&'static str> {
        self.display_names.get(rust_type_name).copied()
    }

    /// Display name registered for `T`
    pub fn display_name_of<T: 'static>(&self) -> Option<&'static str> {
        self.display_name(any::type_name::<T>())
    }

    /// Registered names, aliases included, in no particular order
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Default-construct an instance by name
    ///
    /// With an allocator the instance receives a fresh unique id and its
    /// nested single-object fields are primed. Returns `None` for unknown
    /// names and when the allocator is exhausted.
    pub fn create_instance(
        &self,
        type_name: &str,
        ids: Option<&IdAllocator>,
    ) -> Option<Box<dyn Serialized>> {
        let entry = self.types.get(type_name)?;
        let mut instance = (entry.constructor)();
        if let Some(ids) = ids {
            instance.set_unique_id(ids.next_id().ok()?);
            instance.prime(self, ids);
        }
        Some(instance)
    }

    /// Default-construct an instance and downcast it
    pub fn create<T: Serialized>(&self, type_name: &str, ids: Option<&IdAllocator>) -> Option<Box<T>> {
        self.create_instance(type_name, ids)?.downcast::<T>()
    }

    /// Convert an instance to a component if its type was registered as one
    ///
    /// Non-components are dropped; check [`TypeRegistry::is_component_instance`]
    /// first to keep them.
    pub fn into_component(&self, instance: Box<dyn Serialized>) -> Option<Box<dyn Component>> {
        let cast = self.types.get(instance.type_name())?.component?;
        cast(instance)
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.type_names().collect();
        names.sort_unstable();
        f.debug_struct("TypeRegistry").field("types", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::material::Material;
    use crate::ecs::components::transform::TransformComponent;
    use crate::ecs::components::light::LightComponent;

    #[test]
    fn test_builtin_types_are_registered() {
        let registry = TypeRegistry::with_builtin_types();
        for name in [
            "Entity",
            "TransformComponent",
            "Transform",
            "LightComponent",
            "RendererComponent",
            "ObjectMetadataComponent",
            "Material",
            "Mesh",
            "Shader",
            "ShaderSource",
            "ExternalAsset",
            "ShadowSettings",
        ] {
            assert!(registry.is_registered(name), "{} missing", name);
        }
        assert!(registry.is_component("TransformComponent"));
        assert!(registry.is_component("Transform"));
        assert!(!registry.is_component("Material"));
        assert_eq!(registry.canonical_name("Light"), Some("LightComponent"));
    }

    #[test]
    fn test_create_instance_assigns_ids_only_when_asked() {
        let registry = TypeRegistry::with_builtin_types();
        let ids = IdAllocator::new();

        let bare = registry.create_instance("Material", None).unwrap();
        assert_eq!(bare.unique_id(), 0);
        assert_eq!(bare.type_name(), "Material");

        let first = registry.create_instance("Material", Some(&ids)).unwrap();
        let second = registry.create_instance("Material", Some(&ids)).unwrap();
        assert_ne!(first.unique_id(), 0);
        assert_ne!(first.unique_id(), second.unique_id());

        assert!(registry.create_instance("Nope", Some(&ids)).is_none());
    }

    #[test]
    fn test_create_primes_nested_fields() {
        let registry = TypeRegistry::with_builtin_types();
        let ids = IdAllocator::new();
        let light = registry.create::<LightComponent>("LightComponent", Some(&ids)).unwrap();
        let shadow = light.shadow.as_ref().unwrap();
        assert_ne!(shadow.unique_id(), 0);
        assert_ne!(shadow.unique_id(), light.unique_id());

        let unprimed = registry.create::<LightComponent>("LightComponent", None).unwrap();
        assert!(unprimed.shadow.is_none());
    }

    #[test]
    fn test_display_names() {
        let registry = TypeRegistry::with_builtin_types();
        assert_eq!(registry.display_name_of::<TransformComponent>(), Some("TransformComponent"));
        assert_eq!(registry.display_name_of::<Material>(), Some("Material"));
        assert_eq!(registry.display_name_of::<u32>(), None);
    }

    #[test]
    fn test_aliases_and_duplicates() {
        let mut registry = TypeRegistry::new();
        registry.register::<Material>().register::<Material>();
        assert!(registry.register_alias("Mat", "Material"));
        assert!(!registry.register_alias("Mat", "Material"));
        assert!(!registry.register_alias("Tex", "Texture"));
        assert_eq!(registry.create_instance("Mat", None).unwrap().type_name(), "Material");
    }

    #[test]
    fn test_component_conversion() {
        let registry = TypeRegistry::with_builtin_types();
        let transform = registry.create_instance("Transform", None).unwrap();
        assert!(registry.is_component_instance(transform.as_ref()));
        let component = registry.into_component(transform).unwrap();
        assert_eq!(component.type_name(), "TransformComponent");

        let material = registry.create_instance("Material", None).unwrap();
        assert!(!registry.is_component_instance(material.as_ref()));
        assert!(registry.into_component(material).is_none());
    }

    #[test]
    fn test_downcasts() {
        let registry = TypeRegistry::with_builtin_types();
        let mut instance = registry.create_instance("Material", None).unwrap();
        assert!(instance.is::<Material>());
        assert!(instance.downcast_ref::<TransformComponent>().is_none());
        instance.downcast_mut::<Material>().unwrap().name = "stone".to_string();
        let cloned = instance.clone();
        let material = cloned.downcast::<Material>().unwrap();
        assert_eq!(material.name, "stone");
    }

    #[test]
    fn test_downcast_mismatch_returns_none() {
        let registry = TypeRegistry::with_builtin_types();
        let instance = registry.create_instance("Material", None).unwrap();
        assert!(!instance.is::<TransformComponent>());
        assert!(instance.downcast::<TransformComponent>().is_none());
        assert!(registry.create::<TransformComponent>("Material", None).is_none());
    }

    #[test]
    fn test_exhausted_allocator_creates_nothing() {
        let registry = TypeRegistry::with_builtin_types();
        let ids = IdAllocator::starting_at(u32::MAX);
        assert!(registry.create_instance("Material", Some(&ids)).is_none());
        assert!(registry.create_instance("Material", None).is_some());
    }
}
