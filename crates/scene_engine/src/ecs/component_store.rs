//! Component storage
//!
//! Components are grouped by type name, then keyed by entity id. Both levels
//! keep insertion order so iteration is deterministic across runs.

use indexmap::{IndexMap, IndexSet};

use super::component::{Component, EntityId};
use crate::serialization::{SerializedType, NULL_ID};

/// Components of one type, keyed by entity id
pub type ComponentMap = IndexMap<EntityId, Box<dyn Component>>;

/// Store of every live component
#[derive(Default)]
pub struct ComponentStore {
    components: IndexMap<String, ComponentMap>,
}

impl ComponentStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a component under its type name and entity id
    ///
    /// An existing component with the same key is replaced and returned.
    pub fn add(&mut self, component: Box<dyn Component>) -> Option<Box<dyn Component>> {
        let type_name = component.type_name();
        let entity_id = component.entity_id();
        let replaced = self
            .components
            .entry(type_name.to_string())
            .or_default()
            .insert(entity_id, component);
        if replaced.is_some() {
            log::trace!("Replaced {} of entity {}", type_name, entity_id);
        }
        replaced
    }

    /// Component of a type for an entity, or the first of that type for entity 0
    pub fn get_of_type(&self, type_name: &str, entity_id: EntityId) -> Option<&dyn Component> {
        let map = self.components.get(type_name)?;
        let component = if entity_id == NULL_ID {
            map.values().next()
        } else {
            map.get(&entity_id)
        }?;
        Some(&**component)
    }

    /// Mutable variant of [`ComponentStore::get_of_type`]
    pub fn get_of_type_mut(
        &mut self,
        type_name: &str,
        entity_id: EntityId,
    ) -> Option<&mut dyn Component> {
        let map = self.components.get_mut(type_name)?;
        let component = if entity_id == NULL_ID {
            map.values_mut().next()
        } else {
            map.get_mut(&entity_id)
        }?;
        Some(&mut **component)
    }

    /// Live map of every component of a type
    pub fn iter_of_type(&self, type_name: &str) -> Option<&ComponentMap> {
        self.components.get(type_name)
    }

    /// Mutable live map of every component of a type
    pub fn iter_of_type_mut(&mut self, type_name: &str) -> Option<&mut ComponentMap> {
        self.components.get_mut(type_name)
    }

    /// Typed lookup, with the same entity 0 rule as [`ComponentStore::get_of_type`]
    pub fn get<T: Component + SerializedType>(&self, entity_id: EntityId) -> Option<&T> {
        self.get_of_type(T::TYPE_NAME, entity_id)?.downcast_ref::<T>()
    }

    /// Mutable typed lookup
    pub fn get_mut<T: Component + SerializedType>(&mut self, entity_id: EntityId) -> Option<&mut T> {
        self.get_of_type_mut(T::TYPE_NAME, entity_id)?.downcast_mut::<T>()
    }

    /// Every component of type `T` with its entity id, in insertion order
    pub fn iter<T: Component + SerializedType>(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.components
            .get(T::TYPE_NAME)
            .into_iter()
            .flat_map(|map| map.iter())
            .filter_map(|(id, c)| c.downcast_ref::<T>().map(|c| (*id, c)))
    }

    /// Mutable variant of [`ComponentStore::iter`]
    pub fn iter_mut<T: Component + SerializedType>(
        &mut self,
    ) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.components
            .get_mut(T::TYPE_NAME)
            .into_iter()
            .flat_map(|map| map.iter_mut())
            .filter_map(|(id, c)| c.downcast_mut::<T>().map(|c| (*id, c)))
    }

    /// Move a component to another entity id, keeping its position in the map
    ///
    /// The component's own entity id is updated too. Returns false when no
    /// component of that type is stored under `old_entity`.
    pub fn update_entity_id(
        &mut self,
        type_name: &str,
        old_entity: EntityId,
        new_entity: EntityId,
    ) -> bool {
        let Some(map) = self.components.get_mut(type_name) else {
            return false;
        };
        let Some((index, _, mut component)) = map.shift_remove_full(&old_entity) else {
            return false;
        };
        component.set_entity_id(new_entity);
        if map.contains_key(&new_entity) {
            log::trace!("Entity {} already had a {}, replacing it", new_entity, type_name);
            map.insert(new_entity, component);
        } else {
            map.shift_insert(index.min(map.len()), new_entity, component);
        }
        true
    }

    /// Remove a component
    pub fn remove(&mut self, type_name: &str, entity_id: EntityId) -> Option<Box<dyn Component>> {
        self.components.get_mut(type_name)?.shift_remove(&entity_id)
    }

    /// Every component attached to an entity, in type insertion order
    pub fn entity_components(&self, entity_id: EntityId) -> impl Iterator<Item = &dyn Component> {
        self.components
            .values()
            .filter_map(move |map| map.get(&entity_id))
            .map(|c| &**c)
    }

    /// Distinct entity ids, in first-seen order
    pub fn entity_ids(&self) -> Vec<EntityId> {
        let ids: IndexSet<EntityId> = self
            .components
            .values()
            .flat_map(|map| map.keys().copied())
            .collect();
        ids.into_iter().collect()
    }

    /// Stored type names, in insertion order
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    /// Total number of components
    pub fn len(&self) -> usize {
        self.components.values().map(IndexMap::len).sum()
    }

    /// True when no component is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every component
    pub fn clear(&mut self) {
        self.components.clear();
    }
}

impl std::fmt::Debug for ComponentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.components.iter().map(|(name, map)| (name, map.len())))
            .finish()
    }
}
