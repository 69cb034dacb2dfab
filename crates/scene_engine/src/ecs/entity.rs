//! Entities
//!
//! An entity is only an id. [`Entity`] is the grouping node scene files use
//! to list the components of one entity; it is dissolved into the component
//! store at load time and never kept.

use thiserror::Error;

use super::component::{Component, EntityId};
use super::component_store::ComponentStore;
use crate::serialization::{
    Attribute, AttributeValue, IdSpaceExhausted, Identifier, NodeTag, SerializationContext,
    Serialized, SerializedType, NULL_ID,
};

/// Grouping node holding the components of one entity
#[derive(Debug, Clone, Default)]
pub struct Entity {
    unique_id: Identifier,
    /// Grouped objects in file order
    pub components: Vec<Box<dyn Serialized>>,
}

impl Entity {
    /// Entity node with an id and no components
    pub fn new(unique_id: Identifier) -> Self {
        Self {
            unique_id,
            components: Vec::new(),
        }
    }
}

impl SerializedType for Entity {
    const TYPE_NAME: &'static str = "Entity";
}

impl Serialized for Entity {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn unique_id(&self) -> Identifier {
        self.unique_id
    }

    fn set_unique_id(&mut self, id: Identifier) {
        self.unique_id = id;
    }

    fn attribute_names(&self) -> &'static [&'static str] {
        &[]
    }

    fn set_attribute(&mut self, attribute: Attribute) {
        match attribute.value {
            AttributeValue::Class(instances) => self.components.extend(instances),
            _ => log::trace!("Entity ignored attribute {:?}", attribute.name),
        }
    }

    fn get_attribute(&self, name: &str) -> Option<Attribute> {
        let matching: Vec<Box<dyn Serialized>> = self
            .components
            .iter()
            .filter(|c| c.type_name() == name)
            .map(|c| c.clone_boxed())
            .collect();
        if matching.is_empty() {
            None
        } else {
            Some(Attribute::class(name, matching))
        }
    }

    fn get_all_attributes(&self) -> Vec<Attribute> {
        Vec::new()
    }

    fn child_objects(&self) -> Vec<&dyn Serialized> {
        self.components.iter().map(|c| &**c).collect()
    }

    fn node_tag(&self) -> NodeTag {
        NodeTag::Object
    }
}

/// Entity creation failures
#[derive(Debug, Error)]
pub enum EntityError {
    /// The type name is not registered
    #[error("Component type {0:?} is not registered")]
    UnregisteredType(String),

    /// The type is registered but is not a component
    #[error("Type {0:?} is not a component")]
    NotAComponent(String),

    /// No id left for the entity or one of its components
    #[error(transparent)]
    IdSpaceExhausted(#[from] IdSpaceExhausted),
}

/// Creates entities and attaches registry-built components to them
pub struct EntityManager<'a> {
    context: &'a SerializationContext,
}

impl<'a> EntityManager<'a> {
    /// Manager drawing types and ids from `context`
    pub fn new(context: &'a SerializationContext) -> Self {
        Self { context }
    }

    /// Allocate a new entity id and attach one default component per type name
    ///
    /// Every type is checked before anything is created, so a failure leaves
    /// the store untouched.
    pub fn create_entity(
        &self,
        store: &mut ComponentStore,
        component_types: &[&str],
    ) -> Result<EntityId, EntityError> {
        for type_name in component_types {
            self.check_component_type(type_name)?;
        }
        let entity_id = self.context.ids.next_id()?;
        for type_name in component_types {
            self.add_component(store, type_name, entity_id)?;
        }
        log::debug!("Created entity {} with {:?}", entity_id, component_types);
        Ok(entity_id)
    }

    /// Attach a default component of `type_name` to `entity_id`
    pub fn add_component<'s>(
        &self,
        store: &'s mut ComponentStore,
        type_name: &str,
        entity_id: EntityId,
    ) -> Result<&'s mut dyn Component, EntityError> {
        self.check_component_type(type_name)?;
        let instance = self
            .context
            .create_instance(type_name)
            .ok_or(EntityError::IdSpaceExhausted(IdSpaceExhausted))?;
        let mut component = self
            .context
            .registry
            .into_component(instance)
            .ok_or_else(|| EntityError::NotAComponent(type_name.to_string()))?;
        component.set_entity_id(entity_id);
        let stored_type = component.type_name();
        store.add(component);
        store
            .get_of_type_mut(stored_type, entity_id)
            .ok_or_else(|| EntityError::UnregisteredType(type_name.to_string()))
    }

    fn check_component_type(&self, type_name: &str) -> Result<(), EntityError> {
        let registry = &self.context.registry;
        if !registry.is_registered(type_name) {
            return Err(EntityError::UnregisteredType(type_name.to_string()));
        }
        if !registry.is_component(type_name) {
            return Err(EntityError::NotAComponent(type_name.to_string()));
        }
        Ok(())
    }
}

/// True when `id` can name an entity
pub fn is_valid_entity(id: EntityId) -> bool {
    id != NULL_ID
}
