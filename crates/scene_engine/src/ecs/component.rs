//! Component trait

use crate::serialization::{Identifier, Serialized};

/// Entity identifier, shared with the global unique id space
pub type EntityId = Identifier;

/// Serializable data attached to an entity
///
/// A component's entity id is runtime state, never an attribute: it is set
/// when the component is handed to the store.
pub trait Component: Serialized {
    /// Owning entity, 0 while unattached
    fn entity_id(&self) -> EntityId;

    /// Attach to an entity
    fn set_entity_id(&mut self, entity_id: EntityId);
}

impl dyn Component {
    /// Downcast a borrowed component
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Downcast a mutably borrowed component
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}
