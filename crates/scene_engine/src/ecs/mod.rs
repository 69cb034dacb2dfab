//! Entity Component System
//!
//! Entities are bare ids. Components live in a [`ComponentStore`] keyed by
//! type name and entity id; systems read and write them once per step.

pub mod component;
pub mod component_store;
pub mod components;
pub mod entity;
pub mod system;
pub mod systems;

pub use component::{Component, EntityId};
pub use component_store::{ComponentMap, ComponentStore};
pub use entity::{is_valid_entity, Entity, EntityError, EntityManager};
pub use system::{System, SystemRunner};
pub use systems::{TransformPassReport, TransformSystem, MAX_HIERARCHY_DEPTH};
