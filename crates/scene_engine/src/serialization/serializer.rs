//! Live objects to typed nodes
//!
//! Global ids are compacted into file-local ids starting at 1, and every
//! id-typed attribute is rewritten to match. References to objects outside
//! the serialized set are written as [`NULL_ID`].

use std::collections::HashMap;

use thiserror::Error;

use super::attribute::{Attribute, AttributeValue, Identifier, NULL_ID};
use super::data_node::{DataNode, NodeAttribute};
use super::registry::Serialized;

/// Highest local id the 16-bit node header can carry
pub const MAX_LOCAL_ID: Identifier = u16::MAX as Identifier;

/// Serialization failures
#[derive(Debug, Error)]
pub enum SerializeError {
    /// More objects than local ids
    #[error("Cannot serialize more than {limit} objects into one file")]
    TooManyObjects {
        /// Local id limit
        limit: Identifier,
    },
}

/// Builds [`DataNode`]s from live objects
#[derive(Debug, Default)]
pub struct Serializer {
    local_ids: HashMap<Identifier, Identifier>,
    next_local: Identifier,
    emitted: Identifier,
    unresolved: usize,
}

impl Serializer {
    /// Serializer with an empty id table
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize a set of root objects
    ///
    /// Every object reachable from the roots (nested attributes and child
    /// objects) gets a local id before any reference is rewritten, so
    /// references may point forwards or backwards within the set.
    pub fn serialize_all(
        mut self,
        roots: &[&dyn Serialized],
    ) -> Result<Vec<DataNode>, SerializeError> {
        for root in roots {
            self.reserve(*root)?;
        }
        let nodes = roots.iter().map(|root| self.build(*root)).collect();
        if self.unresolved > 0 {
            log::debug!(
                "{} reference(s) point outside the serialized set and were written as {}",
                self.unresolved,
                NULL_ID
            );
        }
        Ok(nodes)
    }

    fn reserve(&mut self, instance: &dyn Serialized) -> Result<(), SerializeError> {
        if self.next_local >= MAX_LOCAL_ID {
            return Err(SerializeError::TooManyObjects { limit: MAX_LOCAL_ID });
        }
        self.next_local += 1;
        let local = self.next_local;
        if instance.unique_id() != NULL_ID {
            self.local_ids.entry(instance.unique_id()).or_insert(local);
        }

        for attribute in instance.get_all_attributes() {
            if let AttributeValue::Class(nested) = attribute.value {
                for object in &nested {
                    self.reserve(object.as_ref())?;
                }
            }
        }
        for child in instance.child_objects() {
            self.reserve(child)?;
        }
        Ok(())
    }

    // Visits objects in the same order as `reserve`, so the running count
    // reproduces each object's local id.
    fn build(&mut self, instance: &dyn Serialized) -> DataNode {
        self.emitted += 1;
        let mut node = DataNode::new(self.emitted, instance.type_name());
        node.tag = instance.node_tag();

        for Attribute { name, value } in instance.get_all_attributes() {
            let slot = match value {
                AttributeValue::Class(nested) => NodeAttribute::Nested {
                    name,
                    nodes: nested.iter().map(|object| self.build(object.as_ref())).collect(),
                },
                AttributeValue::Id(id) => NodeAttribute::Value(Attribute::id(name, self.reference(id))),
                AttributeValue::IdArray(ids) => {
                    let ids = ids.into_iter().map(|id| self.reference(id)).collect();
                    NodeAttribute::Value(Attribute::ids(name, ids))
                }
                value => NodeAttribute::Value(Attribute::new(name, value)),
            };
            node.attributes.push(slot);
        }

        node.nodes = instance
            .child_objects()
            .into_iter()
            .map(|child| self.build(child))
            .collect();
        node
    }

    fn reference(&mut self, global: Identifier) -> Identifier {
        if global == NULL_ID {
            return NULL_ID;
        }
        match self.local_ids.get(&global) {
            Some(&local) => local,
            None => {
                self.unresolved += 1;
                NULL_ID
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::material::Material;
    use crate::ecs::components::transform::TransformComponent;
    use crate::ecs::entity::Entity;
    use crate::serialization::wire::NodeTag;

    fn transform(id: Identifier, parent: Identifier) -> TransformComponent {
        let mut transform = TransformComponent::default();
        transform.set_unique_id(id);
        transform.parent_id = parent;
        transform
    }

    #[test]
    fn test_ids_are_compacted_and_references_follow() {
        let parent = transform(500, 0);
        let child = transform(900, 500);
        let nodes = Serializer::new()
            .serialize_all(&[&parent, &child])
            .unwrap();

        assert_eq!(nodes[0].unique_id, 1);
        assert_eq!(nodes[1].unique_id, 2);
        assert_eq!(nodes[0].attribute("ParentID"), Some(&AttributeValue::Id(0)));
        assert_eq!(nodes[1].attribute("ParentID"), Some(&AttributeValue::Id(1)));
    }

    #[test]
    fn test_outside_references_become_null() {
        let mut material = Material::default();
        material.set_unique_id(30);
        material.shader_id = 31;
        material.texture_uniforms = vec![("albedo".to_string(), 30), ("normal".to_string(), 77)];

        let nodes = Serializer::new().serialize_all(&[&material]).unwrap();
        assert_eq!(nodes[0].attribute("ShaderId"), Some(&AttributeValue::Id(0)));
        assert_eq!(
            nodes[0].attribute("TextureUniformValues"),
            Some(&AttributeValue::IdArray(vec![1, 0]))
        );
    }

    #[test]
    fn test_entity_children_become_child_nodes() {
        let mut entity = Entity::default();
        entity.set_unique_id(42);
        entity.components.push(Box::new(transform(43, 0)));

        let nodes = Serializer::new().serialize_all(&[&entity]).unwrap();
        assert_eq!(nodes[0].tag, NodeTag::Object);
        assert_eq!(nodes[0].nodes.len(), 1);
        assert_eq!(nodes[0].nodes[0].name, "TransformComponent");
        assert_eq!(nodes[0].nodes[0].unique_id, 2);
    }
}
