//! Typed nodes to live objects

use thiserror::Error;

use super::attribute::{Attribute, Identifier, NULL_ID};
use super::data_node::{DataNode, NodeAttribute};
use super::registry::{Serialized, TypeRegistry};
use super::unique_id::IdAllocator;

/// Name of the synthetic attribute carrying a node header's parent id
pub const PARENT_ID_ATTRIBUTE: &str = "ParentID";

/// Deserialization failures
#[derive(Debug, Error)]
pub enum DeserializeError {
    /// A node names a type nobody registered
    #[error("Type {name:?} (node {id}) is not registered")]
    UnregisteredType {
        /// Type name from the node
        name: String,
        /// Node id
        id: Identifier,
    },
}

/// Builds live objects from remapped [`DataNode`]s
pub struct Deserializer<'a> {
    registry: &'a TypeRegistry,
    ids: Option<&'a IdAllocator>,
}

impl<'a> Deserializer<'a> {
    /// Deserializer constructing types from `registry`
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry, ids: None }
    }

    /// Prime nested single-object fields of every built object from `ids`
    pub fn with_ids(mut self, ids: &'a IdAllocator) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Build the object for `node` and everything beneath it
    ///
    /// The unique id is applied first and the instance is primed when an
    /// allocator is set. Then a non-zero header parent id is applied as a
    /// `ParentID` attribute, then the node's attributes in stream order, then
    /// each child under its own type name. Any unregistered type in the
    /// subtree fails the whole node.
    ///
    /// A header parent naming the node that encloses this one only records
    /// the nesting and is not applied.
    pub fn deserialize(&self, node: DataNode) -> Result<Box<dyn Serialized>, DeserializeError> {
        self.build(node, NULL_ID)
    }

    /// Build every node of a forest, stopping at the first failure
    pub fn deserialize_all(
        &self,
        nodes: Vec<DataNode>,
    ) -> Result<Vec<Box<dyn Serialized>>, DeserializeError> {
        self.build_all(nodes, NULL_ID)
    }

    fn build_all(
        &self,
        nodes: Vec<DataNode>,
        enclosing: Identifier,
    ) -> Result<Vec<Box<dyn Serialized>>, DeserializeError> {
        nodes.into_iter().map(|node| self.build(node, enclosing)).collect()
    }

    fn build(&self, node: DataNode, enclosing: Identifier) -> Result<Box<dyn Serialized>, DeserializeError> {
        let DataNode {
            unique_id,
            parent_id,
            name,
            attributes,
            nodes,
            ..
        } = node;

        let mut instance = self
            .registry
            .create_instance(&name, None)
            .ok_or_else(|| DeserializeError::UnregisteredType {
                name: name.clone(),
                id: unique_id,
            })?;

        instance.set_unique_id(unique_id);
        if let Some(ids) = self.ids {
            instance.prime(self.registry, ids);
        }
        if parent_id != NULL_ID && parent_id != enclosing {
            instance.set_attribute(Attribute::id(PARENT_ID_ATTRIBUTE, parent_id));
        }

        for attribute in attributes {
            let attribute = match attribute {
                NodeAttribute::Value(attribute) => attribute,
                NodeAttribute::Nested { name, nodes } => {
                    let nested = self.build_all(nodes, unique_id)?;
                    Attribute::class(name, nested)
                }
            };
            instance.set_attribute(attribute);
        }

        for child in nodes {
            let child = self.build(child, unique_id)?;
            let child_name = child.type_name();
            instance.set_attribute(Attribute::class(child_name, vec![child]));
        }

        log::trace!("Deserialized {} {}", name, unique_id);
        Ok(instance)
    }
}
