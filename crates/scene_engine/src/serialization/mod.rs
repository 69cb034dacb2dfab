//! Scene description serialization
//!
//! The load path runs in four stages:
//!
//! 1. [`reader`] parses the binary stream into [`wire::RawNode`]s
//! 2. [`data_node`] decodes payloads into typed [`DataNode`]s
//! 3. [`unique_id`] replaces file-local ids with global ids
//! 4. [`deserializer`] builds live objects through the [`TypeRegistry`]
//!
//! [`serializer`] and [`writer`] run the same stages backwards.

pub mod attribute;
pub mod data_node;
pub mod deserializer;
pub mod reader;
pub mod registry;
pub mod serializer;
pub mod unique_id;
pub mod wire;
pub mod writer;

pub use attribute::{Attribute, AttributeValue, Identifier, NULL_ID};
pub use data_node::{DataNode, EncodeError, NodeAttribute};
pub use deserializer::{DeserializeError, Deserializer};
pub use reader::{ReadError, SceneDocument, SceneReader};
pub use registry::{Serialized, SerializedBase, SerializedType, TypeRegistry};
pub use serializer::{SerializeError, Serializer};
pub use unique_id::{IdAllocator, IdSpaceExhausted, RemapReport, UniqueIdSetter};
pub use wire::{DataKind, Header, NodeTag};
pub use writer::{SceneWriter, WriteError};

/// Shared state every loader and saver needs
///
/// Construct once at startup and pass by reference; the id allocator keeps
/// ids unique across every file loaded through the same context.
#[derive(Debug, Default)]
pub struct SerializationContext {
    /// Known types
    pub registry: TypeRegistry,
    /// Unique id source
    pub ids: IdAllocator,
}

impl SerializationContext {
    /// Context over an existing registry
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            registry,
            ids: IdAllocator::new(),
        }
    }

    /// Context holding every built-in type
    pub fn with_builtin_types() -> Self {
        Self::new(TypeRegistry::with_builtin_types())
    }

    /// Default-construct a registered type with a fresh id
    ///
    /// `None` for unknown names and once the id space is exhausted.
    pub fn create_instance(&self, type_name: &str) -> Option<Box<dyn Serialized>> {
        self.registry.create_instance(type_name, Some(&self.ids))
    }
}
