//! Typed node tree
//!
//! A [`DataNode`] is a [`RawNode`] whose payloads have been decoded into
//! [`AttributeValue`]s. Ids are widened to [`Identifier`] so the tree can hold
//! global ids after remapping; they must fit back into 16 bits before the
//! tree is written out again.

use thiserror::Error;

use super::attribute::{Attribute, AttributeValue, Identifier};
use super::wire::{DataKind, NodeTag, RawAttribute, RawNode, RawPayload};

/// Typed tree conversion failures
#[derive(Debug, Error)]
pub enum EncodeError {
    /// An id does not fit the 16-bit wire field
    #[error("Node {node:?} id {id} does not fit in 16 bits")]
    IdOutOfRange {
        /// Node type name
        node: String,
        /// Offending id
        id: Identifier,
    },

    /// A live object was left in the tree instead of nested nodes
    #[error("Attribute {attribute:?} of node {node:?} holds live objects")]
    LiveInstance {
        /// Node type name
        node: String,
        /// Attribute name
        attribute: String,
    },
}

/// Attribute slot of a [`DataNode`]
#[derive(Debug, Clone, PartialEq)]
pub enum NodeAttribute {
    /// Scalar, array or string value
    Value(Attribute),
    /// Embedded nodes that still have to be deserialized
    Nested {
        /// Attribute name
        name: String,
        /// Embedded nodes in stream order
        nodes: Vec<DataNode>,
    },
}

impl NodeAttribute {
    /// Attribute name
    pub fn name(&self) -> &str {
        match self {
            Self::Value(attribute) => &attribute.name,
            Self::Nested { name, .. } => name,
        }
    }
}

/// Node with decoded attribute values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataNode {
    /// Local id before remapping, global id afterwards
    pub unique_id: Identifier,
    /// Parent id carried in the node header, 0 for none
    pub parent_id: Identifier,
    /// Structural tag
    pub tag: NodeTag,
    /// Type name
    pub name: String,
    /// Attributes in stream order
    pub attributes: Vec<NodeAttribute>,
    /// Child nodes in stream order
    pub nodes: Vec<DataNode>,
}

impl DataNode {
    /// Node with no attributes or children
    pub fn new(unique_id: Identifier, name: impl Into<String>) -> Self {
        Self {
            unique_id,
            name: name.into(),
            ..Self::default()
        }
    }

    /// Decode a raw node
    ///
    /// Attributes of unknown or payload-less kinds are dropped.
    pub fn from_raw(raw: RawNode) -> Self {
        let node_name = raw.name;
        let attributes = raw
            .attributes
            .into_iter()
            .filter_map(|attribute| decode_attribute(&node_name, attribute))
            .collect();
        Self {
            unique_id: Identifier::from(raw.id),
            parent_id: Identifier::from(raw.parent_id),
            tag: raw.tag,
            name: node_name,
            attributes,
            nodes: raw.nodes.into_iter().map(Self::from_raw).collect(),
        }
    }

    /// Encode back into a raw node
    pub fn into_raw(self) -> Result<RawNode, EncodeError> {
        let id = narrow_id(&self.name, self.unique_id)?;
        let parent_id = narrow_id(&self.name, self.parent_id)?;
        let mut attributes = Vec::with_capacity(self.attributes.len());
        for attribute in self.attributes {
            attributes.push(encode_attribute(&self.name, attribute)?);
        }
        let nodes = self
            .nodes
            .into_iter()
            .map(Self::into_raw)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RawNode {
            id,
            parent_id,
            tag: self.tag,
            name: self.name,
            attributes,
            nodes,
        })
    }

    /// Typed attribute by name
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.iter().find_map(|attribute| match attribute {
            NodeAttribute::Value(a) if a.name == name => Some(&a.value),
            _ => None,
        })
    }

    /// Number of nodes in this subtree, nested attribute nodes included
    pub fn subtree_len(&self) -> usize {
        let nested: usize = self
            .attributes
            .iter()
            .map(|attribute| match attribute {
                NodeAttribute::Nested { nodes, .. } => nodes.iter().map(Self::subtree_len).sum(),
                NodeAttribute::Value(_) => 0,
            })
            .sum();
        1 + nested + self.nodes.iter().map(Self::subtree_len).sum::<usize>()
    }
}

fn narrow_id(node: &str, id: Identifier) -> Result<u16, EncodeError> {
    u16::try_from(id).map_err(|_| EncodeError::IdOutOfRange {
        node: node.to_string(),
        id,
    })
}

fn decode_attribute(node: &str, raw: RawAttribute) -> Option<NodeAttribute> {
    let single = raw.element_count == 1;
    let value = match (raw.kind, raw.payload) {
        (DataKind::SerializedClass, RawPayload::Nodes(nodes)) => {
            return Some(NodeAttribute::Nested {
                name: raw.name,
                nodes: nodes.into_iter().map(DataNode::from_raw).collect(),
            });
        }
        (DataKind::Char, RawPayload::Strings(mut strings)) => {
            if single {
                AttributeValue::String(strings.pop().unwrap_or_default())
            } else {
                AttributeValue::StringArray(strings)
            }
        }
        (DataKind::Byte, RawPayload::Bytes(bytes)) => {
            if single {
                AttributeValue::Byte(bytes.first().copied().unwrap_or_default())
            } else {
                AttributeValue::ByteArray(bytes)
            }
        }
        (DataKind::UInt, RawPayload::Bytes(bytes)) => {
            let values = words(&bytes, u32::from_be_bytes);
            pick(single, values, AttributeValue::UInt, AttributeValue::UIntArray)
        }
        (DataKind::Int, RawPayload::Bytes(bytes)) => {
            let values = words(&bytes, i32::from_be_bytes);
            pick(single, values, AttributeValue::Int, AttributeValue::IntArray)
        }
        (DataKind::Float, RawPayload::Bytes(bytes)) => {
            let values = words(&bytes, f32::from_be_bytes);
            pick(single, values, AttributeValue::Float, AttributeValue::FloatArray)
        }
        (DataKind::Uid, RawPayload::Bytes(bytes)) => {
            let values = words(&bytes, u32::from_be_bytes);
            pick(single, values, AttributeValue::Id, AttributeValue::IdArray)
        }
        (DataKind::Short, RawPayload::Bytes(bytes)) => {
            let values = halves(&bytes, i16::from_be_bytes);
            pick(single, values, AttributeValue::Short, AttributeValue::ShortArray)
        }
        (DataKind::UShort, RawPayload::Bytes(bytes)) => {
            let values = halves(&bytes, u16::from_be_bytes);
            pick(single, values, AttributeValue::UShort, AttributeValue::UShortArray)
        }
        (kind, _) => {
            log::debug!(
                "Dropping attribute {:?} of {:?}: no typed value for kind {} ({})",
                raw.name,
                node,
                kind.name(),
                kind.code()
            );
            return None;
        }
    };
    Some(NodeAttribute::Value(Attribute::new(raw.name, value)))
}

fn pick<T>(
    single: bool,
    mut values: Vec<T>,
    scalar: fn(T) -> AttributeValue,
    array: fn(Vec<T>) -> AttributeValue,
) -> AttributeValue {
    if single && values.len() == 1 {
        if let Some(value) = values.pop() {
            return scalar(value);
        }
    }
    array(values)
}

fn words<T>(bytes: &[u8], decode: fn([u8; 4]) -> T) -> Vec<T> {
    bytes
        .chunks_exact(4)
        .map(|chunk| decode([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn halves<T>(bytes: &[u8], decode: fn([u8; 2]) -> T) -> Vec<T> {
    bytes
        .chunks_exact(2)
        .map(|chunk| decode([chunk[0], chunk[1]]))
        .collect()
}

fn encode_attribute(node: &str, attribute: NodeAttribute) -> Result<RawAttribute, EncodeError> {
    let attribute = match attribute {
        NodeAttribute::Nested { name, nodes } => {
            let nodes = nodes
                .into_iter()
                .map(DataNode::into_raw)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(RawAttribute::from_nodes(name, nodes));
        }
        NodeAttribute::Value(attribute) => attribute,
    };

    let Attribute { name, value } = attribute;
    let kind = value.kind();
    let count = u32::try_from(value.len()).unwrap_or(u32::MAX);
    let bytes = match value {
        AttributeValue::String(s) => return Ok(RawAttribute::from_strings(name, vec![s])),
        AttributeValue::StringArray(strings) => return Ok(RawAttribute::from_strings(name, strings)),
        AttributeValue::Byte(v) => vec![v],
        AttributeValue::ByteArray(v) => v,
        AttributeValue::Int(v) => v.to_be_bytes().to_vec(),
        AttributeValue::IntArray(v) => flatten(&v, i32::to_be_bytes),
        AttributeValue::UInt(v) | AttributeValue::Id(v) => v.to_be_bytes().to_vec(),
        AttributeValue::UIntArray(v) | AttributeValue::IdArray(v) => flatten(&v, u32::to_be_bytes),
        AttributeValue::Float(v) => v.to_be_bytes().to_vec(),
        AttributeValue::FloatArray(v) => flatten(&v, f32::to_be_bytes),
        AttributeValue::Short(v) => v.to_be_bytes().to_vec(),
        AttributeValue::ShortArray(v) => flatten(&v, i16::to_be_bytes),
        AttributeValue::UShort(v) => v.to_be_bytes().to_vec(),
        AttributeValue::UShortArray(v) => flatten(&v, u16::to_be_bytes),
        AttributeValue::Class(_) => {
            return Err(EncodeError::LiveInstance {
                node: node.to_string(),
                attribute: name,
            })
        }
    };
    Ok(RawAttribute::from_bytes(name, kind, count, bytes))
}

fn flatten<T: Copy, const N: usize>(values: &[T], encode: fn(T) -> [u8; N]) -> Vec<u8> {
    values.iter().flat_map(|v| encode(*v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float_attr(name: &str, values: &[f32]) -> RawAttribute {
        RawAttribute::from_bytes(
            name,
            DataKind::Float,
            values.len() as u32,
            values.iter().flat_map(|v| v.to_be_bytes()).collect(),
        )
    }

    #[test]
    fn test_single_elements_decode_as_scalars() {
        let raw = RawNode::new(4, 2, "LightComponent")
            .with_attribute(float_attr("Exposure", &[0.75]))
            .with_attribute(float_attr("Color", &[1.0, 0.5, 0.25]))
            .with_attribute(RawAttribute::from_bytes("Mesh", DataKind::Uid, 1, 7u32.to_be_bytes().to_vec()))
            .with_attribute(RawAttribute::from_strings("Name", vec!["lamp".to_string()]));

        let node = DataNode::from_raw(raw);
        assert_eq!(node.unique_id, 4);
        assert_eq!(node.parent_id, 2);
        assert_eq!(node.attribute("Exposure"), Some(&AttributeValue::Float(0.75)));
        assert_eq!(
            node.attribute("Color"),
            Some(&AttributeValue::FloatArray(vec![1.0, 0.5, 0.25]))
        );
        assert_eq!(node.attribute("Mesh"), Some(&AttributeValue::Id(7)));
        assert_eq!(node.attribute("Name"), Some(&AttributeValue::String("lamp".into())));
    }

    #[test]
    fn test_multi_element_strings_and_ids_decode_as_arrays() {
        let raw = RawNode::new(1, 0, "Material")
            .with_attribute(RawAttribute::from_strings("Names", vec!["a".into(), "b".into()]))
            .with_attribute(RawAttribute::from_bytes(
                "Textures",
                DataKind::Uid,
                2,
                [3u32.to_be_bytes(), 9u32.to_be_bytes()].concat(),
            ))
            .with_attribute(RawAttribute::from_bytes("Empty", DataKind::UInt, 0, Vec::new()));

        let node = DataNode::from_raw(raw);
        assert_eq!(
            node.attribute("Names"),
            Some(&AttributeValue::StringArray(vec!["a".into(), "b".into()]))
        );
        assert_eq!(node.attribute("Textures"), Some(&AttributeValue::IdArray(vec![3, 9])));
        assert_eq!(node.attribute("Empty"), Some(&AttributeValue::UIntArray(Vec::new())));
    }

    #[test]
    fn test_unknown_kinds_are_dropped() {
        let raw = RawNode::new(1, 0, "Mystery")
            .with_attribute(RawAttribute::from_bytes("Future", DataKind::Unknown(42), 1, vec![0; 4]))
            .with_attribute(RawAttribute::from_bytes("Nothing", DataKind::None, 0, Vec::new()))
            .with_attribute(float_attr("Kept", &[1.0]));
        let node = DataNode::from_raw(raw);
        assert_eq!(node.attributes.len(), 1);
        assert_eq!(node.attributes[0].name(), "Kept");
    }

    #[test]
    fn test_nested_nodes_and_subtree_len() {
        let shader = RawNode::new(1, 0, "Shader").with_attribute(RawAttribute::from_nodes(
            "Source",
            vec![RawNode::new(2, 0, "ShaderSource"), RawNode::new(3, 0, "ShaderSource")],
        ));
        let node = DataNode::from_raw(shader);
        match &node.attributes[0] {
            NodeAttribute::Nested { name, nodes } => {
                assert_eq!(name, "Source");
                assert_eq!(nodes[1].unique_id, 3);
            }
            other => panic!("unexpected attribute {:?}", other),
        }
        assert_eq!(node.subtree_len(), 3);
    }

    #[test]
    fn test_encode_matches_wire_layout() {
        let mut node = DataNode::new(5, "TransformComponent");
        node.parent_id = 2;
        node.attributes.push(NodeAttribute::Value(Attribute::floats("Position", vec![1.0, 2.0, 3.0])));
        node.attributes.push(NodeAttribute::Value(Attribute::flag("IsDynamic", true)));
        node.attributes.push(NodeAttribute::Value(Attribute::id("ParentID", 2)));

        let raw = node.clone().into_raw().unwrap();
        assert_eq!((raw.id, raw.parent_id), (5, 2));
        assert_eq!(raw.attributes[0], float_attr("Position", &[1.0, 2.0, 3.0]));
        assert_eq!(raw.attributes[1].payload, RawPayload::Bytes(vec![1]));
        assert_eq!(raw.attributes[2].kind, DataKind::Uid);
        assert_eq!(DataNode::from_raw(raw), node);
    }

    #[test]
    fn test_encode_rejects_wide_ids_and_live_objects() {
        let wide = DataNode::new(70_000, "Entity");
        assert!(matches!(wide.into_raw(), Err(EncodeError::IdOutOfRange { id: 70_000, .. })));

        let mut live = DataNode::new(1, "Entity");
        live.attributes.push(NodeAttribute::Value(Attribute::class("Children", Vec::new())));
        assert!(matches!(live.into_raw(), Err(EncodeError::LiveInstance { .. })));
    }
}
