//! Scene description wire format
//!
//! ```text
//! File      := Header, Node*
//! Header    := signature:[u8; 3], version:u8
//! Node      := 0xAA, id:u16, parentId:u16, typeTag:u8, nameLen:u8, name,
//!              attrCount:u8, nodeCount:u8, Attribute*, Node*, 0xAB
//! Attribute := 0xBA, nameLen:u8, name, dataKind:u8, elementCount:u32, payload, 0xBB
//! ```
//!
//! All multi-byte integers and floats are big-endian. Payload layout depends on
//! the data kind: fixed-stride kinds store `elementCount * stride` bytes, strings
//! store `elementCount` NUL-terminated runs and nested kinds embed `elementCount`
//! nodes.

/// Node begin sentinel
pub const NODE_BEGIN: u8 = 0xAA;
/// Node end sentinel
pub const NODE_END: u8 = 0xAB;
/// Attribute begin sentinel
pub const ATTRIBUTE_BEGIN: u8 = 0xBA;
/// Attribute end sentinel
pub const ATTRIBUTE_END: u8 = 0xBB;

/// Signature written by the engine's own exporters
pub const DEFAULT_SIGNATURE: [u8; 3] = *b"SSD";
/// Current format version
pub const FORMAT_VERSION: u8 = 1;

/// File header, read once before the node stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Three raw signature bytes
    pub signature: [u8; 3],
    /// Format version
    pub version: u8,
}

impl Header {
    /// Header with the default signature and current version
    pub fn current() -> Self {
        Self {
            signature: DEFAULT_SIGNATURE,
            version: FORMAT_VERSION,
        }
    }

    /// Signature as text, lossy for non-UTF-8 bytes
    pub fn signature_str(&self) -> String {
        String::from_utf8_lossy(&self.signature).into_owned()
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::current()
    }
}

/// Element data kind declared by an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    /// No payload type
    None,
    /// `unsigned char`
    Byte,
    /// `unsigned int`
    UInt,
    /// `float`
    Float,
    /// `int`
    Int,
    /// `short`
    Short,
    /// `unsigned short`
    UShort,
    /// `char`, NUL-terminated strings
    Char,
    /// Identifier referencing another node
    Uid,
    /// Embedded nodes
    SerializedClass,
    /// Kind code this build does not know
    Unknown(u8),
}

impl DataKind {
    /// Decode a kind code
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::None,
            1 => Self::Byte,
            2 => Self::UInt,
            3 => Self::Float,
            4 => Self::Int,
            5 => Self::Short,
            6 => Self::UShort,
            7 => Self::Char,
            8 => Self::Uid,
            9 => Self::SerializedClass,
            other => Self::Unknown(other),
        }
    }

    /// Kind code written to the stream
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Byte => 1,
            Self::UInt => 2,
            Self::Float => 3,
            Self::Int => 4,
            Self::Short => 5,
            Self::UShort => 6,
            Self::Char => 7,
            Self::Uid => 8,
            Self::SerializedClass => 9,
            Self::Unknown(code) => code,
        }
    }

    /// Bytes per element for fixed-stride kinds, `None` for strings and nested nodes
    ///
    /// Kinds this build does not understand are assumed to be 4 bytes wide so the
    /// stream stays in sync; their values are dropped at decode time.
    pub fn stride(self) -> Option<usize> {
        match self {
            Self::Byte => Some(1),
            Self::Short | Self::UShort => Some(2),
            Self::None | Self::UInt | Self::Float | Self::Int | Self::Uid | Self::Unknown(_) => {
                Some(4)
            }
            Self::Char | Self::SerializedClass => None,
        }
    }

    /// Type name used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Byte => "unsigned char",
            Self::UInt => "unsigned int",
            Self::Float => "float",
            Self::Int => "int",
            Self::Short => "short",
            Self::UShort => "unsigned short",
            Self::Char => "char",
            Self::Uid => "uid",
            Self::SerializedClass => "SerializedClass",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Structural node category stored in the node header
///
/// The tag is carried through untouched; nothing in the core branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeTag {
    /// Object grouping (entity)
    Object,
    /// Plain data node
    #[default]
    Data,
    /// Any other tag value
    Other(u8),
}

impl NodeTag {
    /// Decode a tag byte
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Object,
            1 => Self::Data,
            other => Self::Other(other),
        }
    }

    /// Tag byte written to the stream
    pub fn code(self) -> u8 {
        match self {
            Self::Object => 0,
            Self::Data => 1,
            Self::Other(code) => code,
        }
    }
}

/// Attribute payload as it came off the wire
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// Fixed-stride element bytes, `element_count * stride` long
    Bytes(Vec<u8>),
    /// One entry per NUL-terminated run
    Strings(Vec<String>),
    /// Embedded nodes
    Nodes(Vec<RawNode>),
}

/// Attribute as decoded by the reader
#[derive(Debug, Clone, PartialEq)]
pub struct RawAttribute {
    /// Attribute name
    pub name: String,
    /// Declared element kind
    pub kind: DataKind,
    /// Declared element count
    pub element_count: u32,
    /// Payload
    pub payload: RawPayload,
}

impl RawAttribute {
    /// Fixed-stride attribute from already-encoded element bytes
    pub fn from_bytes(name: impl Into<String>, kind: DataKind, element_count: u32, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind,
            element_count,
            payload: RawPayload::Bytes(bytes),
        }
    }

    /// String attribute
    pub fn from_strings(name: impl Into<String>, strings: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: DataKind::Char,
            element_count: count_u32(strings.len()),
            payload: RawPayload::Strings(strings),
        }
    }

    /// Nested-node attribute
    pub fn from_nodes(name: impl Into<String>, nodes: Vec<RawNode>) -> Self {
        Self {
            name: name.into(),
            kind: DataKind::SerializedClass,
            element_count: count_u32(nodes.len()),
            payload: RawPayload::Nodes(nodes),
        }
    }
}

/// Node as decoded by the reader
///
/// Ids here are local to the file they came from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawNode {
    /// Local id
    pub id: u16,
    /// Local id of the parent, 0 for none
    pub parent_id: u16,
    /// Structural tag
    pub tag: NodeTag,
    /// Type name
    pub name: String,
    /// Attributes in stream order
    pub attributes: Vec<RawAttribute>,
    /// Child nodes in stream order
    pub nodes: Vec<RawNode>,
}

impl RawNode {
    /// Node with no attributes or children
    pub fn new(id: u16, parent_id: u16, name: impl Into<String>) -> Self {
        Self {
            id,
            parent_id,
            tag: NodeTag::default(),
            name: name.into(),
            attributes: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Builder: append an attribute
    pub fn with_attribute(mut self, attribute: RawAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Builder: append a child node
    pub fn with_node(mut self, node: RawNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Builder: set the structural tag
    pub fn with_tag(mut self, tag: NodeTag) -> Self {
        self.tag = tag;
        self
    }
}

fn count_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
