//! Binary scene description writer
//!
//! Inverse of [`super::reader`]: emits a header followed by [`RawNode`]s in
//! the same big-endian layout. Counts that do not fit their wire width and
//! payloads that disagree with their declared count are rejected before any
//! byte of the offending node is written.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::reader::SceneDocument;
use super::wire::{
    Header, RawAttribute, RawNode, RawPayload, ATTRIBUTE_BEGIN, ATTRIBUTE_END, NODE_BEGIN,
    NODE_END,
};

/// Encoding failures
#[derive(Debug, Error)]
pub enum WriteError {
    /// The destination could not be created
    #[error("Couldn't create the file {}: {source}", .path.display())]
    Create {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// A name longer than its one-byte length prefix allows
    #[error("Name {name:?} is {len} bytes, the format allows 255")]
    NameTooLong {
        /// Offending name
        name: String,
        /// Its byte length
        len: usize,
    },

    /// More attributes or children than a one-byte count allows
    #[error("Node {node:?} has {count} {what}, the format allows 255")]
    TooManyEntries {
        /// Node type name
        node: String,
        /// "attributes" or "child nodes"
        what: &'static str,
        /// Actual count
        count: usize,
    },

    /// Payload does not match the declared kind and count
    #[error("Attribute {attribute:?} declares {declared} elements of {kind} but carries {actual}")]
    PayloadMismatch {
        /// Attribute name
        attribute: String,
        /// Declared kind name
        kind: &'static str,
        /// Declared element count
        declared: u32,
        /// What the payload actually holds
        actual: String,
    },

    /// Underlying IO failure
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Writer over any byte sink
pub struct SceneWriter<W: Write> {
    inner: W,
}

impl SceneWriter<BufWriter<File>> {
    /// Create or truncate a file for writing
    pub fn create(path: impl AsRef<Path>) -> Result<Self, WriteError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| WriteError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> SceneWriter<W> {
    /// Wrap a byte sink
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write a header and every root node, then flush
    pub fn write_document(&mut self, document: &SceneDocument) -> Result<(), WriteError> {
        self.write_header(&document.header)?;
        for node in &document.nodes {
            self.write_node(node)?;
        }
        self.inner.flush()?;
        Ok(())
    }

    /// Write the signature and version byte
    pub fn write_header(&mut self, header: &Header) -> Result<(), WriteError> {
        self.inner.write_all(&header.signature)?;
        self.inner.write_all(&[header.version])?;
        Ok(())
    }

    /// Validate and write one node with its attributes and children
    pub fn write_node(&mut self, node: &RawNode) -> Result<(), WriteError> {
        validate_node(node)?;
        let mut buf = Vec::new();
        encode_node(node, &mut buf);
        self.inner.write_all(&buf)?;
        Ok(())
    }

    /// Unwrap the sink
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Encode a whole document into memory
pub fn write_document_to_vec(document: &SceneDocument) -> Result<Vec<u8>, WriteError> {
    let mut writer = SceneWriter::new(Vec::new());
    writer.write_document(document)?;
    Ok(writer.into_inner())
}

fn validate_node(node: &RawNode) -> Result<(), WriteError> {
    check_name(&node.name)?;
    check_count(node, "attributes", node.attributes.len())?;
    check_count(node, "child nodes", node.nodes.len())?;
    for attribute in &node.attributes {
        validate_attribute(attribute)?;
    }
    node.nodes.iter().try_for_each(validate_node)
}

fn validate_attribute(attribute: &RawAttribute) -> Result<(), WriteError> {
    check_name(&attribute.name)?;
    let declared = attribute.element_count as usize;
    let mismatch = |actual: String| WriteError::PayloadMismatch {
        attribute: attribute.name.clone(),
        kind: attribute.kind.name(),
        declared: attribute.element_count,
        actual,
    };

    match (&attribute.payload, attribute.kind.stride()) {
        (RawPayload::Bytes(bytes), Some(stride)) => {
            if bytes.len() != declared * stride {
                return Err(mismatch(format!("{} bytes", bytes.len())));
            }
        }
        (RawPayload::Strings(strings), None) if strings.len() == declared => {
            if strings.iter().any(|s| s.contains('\0')) {
                return Err(mismatch("a string with an embedded NUL".to_string()));
            }
        }
        (RawPayload::Nodes(nodes), None) if nodes.len() == declared => {
            nodes.iter().try_for_each(validate_node)?;
        }
        (RawPayload::Strings(strings), _) => {
            return Err(mismatch(format!("{} strings", strings.len())));
        }
        (RawPayload::Nodes(nodes), _) => {
            return Err(mismatch(format!("{} nodes", nodes.len())));
        }
        (RawPayload::Bytes(bytes), None) => {
            return Err(mismatch(format!("{} raw bytes", bytes.len())));
        }
    }
    Ok(())
}

fn check_name(name: &str) -> Result<(), WriteError> {
    if name.len() > u8::MAX as usize {
        return Err(WriteError::NameTooLong {
            name: name.to_string(),
            len: name.len(),
        });
    }
    Ok(())
}

fn check_count(node: &RawNode, what: &'static str, count: usize) -> Result<(), WriteError> {
    if count > u8::MAX as usize {
        return Err(WriteError::TooManyEntries {
            node: node.name.clone(),
            what,
            count,
        });
    }
    Ok(())
}

// Lengths below were checked by `validate_node`.
fn encode_node(node: &RawNode, buf: &mut Vec<u8>) {
    buf.push(NODE_BEGIN);
    buf.extend_from_slice(&node.id.to_be_bytes());
    buf.extend_from_slice(&node.parent_id.to_be_bytes());
    buf.push(node.tag.code());
    buf.push(node.name.len() as u8);
    buf.extend_from_slice(node.name.as_bytes());
    buf.push(node.attributes.len() as u8);
    buf.push(node.nodes.len() as u8);
    for attribute in &node.attributes {
        encode_attribute(attribute, buf);
    }
    for child in &node.nodes {
        encode_node(child, buf);
    }
    buf.push(NODE_END);
}

fn encode_attribute(attribute: &RawAttribute, buf: &mut Vec<u8>) {
    buf.push(ATTRIBUTE_BEGIN);
    buf.push(attribute.name.len() as u8);
    buf.extend_from_slice(attribute.name.as_bytes());
    buf.push(attribute.kind.code());
    buf.extend_from_slice(&attribute.element_count.to_be_bytes());
    match &attribute.payload {
        RawPayload::Bytes(bytes) => buf.extend_from_slice(bytes),
        RawPayload::Strings(strings) => {
            for s in strings {
                buf.extend_from_slice(s.as_bytes());
                buf.push(0);
            }
        }
        RawPayload::Nodes(nodes) => {
            for node in nodes {
                encode_node(node, buf);
            }
        }
    }
    buf.push(ATTRIBUTE_END);
}
