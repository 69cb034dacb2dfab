//! Binary scene description reader
//!
//! Turns a byte stream into a forest of [`RawNode`]s. The reader only checks
//! structure (sentinels and declared counts); type names and attribute kinds
//! are left for the data node layer to interpret.

use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::wire::{
    DataKind, Header, NodeTag, RawAttribute, RawNode, RawPayload, ATTRIBUTE_BEGIN, ATTRIBUTE_END,
    NODE_BEGIN, NODE_END,
};

/// Deepest node nesting the reader accepts before giving up on a stream
pub const MAX_NESTING_DEPTH: usize = 512;

/// Structural read failures
#[derive(Debug, Error)]
pub enum ReadError {
    /// The source could not be opened
    #[error("Couldn't open the file {}: {source}", .path.display())]
    Open {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// A begin/end tag did not hold the expected sentinel
    #[error("Expected {what} (0x{expected:02X}) at byte {offset}, found 0x{found:02X}")]
    SentinelMismatch {
        /// Which sentinel was expected
        what: &'static str,
        /// Expected byte
        expected: u8,
        /// Byte actually read
        found: u8,
        /// Stream offset of the offending byte
        offset: u64,
    },

    /// The stream ended before the declared counts were satisfied
    #[error("Stream ended at byte {offset} while reading {context}")]
    UnexpectedEof {
        /// What was being read
        context: &'static str,
        /// Stream offset where data ran out
        offset: u64,
    },

    /// Nodes nested deeper than [`MAX_NESTING_DEPTH`]
    #[error("Node nesting exceeds {limit} levels at byte {offset}")]
    NestingTooDeep {
        /// Configured limit
        limit: usize,
        /// Stream offset of the node that crossed it
        offset: u64,
    },

    /// Any other IO failure
    #[error("IO error at byte {offset}: {source}")]
    Io {
        /// Stream offset where the error surfaced
        offset: u64,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },
}

/// Header plus root nodes of one stream
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDocument {
    /// File header
    pub header: Header,
    /// Root nodes in stream order
    pub nodes: Vec<RawNode>,
}

/// Reader over any byte source
pub struct SceneReader<R> {
    inner: R,
    offset: u64,
}

impl SceneReader<BufReader<File>> {
    /// Open a file for reading
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ReadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> SceneReader<R> {
    /// Wrap a byte source positioned at the start of the header
    pub fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    /// Bytes consumed so far
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read the header and every root node up to the end of the stream
    pub fn read_document(&mut self) -> Result<SceneDocument, ReadError> {
        let header = self.read_header()?;
        let nodes = self.read_nodes()?;
        Ok(SceneDocument { header, nodes })
    }

    /// Read the 3-byte signature and version byte
    pub fn read_header(&mut self) -> Result<Header, ReadError> {
        let mut signature = [0u8; 3];
        self.read_exact(&mut signature, "header signature")?;
        let version = self.read_u8("header version")?;
        let header = Header { signature, version };
        log::debug!(
            "Scene header: signature {:?}, version {}",
            header.signature_str(),
            header.version
        );
        Ok(header)
    }

    /// Read root nodes until the stream ends cleanly on a node boundary
    pub fn read_nodes(&mut self) -> Result<Vec<RawNode>, ReadError> {
        let mut nodes = Vec::new();
        while let Some(tag) = self.try_read_u8()? {
            nodes.push(self.read_node_after_tag(tag, 0)?);
        }
        Ok(nodes)
    }

    /// Read one node, begin sentinel included
    pub fn read_node(&mut self) -> Result<RawNode, ReadError> {
        let tag = self.read_u8("node begin")?;
        self.read_node_after_tag(tag, 0)
    }

    fn read_node_after_tag(&mut self, tag: u8, depth: usize) -> Result<RawNode, ReadError> {
        self.expect_sentinel(tag, NODE_BEGIN, "node begin")?;
        if depth >= MAX_NESTING_DEPTH {
            return Err(ReadError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
                offset: self.offset,
            });
        }

        let id = self.read_u16("node id")?;
        let parent_id = self.read_u16("node parent id")?;
        let tag = NodeTag::from_code(self.read_u8("node type tag")?);
        let name_len = self.read_u8("node name length")?;
        let name = self.read_name(name_len, "node name")?;
        let attribute_count = self.read_u8("node attribute count")?;
        let node_count = self.read_u8("node child count")?;

        let mut attributes = Vec::with_capacity(usize::from(attribute_count));
        for _ in 0..attribute_count {
            attributes.push(self.read_attribute(depth)?);
        }

        let mut nodes = Vec::with_capacity(usize::from(node_count));
        for _ in 0..node_count {
            let tag = self.read_u8("child node begin")?;
            nodes.push(self.read_node_after_tag(tag, depth + 1)?);
        }

        let end = self.read_u8("node end")?;
        self.expect_sentinel(end, NODE_END, "node end")?;

        Ok(RawNode {
            id,
            parent_id,
            tag,
            name,
            attributes,
            nodes,
        })
    }

    fn read_attribute(&mut self, depth: usize) -> Result<RawAttribute, ReadError> {
        let begin = self.read_u8("attribute begin")?;
        self.expect_sentinel(begin, ATTRIBUTE_BEGIN, "attribute begin")?;

        let name_len = self.read_u8("attribute name length")?;
        let name = self.read_name(name_len, "attribute name")?;
        let kind = DataKind::from_code(self.read_u8("attribute data kind")?);
        let element_count = self.read_u32("attribute element count")?;

        let payload = match kind.stride() {
            Some(stride) => {
                let byte_count = u64::from(element_count) * stride as u64;
                RawPayload::Bytes(self.read_vec(byte_count, "attribute values")?)
            }
            None if kind == DataKind::Char => {
                let mut strings = Vec::new();
                for _ in 0..element_count {
                    strings.push(self.read_c_string()?);
                }
                RawPayload::Strings(strings)
            }
            None => {
                let mut nodes = Vec::new();
                for _ in 0..element_count {
                    let tag = self.read_u8("nested node begin")?;
                    nodes.push(self.read_node_after_tag(tag, depth + 1)?);
                }
                RawPayload::Nodes(nodes)
            }
        };

        let end = self.read_u8("attribute end")?;
        self.expect_sentinel(end, ATTRIBUTE_END, "attribute end")?;

        Ok(RawAttribute {
            name,
            kind,
            element_count,
            payload,
        })
    }

    fn expect_sentinel(&self, found: u8, expected: u8, what: &'static str) -> Result<(), ReadError> {
        if found == expected {
            return Ok(());
        }
        Err(ReadError::SentinelMismatch {
            what,
            expected,
            found,
            // the sentinel byte has already been consumed
            offset: self.offset.saturating_sub(1),
        })
    }

    fn read_name(&mut self, len: u8, context: &'static str) -> Result<String, ReadError> {
        let mut bytes = vec![0u8; usize::from(len)];
        self.read_exact(&mut bytes, context)?;
        // exporters include the terminator in the length
        while bytes.last() == Some(&0) {
            bytes.pop();
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn read_c_string(&mut self) -> Result<String, ReadError> {
        let mut bytes = Vec::new();
        loop {
            match self.read_u8("string value")? {
                0 => break,
                byte => bytes.push(byte),
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn read_vec(&mut self, len: u64, context: &'static str) -> Result<Vec<u8>, ReadError> {
        // no up-front allocation: the declared length is untrusted
        let mut bytes = Vec::new();
        let read = (&mut self.inner)
            .take(len)
            .read_to_end(&mut bytes)
            .map_err(|source| ReadError::Io {
                offset: self.offset,
                source,
            })?;
        self.offset += read as u64;
        if (read as u64) < len {
            return Err(ReadError::UnexpectedEof {
                context,
                offset: self.offset,
            });
        }
        Ok(bytes)
    }

    fn read_u8(&mut self, context: &'static str) -> Result<u8, ReadError> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte, context)?;
        Ok(byte[0])
    }

    fn read_u16(&mut self, context: &'static str) -> Result<u16, ReadError> {
        let mut bytes = [0u8; 2];
        self.read_exact(&mut bytes, context)?;
        Ok(u16::from_be_bytes(bytes))
    }

    fn read_u32(&mut self, context: &'static str) -> Result<u32, ReadError> {
        let mut bytes = [0u8; 4];
        self.read_exact(&mut bytes, context)?;
        Ok(u32::from_be_bytes(bytes))
    }

    /// `None` on a clean end of stream
    fn try_read_u8(&mut self) -> Result<Option<u8>, ReadError> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.offset += 1;
                    return Ok(Some(byte[0]));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(ReadError::Io {
                        offset: self.offset,
                        source,
                    })
                }
            }
        }
    }

    fn read_exact(&mut self, buf: &mut [u8], context: &'static str) -> Result<(), ReadError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(ReadError::UnexpectedEof {
                        context,
                        offset: self.offset,
                    })
                }
                Ok(n) => {
                    filled += n;
                    self.offset += n as u64;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(ReadError::Io {
                        offset: self.offset,
                        source,
                    })
                }
            }
        }
        Ok(())
    }
}

/// Read a whole document from an in-memory buffer
pub fn read_document_from_slice(bytes: &[u8]) -> Result<SceneDocument, ReadError> {
    SceneReader::new(bytes).read_document()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes() -> Vec<u8> {
        vec![b'S', b'S', b'D', 1]
    }

    fn transform_node(id: u16, parent: u16, position: [f32; 3]) -> Vec<u8> {
        let mut bytes = vec![NODE_BEGIN];
        bytes.extend_from_slice(&id.to_be_bytes());
        bytes.extend_from_slice(&parent.to_be_bytes());
        bytes.push(1);
        bytes.push(9);
        bytes.extend_from_slice(b"Transform");
        bytes.push(1);
        bytes.push(0);
        bytes.push(ATTRIBUTE_BEGIN);
        bytes.push(8);
        bytes.extend_from_slice(b"Position");
        bytes.push(DataKind::Float.code());
        bytes.extend_from_slice(&3u32.to_be_bytes());
        for value in position {
            bytes.extend_from_slice(&value.to_be_bytes());
        }
        bytes.push(ATTRIBUTE_END);
        bytes.push(NODE_END);
        bytes
    }

    #[test]
    fn test_reads_header_and_nodes() {
        let mut bytes = header_bytes();
        bytes.extend(transform_node(1, 0, [1.0, 2.0, 3.0]));
        bytes.extend(transform_node(2, 1, [0.0, 1.0, 0.0]));

        let document = read_document_from_slice(&bytes).unwrap();
        assert_eq!(document.header.signature_str(), "SSD");
        assert_eq!(document.nodes.len(), 2);

        let second = &document.nodes[1];
        assert_eq!(second.id, 2);
        assert_eq!(second.parent_id, 1);
        assert_eq!(second.name, "Transform");
        assert_eq!(second.tag, NodeTag::Data);
        assert_eq!(second.attributes[0].kind, DataKind::Float);
        assert_eq!(second.attributes[0].element_count, 3);
        match &second.attributes[0].payload {
            RawPayload::Bytes(values) => assert_eq!(values.len(), 12),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_empty_node_stream() {
        let document = read_document_from_slice(&header_bytes()).unwrap();
        assert!(document.nodes.is_empty());
    }

    #[test]
    fn test_truncated_header() {
        let err = read_document_from_slice(b"SS").unwrap_err();
        assert!(matches!(err, ReadError::UnexpectedEof { context: "header signature", .. }));
    }

    #[test]
    fn test_missing_node_end_is_structural_error() {
        let mut bytes = header_bytes();
        let mut node = transform_node(1, 0, [1.0, 2.0, 3.0]);
        node.pop();
        bytes.extend(node);

        let err = read_document_from_slice(&bytes).unwrap_err();
        assert!(matches!(err, ReadError::UnexpectedEof { context: "node end", .. }));
    }

    #[test]
    fn test_wrong_node_end_sentinel() {
        let mut bytes = header_bytes();
        let mut node = transform_node(1, 0, [1.0, 2.0, 3.0]);
        *node.last_mut().unwrap() = 0x00;
        bytes.extend(node);

        let err = read_document_from_slice(&bytes).unwrap_err();
        match err {
            ReadError::SentinelMismatch { what, expected, found, offset } => {
                assert_eq!(what, "node end");
                assert_eq!(expected, NODE_END);
                assert_eq!(found, 0x00);
                assert_eq!(offset, bytes.len() as u64 - 1);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_garbage_instead_of_node_begin() {
        let mut bytes = header_bytes();
        bytes.push(0x11);
        let err = read_document_from_slice(&bytes).unwrap_err();
        assert!(matches!(err, ReadError::SentinelMismatch { what: "node begin", found: 0x11, .. }));
    }

    #[test]
    fn test_declared_values_longer_than_stream() {
        let mut bytes = header_bytes();
        let node = transform_node(1, 0, [1.0, 2.0, 3.0]);
        // cut inside the float payload
        bytes.extend_from_slice(&node[..node.len() - 6]);
        let err = read_document_from_slice(&bytes).unwrap_err();
        assert!(matches!(err, ReadError::UnexpectedEof { context: "attribute values", .. }));
    }

    #[test]
    fn test_strings_and_trailing_nul_in_names() {
        let mut bytes = header_bytes();
        bytes.push(NODE_BEGIN);
        bytes.extend_from_slice(&7u16.to_be_bytes());
        bytes.extend_from_slice(&0u16.to_be_bytes());
        bytes.push(0);
        bytes.push(5);
        bytes.extend_from_slice(b"Mesh\0");
        bytes.push(1);
        bytes.push(0);
        bytes.push(ATTRIBUTE_BEGIN);
        bytes.push(4);
        bytes.extend_from_slice(b"Tags");
        bytes.push(DataKind::Char.code());
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.extend_from_slice(b"red\0blue\0");
        bytes.push(ATTRIBUTE_END);
        bytes.push(NODE_END);

        let document = read_document_from_slice(&bytes).unwrap();
        let node = &document.nodes[0];
        assert_eq!(node.name, "Mesh");
        assert_eq!(node.tag, NodeTag::Object);
        assert_eq!(
            node.attributes[0].payload,
            RawPayload::Strings(vec!["red".to_string(), "blue".to_string()])
        );
    }

    #[test]
    fn test_open_missing_file() {
        let err = SceneReader::open("definitely/not/here.ssd").err().unwrap();
        assert!(matches!(err, ReadError::Open { .. }));
        assert!(err.to_string().contains("definitely/not/here.ssd"));
    }
}
