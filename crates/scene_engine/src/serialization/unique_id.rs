//! Unique id allocation and file-local id remapping
//!
//! Ids inside a scene file are only unique within that file. Before nodes
//! become live objects, [`UniqueIdSetter`] replaces every local id (node
//! headers and id-typed attribute values) with a fresh global id from the
//! shared [`IdAllocator`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use thiserror::Error;

use super::attribute::{AttributeValue, Identifier, NULL_ID};
use super::data_node::{DataNode, NodeAttribute};

/// Every id below `u32::MAX` has been handed out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Unique id space exhausted")]
pub struct IdSpaceExhausted;

/// Process-wide source of unique ids
///
/// Ids start at 1 and are never reused. Safe to share between threads.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU32,
}

impl IdAllocator {
    /// Allocator whose first id is 1
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Allocator whose first id is `first`, clamped to at least 1
    pub fn starting_at(first: Identifier) -> Self {
        Self {
            next: AtomicU32::new(first.max(1)),
        }
    }

    /// Hand out the next id, never [`NULL_ID`]
    pub fn next_id(&self) -> Result<Identifier, IdSpaceExhausted> {
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1))
            .map_err(|_| {
                log::error!("Unique id space exhausted");
                IdSpaceExhausted
            })
    }

    /// Id the next call to [`IdAllocator::next_id`] would return
    pub fn peek(&self) -> Identifier {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Reference that could not be resolved during remapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    /// Type name of the node holding the reference
    pub node: String,
    /// Attribute name, or `None` for the node header's parent id
    pub attribute: Option<String>,
    /// Local id that matched no node in the file
    pub local_id: Identifier,
}

/// Outcome of one remapping pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapReport {
    /// Nodes that received a global id
    pub nodes_assigned: usize,
    /// Id values rewritten to a global id
    pub references_resolved: usize,
    /// Id values that matched no node and were set to [`NULL_ID`]
    pub dangling: Vec<DanglingReference>,
}

/// Rewrites one file's local ids into global ids
///
/// A setter owns the local-to-global table of a single load. Use a fresh
/// setter per file so local ids from different files never mix.
pub struct UniqueIdSetter<'a> {
    ids: &'a IdAllocator,
    local_to_global: HashMap<Identifier, Identifier>,
}

impl<'a> UniqueIdSetter<'a> {
    /// Setter drawing fresh ids from `ids`
    pub fn new(ids: &'a IdAllocator) -> Self {
        Self {
            ids,
            local_to_global: HashMap::new(),
        }
    }

    /// Remap every node of a forest in place
    ///
    /// Fails without touching references when the allocator runs dry; nodes
    /// assigned before that keep their new ids.
    pub fn set_unique_ids(mut self, nodes: &mut [DataNode]) -> Result<RemapReport, IdSpaceExhausted> {
        let mut report = RemapReport::default();
        for node in nodes.iter_mut() {
            self.assign(node, &mut report)?;
        }
        for node in nodes.iter_mut() {
            self.resolve(node, &mut report);
        }
        if !report.dangling.is_empty() {
            log::debug!(
                "{} id reference(s) did not match any node and were cleared",
                report.dangling.len()
            );
        }
        Ok(report)
    }

    /// Global id a local id was mapped to, if any
    pub fn global_id(&self, local: Identifier) -> Option<Identifier> {
        self.local_to_global.get(&local).copied()
    }

    // Pre-order: the node, its children, then nodes nested in attributes
    fn assign(&mut self, node: &mut DataNode, report: &mut RemapReport) -> Result<(), IdSpaceExhausted> {
        let global = self.ids.next_id()?;
        if let Some(previous) = self.local_to_global.insert(node.unique_id, global) {
            log::debug!(
                "Local id {} of {:?} reused; references now resolve to {} instead of {}",
                node.unique_id,
                node.name,
                global,
                previous
            );
        }
        node.unique_id = global;
        report.nodes_assigned += 1;

        for child in node.nodes.iter_mut() {
            self.assign(child, report)?;
        }
        for attribute in node.attributes.iter_mut() {
            if let NodeAttribute::Nested { nodes, .. } = attribute {
                for nested in nodes.iter_mut() {
                    self.assign(nested, report)?;
                }
            }
        }
        Ok(())
    }

    fn resolve(&self, node: &mut DataNode, report: &mut RemapReport) {
        if node.parent_id != NULL_ID {
            node.parent_id = self.lookup(node.parent_id, &node.name, None, report);
        }

        for attribute in node.attributes.iter_mut() {
            match attribute {
                NodeAttribute::Value(attribute) => match &mut attribute.value {
                    AttributeValue::Id(id) => {
                        *id = self.lookup(*id, &node.name, Some(&attribute.name), report);
                    }
                    AttributeValue::IdArray(ids) => {
                        for id in ids.iter_mut() {
                            *id = self.lookup(*id, &node.name, Some(&attribute.name), report);
                        }
                    }
                    _ => {}
                },
                NodeAttribute::Nested { nodes, .. } => {
                    for nested in nodes.iter_mut() {
                        self.resolve(nested, report);
                    }
                }
            }
        }
        for child in node.nodes.iter_mut() {
            self.resolve(child, report);
        }
    }

    fn lookup(
        &self,
        local: Identifier,
        node: &str,
        attribute: Option<&str>,
        report: &mut RemapReport,
    ) -> Identifier {
        if local == NULL_ID {
            return NULL_ID;
        }
        match self.local_to_global.get(&local) {
            Some(&global) => {
                report.references_resolved += 1;
                global
            }
            None => {
                log::debug!(
                    "Reference {} in {:?}.{} has no target",
                    local,
                    node,
                    attribute.unwrap_or("<parent>")
                );
                report.dangling.push(DanglingReference {
                    node: node.to_string(),
                    attribute: attribute.map(str::to_string),
                    local_id: local,
                });
                NULL_ID
            }
        }
    }
}
