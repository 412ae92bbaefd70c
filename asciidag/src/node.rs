//! The node model: an arena of commit-like records.
//!
//! Nodes are identified by their index into the arena ([`NodeId`]), so two
//! nodes with equal labels are still distinct. Parent lists refer back into
//! the same arena, which keeps the graph free of ownership cycles: a parent
//! must be inserted before any of its children.

use indexmap::IndexMap;
use thiserror::Error;

/// Identifier for a node stored in a [`Dag`].
///
/// Ids are only meaningful for the arena that issued them.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(usize);

/// A single commit-like entry in the graph.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Node {
    /// Text rendered to the right of this node's principal row.
    pub label: String,

    /// Parents in order. The first parent is the lineage this node
    /// continues; any further parents make the node a merge.
    pub parents: Vec<NodeId>,
}

/// The error type for constructing nodes.
#[derive(Debug, Error)]
#[error("parent {parent:?} is not a node in this graph")]
pub struct InvalidNodeError {
    /// The offending parent id.
    pub parent: NodeId,
}

/// Arena holding every node of a directed acyclic graph.
///
/// Since [`Dag::node`] only accepts parents that are already present,
/// parent indices are always smaller than child indices and cycles cannot
/// be expressed through this interface.
#[derive(Clone, Debug, Default)]
pub struct Dag {
    nodes: Vec<Node>,
}

impl Dag {
    /// Construct an empty graph.
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a node with the given label and parents, returning its id.
    pub fn node(
        &mut self,
        label: impl Into<String>,
        parents: impl IntoIterator<Item = NodeId>,
    ) -> Result<NodeId, InvalidNodeError> {
        let parents: Vec<NodeId> = parents.into_iter().collect();
        for parent in &parents {
            let NodeId(index) = *parent;
            if index >= self.nodes.len() {
                return Err(InvalidNodeError { parent: *parent });
            }
        }
        Ok(self.push_node(label.into(), parents))
    }

    /// Add a linear ancestry. The first label becomes the tip, each
    /// subsequent label the parent of the one before it. Returns the tip
    /// id, or `None` if `labels` is empty.
    pub fn chain(
        &mut self,
        labels: impl IntoIterator<Item = impl Into<String>>,
    ) -> Option<NodeId> {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let mut tip = None;
        for label in labels.into_iter().rev() {
            tip = Some(self.push_node(label, tip.into_iter().collect()));
        }
        tip
    }

    /// Recursively add the forest described by a nested ancestry map: each
    /// key becomes a node whose parents are built from its value. Returns
    /// the ids of the top-level entries, in map order.
    ///
    /// Repeated labels produce distinct nodes.
    pub fn extend_from_map(&mut self, ancestry: &Ancestry) -> Vec<NodeId> {
        let Ancestry(entries) = ancestry;
        entries
            .iter()
            .map(|(label, parents)| {
                let parents = self.extend_from_map(parents);
                self.push_node(label.clone(), parents)
            })
            .collect()
    }

    /// Look up a node by id.
    pub fn get(&self, id: NodeId) -> &Node {
        let NodeId(index) = id;
        &self.nodes[index]
    }

    /// The number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph contains no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push_node(&mut self, label: String, parents: Vec<NodeId>) -> NodeId {
        self.nodes.push(Node { label, parents });
        NodeId(self.nodes.len() - 1)
    }
}

/// A nested, insertion-ordered description of a forest of nodes, mapping
/// each label to the ancestry of its parents. See [`Dag::extend_from_map`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Ancestry(pub IndexMap<String, Ancestry>);
