//! Lazy producers over the node arena: ancestor walks, de-duplication, and
//! topological ordering.
//!
//! The renderer requires its input in an order where every node appears
//! before any of its parents; `toposort(unique(walk(..)))` produces exactly
//! that from a set of tips.

use std::collections::{HashMap, HashSet};

use crate::node::{Dag, NodeId};

/// Walk `tips` and all of their ancestors, depth-first.
///
/// Tips are yielded first, in order, then the ancestors of each tip in
/// turn. Nodes reachable along multiple paths are yielded once per path;
/// combine with [`unique`] to visit each node once.
pub fn walk<'a>(dag: &'a Dag, tips: &'a [NodeId]) -> Walk<'a> {
    Walk {
        dag,
        first_parent_only: false,
        stack: vec![Frame {
            nodes: tips,
            yielded: 0,
            recursed: 0,
        }],
    }
}

/// Iterator for [`walk`].
#[derive(Debug)]
pub struct Walk<'a> {
    dag: &'a Dag,
    first_parent_only: bool,
    stack: Vec<Frame<'a>>,
}

// One level of the recursive walk: a slice of nodes that is first yielded
// in order, then descended into node by node.
#[derive(Debug)]
struct Frame<'a> {
    nodes: &'a [NodeId],
    yielded: usize,
    recursed: usize,
}

impl Walk<'_> {
    /// Restrict the walk to first parents. Later parents are not descended
    /// into, so lineages reachable only through them are never produced.
    pub fn first_parent_only(mut self, first_parent_only: bool) -> Self {
        self.first_parent_only = first_parent_only;
        self
    }
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(frame) = self.stack.last_mut() {
            if frame.yielded < frame.nodes.len() {
                let node = frame.nodes[frame.yielded];
                frame.yielded += 1;
                return Some(node);
            }
            if frame.recursed < frame.nodes.len() {
                let node = frame.nodes[frame.recursed];
                frame.recursed += 1;
                let parents = self.dag.get(node).parents.as_slice();
                let parents = if self.first_parent_only {
                    &parents[..parents.len().min(1)]
                } else {
                    parents
                };
                self.stack.push(Frame {
                    nodes: parents,
                    yielded: 0,
                    recursed: 0,
                });
                continue;
            }
            self.stack.pop();
        }
        None
    }
}

/// Filter a node stream down to the first occurrence of each node.
pub fn unique<I: Iterator<Item = NodeId>>(iter: I) -> Unique<I> {
    Unique {
        iter,
        seen: HashSet::new(),
    }
}

/// Iterator for [`unique`].
#[derive(Debug)]
pub struct Unique<I> {
    iter: I,
    seen: HashSet<NodeId>,
}

impl<I: Iterator<Item = NodeId>> Iterator for Unique<I> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            let node = self.iter.next()?;
            if self.seen.insert(node) {
                return Some(node);
            }
        }
    }
}

/// Order `nodes` so that every node appears before any of its parents that
/// are also in `nodes`.
///
/// The input is read to completion up front; emission is lazy. Parents
/// outside the input set are skipped and never emitted. An input containing
/// a cycle starves the pending stack, ending the iterator after the acyclic
/// prefix.
pub fn toposort(dag: &Dag, nodes: impl IntoIterator<Item = NodeId>) -> Toposort<'_> {
    let nodes: Vec<NodeId> = nodes.into_iter().collect();

    // Every node starts at 1; each child edge within the input set adds 1.
    let mut in_degree: HashMap<NodeId, usize> = nodes.iter().map(|node| (*node, 1)).collect();
    for node in &nodes {
        for parent in &dag.get(*node).parents {
            if let Some(degree) = in_degree.get_mut(parent) {
                *degree += 1;
            }
        }
    }

    let pending: Vec<NodeId> = nodes
        .iter()
        .copied()
        .filter(|node| in_degree[node] == 1)
        .collect();

    Toposort {
        dag,
        in_degree,
        pending,
    }
}

/// Iterator for [`toposort`].
#[derive(Debug)]
pub struct Toposort<'a> {
    dag: &'a Dag,
    in_degree: HashMap<NodeId, usize>,
    pending: Vec<NodeId>,
}

impl Iterator for Toposort<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        // Pending nodes are popped from the back, so among nodes that
        // become ready together, the most recently discovered one is
        // emitted first. Branch lineages therefore render nearest their
        // merge row.
        let node = self.pending.pop()?;
        for parent in &self.dag.get(node).parents {
            let degree = match self.in_degree.get_mut(parent) {
                Some(degree) => degree,
                None => continue,
            };
            if *degree == 0 {
                continue;
            }
            *degree -= 1;
            if *degree == 1 {
                self.pending.push(*parent);
            }
        }
        self.in_degree.insert(node, 0);
        Some(node)
    }
}
