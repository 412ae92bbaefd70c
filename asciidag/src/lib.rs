//! Render directed acyclic graphs of commit-like nodes as ASCII diagrams in
//! the style of `git log --graph`.
//!
//! Build a [`node::Dag`] arena, then stream it through a [`graph::Graph`]:
//! each node gets one principal row marked with `*`, and the surrounding
//! rows draw the branch lines connecting it to its parents, including
//! multi-way (octopus) merges.

#![warn(missing_docs)]
#![warn(
    clippy::all,
    clippy::as_conversions,
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro
)]
#![allow(clippy::too_many_arguments, clippy::blocks_in_conditions)]

pub mod color;
pub mod graph;
pub mod node;
pub mod sequence;

pub use graph::{Graph, GraphOptions};
pub use node::{Dag, Node, NodeId};
