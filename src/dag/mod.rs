// src/dag/mod.rs

//! Dependency graph and its text renderings.
//!
//! - [`graph`] holds the node set and edges, plus the depth-first and
//!   breadth-first cycle checks.
//! - [`dot`] renders a graph as Graphviz text.

pub mod dot;
pub mod graph;

pub use dot::DotOptions;
pub use graph::Graph;
pub use petgraph::graph::NodeIndex;
