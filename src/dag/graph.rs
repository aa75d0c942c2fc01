// src/dag/graph.rs

use std::collections::{HashMap, VecDeque};
use std::fmt;

use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::engine::TaskName;
use crate::errors::{DagRunError, Result};

/// Dependency graph keyed by task name.
///
/// Edge direction is `dependency -> dependent`. Each edge is weighted with
/// its insertion sequence number so successor lists come back in the order
/// they were wired, which keeps traversals deterministic.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    inner: DiGraph<TaskName, usize>,
    index: HashMap<TaskName, NodeIndex>,
    next_edge: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    InProgress,
    Done,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Node ids are dense and follow insertion order.
    pub fn add_node(&mut self, name: &str) -> Result<NodeIndex> {
        if self.index.contains_key(name) {
            return Err(DagRunError::TaskExists(name.to_string()));
        }
        let id = self.inner.add_node(name.to_string());
        self.index.insert(name.to_string(), id);
        Ok(id)
    }

    /// Add an edge between two nodes that are already in the graph.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) -> Result<()> {
        for id in [from, to] {
            if self.inner.node_weight(id).is_none() {
                return Err(DagRunError::TaskNotFound {
                    name: format!("#{}", id.index()),
                    required_by: None,
                });
            }
        }
        self.inner.add_edge(from, to, self.next_edge);
        self.next_edge += 1;
        Ok(())
    }

    /// Add an edge `dependency -> dependent` by name.
    pub fn add_dependency(&mut self, dependency: &str, dependent: &str) -> Result<()> {
        let to = self.node_id(dependent).ok_or_else(|| DagRunError::TaskNotFound {
            name: dependent.to_string(),
            required_by: None,
        })?;
        let from = self.node_id(dependency).ok_or_else(|| DagRunError::TaskNotFound {
            name: dependency.to_string(),
            required_by: Some(dependent.to_string()),
        })?;
        self.add_edge(from, to)
    }

    pub fn node_id(&self, name: &str) -> Option<NodeIndex> {
        self.index.get(name).copied()
    }

    pub fn name(&self, id: NodeIndex) -> &str {
        &self.inner[id]
    }

    pub fn len(&self) -> usize {
        self.inner.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner.node_indices()
    }

    /// Direct successors in wiring order.
    pub fn successors(&self, id: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<(usize, NodeIndex)> = self
            .inner
            .edges_directed(id, Direction::Outgoing)
            .map(|e| (*e.weight(), e.target()))
            .collect();
        edges.sort_unstable_by_key(|(seq, _)| *seq);
        edges.into_iter().map(|(_, target)| target).collect()
    }

    /// In-degree of every node, indexed by `NodeIndex::index()`.
    pub fn in_degrees(&self) -> Vec<usize> {
        self.inner
            .node_indices()
            .map(|id| self.inner.edges_directed(id, Direction::Incoming).count())
            .collect()
    }

    pub fn out_degree(&self, id: NodeIndex) -> usize {
        self.inner.edges_directed(id, Direction::Outgoing).count()
    }

    /// Names of nodes without predecessors, sorted.
    pub fn sources(&self) -> Vec<&str> {
        let degrees = self.in_degrees();
        let mut names: Vec<&str> = self
            .inner
            .node_indices()
            .filter(|id| degrees[id.index()] == 0)
            .map(|id| self.name(id))
            .collect();
        names.sort_unstable();
        names
    }

    /// Names of nodes without successors, sorted.
    pub fn sinks(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .inner
            .node_indices()
            .filter(|id| self.out_degree(*id) == 0)
            .map(|id| self.name(id))
            .collect();
        names.sort_unstable();
        names
    }

    /// Cross-check used by tests and diagnostics.
    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.inner)
    }

    /// The authoritative pre-flight check: depth-first with back-edge
    /// reporting.
    pub fn check_acyclic(&self) -> Result<()> {
        self.dfs(|_| Ok(()))
    }

    /// Depth-first walk over every node, pre-order, roots in insertion
    /// order. Reaching a node that is still on the current path is a cycle;
    /// the error names that back edge.
    pub fn dfs<W>(&self, mut walker: W) -> Result<()>
    where
        W: FnMut(&str) -> anyhow::Result<()>,
    {
        struct Frame {
            node: NodeIndex,
            successors: Vec<NodeIndex>,
            pos: usize,
        }

        let mut color = vec![Color::Unvisited; self.len()];

        for root in self.inner.node_indices() {
            if color[root.index()] != Color::Unvisited {
                continue;
            }
            walker(self.name(root)).map_err(DagRunError::Walk)?;
            color[root.index()] = Color::InProgress;
            let mut stack = vec![Frame {
                node: root,
                successors: self.successors(root),
                pos: 0,
            }];

            while let Some(frame) = stack.last_mut() {
                let node = frame.node;
                let Some(&next) = frame.successors.get(frame.pos) else {
                    color[node.index()] = Color::Done;
                    stack.pop();
                    continue;
                };
                frame.pos += 1;

                match color[next.index()] {
                    Color::InProgress => {
                        return Err(DagRunError::CycleEdge {
                            from: self.name(node).to_string(),
                            to: self.name(next).to_string(),
                        });
                    }
                    Color::Done => {}
                    Color::Unvisited => {
                        walker(self.name(next)).map_err(DagRunError::Walk)?;
                        color[next.index()] = Color::InProgress;
                        stack.push(Frame {
                            node: next,
                            successors: self.successors(next),
                            pos: 0,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Breadth-first walk by in-degree peeling (Kahn). Nodes that never
    /// reach in-degree zero sit on a cycle and are reported sorted.
    pub fn bfs<W>(&self, mut walker: W) -> Result<()>
    where
        W: FnMut(&str) -> anyhow::Result<()>,
    {
        let mut degrees = self.in_degrees();
        let mut queue: VecDeque<NodeIndex> = self
            .inner
            .node_indices()
            .filter(|id| degrees[id.index()] == 0)
            .collect();
        let mut visited = 0usize;

        while let Some(node) = queue.pop_front() {
            walker(self.name(node)).map_err(DagRunError::Walk)?;
            visited += 1;
            for next in self.successors(node) {
                degrees[next.index()] -= 1;
                if degrees[next.index()] == 0 {
                    queue.push_back(next);
                }
            }
        }

        if visited < self.len() {
            let mut cyclic: Vec<TaskName> = self
                .inner
                .node_indices()
                .filter(|id| degrees[id.index()] != 0)
                .map(|id| self.name(id).to_string())
                .collect();
            cyclic.sort_unstable();
            return Err(DagRunError::CycleNodes(cyclic));
        }

        Ok(())
    }

    /// Names in a valid execution order.
    pub fn topological_order(&self) -> Result<Vec<TaskName>> {
        let mut order = Vec::with_capacity(self.len());
        self.bfs(|name| {
            order.push(name.to_string());
            Ok(())
        })?;
        Ok(order)
    }
}

/// Adjacency dump, one line per node in insertion order: `[A]-> [C,D,]`.
impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in self.inner.node_indices() {
            write!(f, "[{}]-> [", self.name(id))?;
            for next in self.successors(id) {
                write!(f, "{},", self.name(next))?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}
