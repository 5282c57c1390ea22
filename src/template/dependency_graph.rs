//! Dependency graph over the resources of one template.
//!
//! Edges point from a resource to the resources it depends on. The graph is
//! used for cycle detection during assembly and for computing a deployment
//! order in which every dependency precedes its dependents.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use super::resource::ResourceRef;
use crate::core::ArmError;

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is currently being visited (in the DFS stack).
    Gray,
    /// Node has been fully visited.
    Black,
}

/// Directed graph of resource references.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<ResourceRef, ()>,
    node_map: HashMap<(String, String), NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node if it is not present yet and return its index.
    ///
    /// Nodes are keyed case-insensitively, like ARM resource ids.
    pub fn add_resource(&mut self, node: ResourceRef) -> NodeIndex {
        let key = node.normalized();
        if let Some(&index) = self.node_map.get(&key) {
            index
        } else {
            let index = self.graph.add_node(node);
            self.node_map.insert(key, index);
            index
        }
    }

    /// Record that `from` depends on `to`.
    pub fn add_dependency(&mut self, from: ResourceRef, to: ResourceRef) {
        let from_idx = self.add_resource(from);
        let to_idx = self.add_resource(to);

        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// Detect cycles using DFS with colors.
    ///
    /// # Errors
    ///
    /// Returns [`ArmError::CircularDependency`] with the cycle rendered as
    /// `a → b → a`.
    pub fn detect_cycles(&self) -> Result<(), ArmError> {
        let mut colors: HashMap<NodeIndex, Color> =
            self.graph.node_indices().map(|node| (node, Color::White)).collect();
        let mut path: Vec<NodeIndex> = Vec::new();

        for node in self.graph.node_indices() {
            if matches!(colors.get(&node), Some(Color::White))
                && let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path)
            {
                let chain = cycle
                    .iter()
                    .map(|idx| self.graph[*idx].to_string())
                    .collect::<Vec<_>>()
                    .join(" → ");
                return Err(ArmError::CircularDependency {
                    chain,
                });
            }
        }

        Ok(())
    }

    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        for neighbor in self.graph.neighbors(node) {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    let cycle_start = path.iter().position(|n| *n == neighbor).unwrap_or(0);
                    let mut cycle = path[cycle_start..].to_vec();
                    cycle.push(neighbor);
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }

    /// Nodes ordered so that every dependency comes before its dependents.
    pub fn topological_order(&self) -> Result<Vec<ResourceRef>, ArmError> {
        self.detect_cycles()?;

        let indices = toposort(&self.graph, None).map_err(|cycle| ArmError::CircularDependency {
            chain: self.graph[cycle.node_id()].to_string(),
        })?;
        // toposort puts dependents first because edges point at dependencies
        Ok(indices.into_iter().rev().map(|idx| self.graph[idx].clone()).collect())
    }

    /// Direct dependencies of a node.
    pub fn direct_dependencies(&self, node: &ResourceRef) -> Vec<ResourceRef> {
        self.node_map
            .get(&node.normalized())
            .map(|&idx| self.graph.neighbors(idx).map(|n| self.graph[n].clone()).collect())
            .unwrap_or_default()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
