//! Dependency graph construction and traversal.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};
use std::fmt;

use kiln_core::identifier::ProjectIdentifier;
use kiln_core::revision::Revision;
use kiln_util::errors::KilnError;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, EdgeRef};
use petgraph::Direction;

/// A project in the dependency graph with its chosen revision.
///
/// `version` is `None` for the root and for projects not yet expanded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    pub identifier: ProjectIdentifier,
    pub version: Option<Revision>,
}

impl Node {
    pub fn new(identifier: ProjectIdentifier) -> Self {
        Self {
            identifier,
            version: None,
        }
    }

    pub fn name(&self) -> &str {
        self.identifier.project_name()
    }

    /// Ordering key for deterministic traversal.
    fn sort_key(&self) -> (&str, &ProjectIdentifier) {
        (self.identifier.project_name(), &self.identifier)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(rev) => write!(f, "{} {}", self.name(), rev),
            None => f.write_str(self.name()),
        }
    }
}

/// Dependency graph backed by petgraph. Edges point from dependent to dependency.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<Node, ()>,
    index: HashMap<ProjectIdentifier, NodeIndex>,
    pub root: Option<NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            root: None,
        }
    }

    /// Add or retrieve a node. If the identifier already exists, returns the existing index.
    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        if let Some(&idx) = self.index.get(&node.identifier) {
            return idx;
        }
        let key = node.identifier.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(key, idx);
        idx
    }

    pub fn set_root(&mut self, idx: NodeIndex) {
        self.root = Some(idx);
    }

    /// Add a dependency edge from `from` to `to`. Duplicate edges are ignored.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        if !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Drop every outgoing edge of `idx`, returning the former targets.
    pub fn remove_outgoing(&mut self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut targets = Vec::new();
        // Removing an edge may renumber the others, so look up one at a time.
        loop {
            let next = self.graph.edges(idx).next().map(|e| (e.id(), e.target()));
            let Some((id, target)) = next else {
                break;
            };
            self.graph.remove_edge(id);
            targets.push(target);
        }
        targets
    }

    pub fn find(&self, identifier: &ProjectIdentifier) -> Option<NodeIndex> {
        self.index.get(identifier).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &Node {
        &self.graph[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> &mut Node {
        &mut self.graph[idx]
    }

    /// All nodes except the root, in name order.
    pub fn all_nodes(&self) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self
            .graph
            .node_indices()
            .filter(|&idx| Some(idx) != self.root)
            .map(|idx| &self.graph[idx])
            .collect();
        nodes.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        nodes
    }

    /// Direct dependencies of a node, in name order.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.sorted(self.graph.neighbors_directed(idx, Direction::Outgoing))
    }

    /// Reverse dependencies (who depends on this node), in name order.
    pub fn dependents_of(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.sorted(self.graph.neighbors_directed(idx, Direction::Incoming))
    }

    fn sorted(&self, indices: impl Iterator<Item = NodeIndex>) -> Vec<NodeIndex> {
        let mut out: Vec<NodeIndex> = indices.collect::<BTreeSet<_>>().into_iter().collect();
        out.sort_by(|&a, &b| self.graph[a].sort_key().cmp(&self.graph[b].sort_key()));
        out
    }

    /// Every node reachable from the root, the root included.
    pub fn reachable_from_root(&self) -> HashSet<NodeIndex> {
        let mut seen = HashSet::new();
        let Some(root) = self.root else {
            return seen;
        };
        let mut bfs = Bfs::new(&self.graph, root);
        while let Some(idx) = bfs.next(&self.graph) {
            seen.insert(idx);
        }
        seen
    }

    /// A path of dependency edges from `from` to `to`, both ends included.
    pub fn path_between(&self, from: NodeIndex, to: NodeIndex) -> Option<Vec<NodeIndex>> {
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        if self.dfs_path(from, to, &mut path, &mut visited) {
            Some(path)
        } else {
            None
        }
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for child in self.dependencies_of(current) {
            if self.dfs_path(child, target, path, visited) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// Copy of the graph restricted to `keep`. Node order is preserved.
    pub fn retain(&self, keep: &HashSet<NodeIndex>) -> DependencyGraph {
        let mut out = DependencyGraph::new();
        let mut mapping = HashMap::new();
        for idx in self.graph.node_indices().filter(|idx| keep.contains(idx)) {
            let new_idx = out.add_node(self.graph[idx].clone());
            mapping.insert(idx, new_idx);
        }
        for edge in self.graph.edge_references() {
            if let (Some(&from), Some(&to)) = (mapping.get(&edge.source()), mapping.get(&edge.target())) {
                out.add_edge(from, to);
            }
        }
        out.root = self.root.and_then(|r| mapping.get(&r).copied());
        out
    }

    /// Render a cycle through `idx` as `A -> B -> A`, if one exists.
    pub fn cycle_through(&self, idx: NodeIndex) -> Option<String> {
        self.dependencies_of(idx).into_iter().find_map(|child| {
            let path = self.path_between(child, idx)?;
            let mut names = vec![self.graph[idx].name().to_string()];
            names.extend(path.iter().map(|&i| self.graph[i].name().to_string()));
            Some(names.join(" -> "))
        })
    }

    /// Topological order, dependencies before dependents, root last.
    ///
    /// Ties between nodes that become ready together are broken by project
    /// name and identifier, so equal graphs always give equal orders.
    pub fn build_order(&self) -> Result<Vec<Node>, KilnError> {
        let mut pending: HashMap<NodeIndex, usize> = HashMap::new();
        let mut ready = BinaryHeap::new();
        for idx in self.graph.node_indices() {
            if Some(idx) == self.root {
                continue;
            }
            let deps = self.dependencies_of(idx).len();
            if deps == 0 {
                let node = &self.graph[idx];
                ready.push(Reverse((
                    node.name().to_string(),
                    node.identifier.clone(),
                    idx,
                )));
            } else {
                pending.insert(idx, deps);
            }
        }

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse((_, _, idx))) = ready.pop() {
            order.push(self.graph[idx].clone());
            for dependent in self.dependents_of(idx) {
                if Some(dependent) == self.root {
                    continue;
                }
                if let Some(count) = pending.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        pending.remove(&dependent);
                        let node = &self.graph[dependent];
                        ready.push(Reverse((
                            node.name().to_string(),
                            node.identifier.clone(),
                            dependent,
                        )));
                    }
                }
            }
        }

        if !pending.is_empty() {
            let mut stuck: Vec<NodeIndex> = pending.keys().copied().collect();
            stuck.sort_by(|&a, &b| self.graph[a].sort_key().cmp(&self.graph[b].sort_key()));
            let path = stuck
                .iter()
                .find_map(|&idx| self.cycle_through(idx))
                .unwrap_or_else(|| {
                    stuck
                        .iter()
                        .map(|&i| self.graph[i].name())
                        .collect::<Vec<_>>()
                        .join(", ")
                });
            return Err(KilnError::CycleDetected { path });
        }

        if let Some(root) = self.root {
            order.push(self.graph[root].clone());
        }
        Ok(order)
    }

    /// Print the dependency tree to a string.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        let Some(root) = self.root else {
            return output;
        };

        output.push_str(&format!("{}\n", self.graph[root]));

        let mut visited = HashSet::new();
        visited.insert(root);
        let deps = self.dependencies_of(root);
        let count = deps.len();
        for (i, idx) in deps.into_iter().enumerate() {
            let is_last = i == count - 1;
            self.print_subtree(&mut output, idx, "", is_last, 1, max_depth, &mut visited);
        }
        output
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.graph[idx]));

        if let Some(max) = max_depth {
            if depth >= max {
                return;
            }
        }

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let deps = self.dependencies_of(idx);
        let count = deps.len();
        for (i, child) in deps.into_iter().enumerate() {
            let is_last = i == count - 1;
            self.print_subtree(
                output,
                child,
                &child_prefix,
                is_last,
                depth + 1,
                max_depth,
                visited,
            );
        }

        visited.remove(&idx);
    }

    /// Find the path from root to a specific dependency.
    ///
    /// Accepts a project name or the full link as written in a manifest.
    pub fn find_path(&self, name: &str) -> Option<Vec<&Node>> {
        let root = self.root?;
        let target = self.resolve_name(name)?;
        let path = self.path_between(root, target)?;
        Some(path.iter().map(|&idx| &self.graph[idx]).collect())
    }

    fn resolve_name(&self, name: &str) -> Option<NodeIndex> {
        let mut matches: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&idx| {
                let id = &self.graph[idx].identifier;
                id.project_name() == name || id.link() == name
            })
            .collect();
        matches.sort_by(|&a, &b| self.graph[a].sort_key().cmp(&self.graph[b].sort_key()));
        matches.first().copied()
    }

    /// Inverted tree for one project: who depends on it, up to the root.
    pub fn print_inverted_tree(&self, name: &str) -> String {
        let mut output = String::new();
        let Some(idx) = self.resolve_name(name) else {
            return output;
        };

        output.push_str(&format!("{}\n", self.graph[idx]));

        let mut visited = HashSet::new();
        visited.insert(idx);

        let dependents = self.dependents_of(idx);
        let count = dependents.len();
        for (i, dep_idx) in dependents.into_iter().enumerate() {
            let is_last = i == count - 1;
            self.print_inverted_subtree(&mut output, dep_idx, "", is_last, &mut visited);
        }

        output
    }

    fn print_inverted_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.graph[idx]));

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let dependents = self.dependents_of(idx);
        let count = dependents.len();
        for (i, dep_idx) in dependents.into_iter().enumerate() {
            let is_last = i == count - 1;
            self.print_inverted_subtree(output, dep_idx, &child_prefix, is_last, visited);
        }

        visited.remove(&idx);
    }

    /// Graphviz rendering of the graph, nodes and edges in name order.
    pub fn to_dot(&self) -> String {
        let mut indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        indices.sort_by(|&a, &b| self.graph[a].sort_key().cmp(&self.graph[b].sort_key()));

        let mut output = String::from("digraph {\n");
        for &idx in &indices {
            output.push_str(&format!("    {};\n", dot_label(&self.graph[idx])));
        }
        for &idx in &indices {
            for child in self.dependencies_of(idx) {
                output.push_str(&format!(
                    "    {} -> {};\n",
                    dot_label(&self.graph[idx]),
                    dot_label(&self.graph[child])
                ));
            }
        }
        output.push_str("}\n");
        output
    }

    /// Number of nodes (excluding root).
    pub fn len(&self) -> usize {
        let total = self.graph.node_count();
        if self.root.is_some() {
            total.saturating_sub(1)
        } else {
            total
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn dot_label(node: &Node) -> String {
    format!("\"{}\"", node.to_string().replace('"', "\\\""))
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
