//! Topological ordering of modifier dependencies.
//!
//! Nodes are stage-qualified value names (`new.password`,
//! `existing.password_salt`); an edge `before -> after` means the value
//! `before` must exist when the modifiers of `after` run. The sort is
//! deterministic: ties break by insertion order.

use std::collections::BTreeMap;

use thiserror::Error;

/// Nodes left on a cycle after all resolvable nodes were ordered.
#[derive(Debug, Error)]
#[error("dependency cycle among: {}", nodes.join(", "))]
pub struct CycleError {
    pub nodes: Vec<String>,
}

#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Insertion order, for deterministic output.
    order: Vec<String>,
    successors: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn add_node(&mut self, node: &str) {
        if !self.successors.contains_key(node) {
            self.order.push(node.to_string());
            self.successors.insert(node.to_string(), Vec::new());
        }
    }

    /// Record that `before` must be ordered before `after`.
    pub fn add_edge(&mut self, before: &str, after: &str) {
        self.add_node(before);
        self.add_node(after);
        if let Some(succ) = self.successors.get_mut(before) {
            if !succ.iter().any(|s| s == after) {
                succ.push(after.to_string());
            }
        }
    }

    /// Total order in which every node precedes its successors.
    pub fn sort(&self) -> Result<Vec<String>, CycleError> {
        let mut in_degree: BTreeMap<&str, usize> =
            self.order.iter().map(|n| (n.as_str(), 0)).collect();
        for succ in self.successors.values() {
            for s in succ {
                if let Some(d) = in_degree.get_mut(s.as_str()) {
                    *d += 1;
                }
            }
        }

        let mut sorted = Vec::with_capacity(self.order.len());
        let mut done: BTreeMap<&str, bool> =
            self.order.iter().map(|n| (n.as_str(), false)).collect();

        loop {
            let mut progressed = false;
            for node in &self.order {
                let blocked = done.get(node.as_str()).copied().unwrap_or(false)
                    || in_degree.get(node.as_str()).copied().unwrap_or(0) > 0;
                if blocked {
                    continue;
                }
                if let Some(flag) = done.get_mut(node.as_str()) {
                    *flag = true;
                }
                for s in self.successors.get(node.as_str()).into_iter().flatten() {
                    if let Some(d) = in_degree.get_mut(s.as_str()) {
                        *d -= 1;
                    }
                }
                sorted.push(node.clone());
                progressed = true;
            }
            if !progressed {
                break;
            }
        }

        if sorted.len() != self.order.len() {
            let nodes = self
                .order
                .iter()
                .filter(|n| !done.get(n.as_str()).copied().unwrap_or(false))
                .cloned()
                .collect();
            return Err(CycleError { nodes });
        }
        Ok(sorted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_dependencies_first() {
        let mut g = DependencyGraph::new();
        g.add_node("new.password");
        g.add_node("new.password_salt");
        g.add_edge("new.password_salt", "new.password");

        let sorted = g.sort().unwrap();
        let salt = sorted.iter().position(|n| n == "new.password_salt").unwrap();
        let pass = sorted.iter().position(|n| n == "new.password").unwrap();
        assert!(salt < pass);
    }

    #[test]
    fn keeps_insertion_order_for_independent_nodes() {
        let mut g = DependencyGraph::new();
        g.add_node("new.c");
        g.add_node("new.a");
        g.add_node("new.b");

        assert_eq!(g.sort().unwrap(), vec!["new.c", "new.a", "new.b"]);
    }

    #[test]
    fn detects_cycles() {
        let mut g = DependencyGraph::new();
        g.add_edge("new.a", "new.b");
        g.add_edge("new.b", "new.a");
        g.add_node("new.c");

        let err = g.sort().unwrap_err();
        assert_eq!(err.nodes, vec!["new.a", "new.b"]);
    }

    #[test]
    fn duplicate_edges_ignored() {
        let mut g = DependencyGraph::new();
        g.add_edge("a", "b");
        g.add_edge("a", "b");
        assert_eq!(g.sort().unwrap(), vec!["a", "b"]);
    }
}
