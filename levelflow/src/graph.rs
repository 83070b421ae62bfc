//! Dependency graph supplied by the caller.

use crate::errors::GraphValidationError;
use crate::levels::Levels;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Adjacency list mapping each task to the tasks it depends on.
///
/// The graph is expected to be acyclic. It is not checked on construction:
/// tasks on a cycle are simply never scheduled. Call
/// [`DependencyGraph::validate`] to fail fast instead. Tasks that only appear
/// as a dependency are treated as having no dependencies of their own.
///
/// Serializes as a plain JSON object, e.g. `{"eggs": ["db"], "db": []}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyGraph {
    edges: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the dependencies of a task, replacing any previous declaration.
    #[must_use]
    pub fn depends_on(
        mut self,
        task: impl Into<String>,
        deps: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.insert(task, deps);
        self
    }

    /// Declares the dependencies of a task, returning the previous declaration.
    pub fn insert(
        &mut self,
        task: impl Into<String>,
        deps: impl IntoIterator<Item = impl Into<String>>,
    ) -> Option<Vec<String>> {
        self.edges
            .insert(task.into(), deps.into_iter().map(Into::into).collect())
    }

    /// Returns the declared dependencies of a task.
    ///
    /// Tasks that only appear as a dependency yield an empty slice.
    #[must_use]
    pub fn dependencies(&self, task: &str) -> &[String] {
        self.edges.get(task).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns true if the task appears anywhere in the graph.
    #[must_use]
    pub fn contains(&self, task: &str) -> bool {
        self.edges.contains_key(task)
            || self.edges.values().any(|deps| deps.iter().any(|d| d == task))
    }

    /// Returns every task mentioned in the graph, as key or as dependency.
    #[must_use]
    pub fn nodes(&self) -> BTreeSet<&str> {
        self.edges
            .iter()
            .flat_map(|(task, deps)| {
                std::iter::once(task.as_str()).chain(deps.iter().map(String::as_str))
            })
            .collect()
    }

    /// Iterates over the declared `task -> dependencies` entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.edges
            .iter()
            .map(|(task, deps)| (task.as_str(), deps.as_slice()))
    }

    /// Returns the number of declared entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns true if nothing was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Groups the graph into execution levels.
    #[must_use]
    pub fn levels(&self) -> Levels {
        Levels::build(self)
    }

    /// Checks the graph for self-dependencies and cycles.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, in task-name order.
    pub fn validate(&self) -> Result<(), GraphValidationError> {
        for (task, deps) in &self.edges {
            if deps.contains(task) {
                return Err(GraphValidationError::SelfDependency { task: task.clone() });
            }
        }

        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for task in self.edges.keys() {
            if !visited.contains(task.as_str()) {
                if let Some(cycle) = self.dfs_cycle(task, &mut visited, &mut rec_stack, &mut path) {
                    return Err(GraphValidationError::Cycle { path: cycle });
                }
            }
        }

        Ok(())
    }

    fn dfs_cycle<'a>(
        &'a self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        rec_stack: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        visited.insert(node);
        rec_stack.insert(node);
        path.push(node);

        for dep in self.dependencies(node) {
            if !visited.contains(dep.as_str()) {
                if let Some(cycle) = self.dfs_cycle(dep, visited, rec_stack, path) {
                    return Some(cycle);
                }
            } else if rec_stack.contains(dep.as_str()) {
                let start = path.iter().position(|n| *n == dep.as_str()).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|n| (*n).to_string()).collect();
                cycle.push(dep.clone());
                return Some(cycle);
            }
        }

        path.pop();
        rec_stack.remove(node);
        None
    }
}

impl<K, I, D> FromIterator<(K, I)> for DependencyGraph
where
    K: Into<String>,
    I: IntoIterator<Item = D>,
    D: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, I)>>(iter: T) -> Self {
        let mut graph = Self::new();
        for (task, deps) in iter {
            graph.insert(task, deps);
        }
        graph
    }
}

impl From<HashMap<String, Vec<String>>> for DependencyGraph {
    fn from(map: HashMap<String, Vec<String>>) -> Self {
        Self {
            edges: map.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<String, Vec<String>>> for DependencyGraph {
    fn from(edges: BTreeMap<String, Vec<String>>) -> Self {
        Self { edges }
    }
}
