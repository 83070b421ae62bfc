//! Level Builder: groups tasks into dependency levels.
//!
//! A level is a set of tasks whose dependencies all sit in strictly earlier
//! levels. The builder is Kahn's algorithm, except that every frontier is
//! emitted as a whole level instead of being flattened into one order:
//!
//! ```text
//! {db: [], eggs: [db], milk: [db], scramble: [eggs, milk]}
//!
//! level 0: db
//! level 1: eggs, milk
//! level 2: scramble
//! ```

use crate::graph::DependencyGraph;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Ordered sequence of task groups.
///
/// Only built by [`Levels::build`] or [`Levels::flat`], so every value keeps
/// dependencies in strictly earlier levels. Serializes as nested arrays for
/// inspection; it is never read back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Levels {
    groups: Vec<Vec<String>>,
}

impl Levels {
    /// A single level holding every task in the given order.
    ///
    /// This is the layout of a pipeline without a dependency graph.
    #[must_use]
    pub fn flat(tasks: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            groups: vec![tasks.into_iter().map(Into::into).collect()],
        }
    }

    /// Builds levels from a dependency graph.
    ///
    /// Seeds are taken in task-name order and later levels in discovery
    /// order. Tasks on a cycle never reach in-degree zero and are left out.
    #[must_use]
    pub fn build(graph: &DependencyGraph) -> Self {
        // Invert "depends on" into "depended on by".
        let mut forward: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (task, _) in graph.iter() {
            forward.entry(task).or_default();
        }
        for (task, deps) in graph.iter() {
            for dep in deps {
                forward.entry(dep.as_str()).or_default().push(task);
            }
        }

        let mut in_degree: BTreeMap<&str, usize> = forward.keys().map(|node| (*node, 0)).collect();
        for successors in forward.values() {
            for successor in successors {
                *in_degree.entry(*successor).or_default() += 1;
            }
        }

        let mut frontier: Vec<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(node, _)| *node)
            .collect();

        let mut groups = Vec::new();
        let mut scheduled = 0;
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for node in &frontier {
                for successor in forward.get(node).into_iter().flatten() {
                    if let Some(degree) = in_degree.get_mut(successor) {
                        *degree -= 1;
                        // A dependent always lands in a later level than its dependency.
                        if *degree == 0 {
                            next.push(*successor);
                        }
                    }
                }
            }
            scheduled += frontier.len();
            groups.push(frontier.iter().map(|node| (*node).to_string()).collect());
            frontier = next;
        }

        if scheduled < in_degree.len() {
            let starved: Vec<&str> = in_degree
                .iter()
                .filter(|(_, degree)| **degree > 0)
                .map(|(node, _)| *node)
                .collect();
            debug!(?starved, "tasks on a dependency cycle were not scheduled");
        }

        Self { groups }
    }

    /// Returns the groups in execution order.
    #[must_use]
    pub fn groups(&self) -> &[Vec<String>] {
        &self.groups
    }

    /// Iterates over the levels in execution order.
    pub fn iter(&self) -> std::slice::Iter<'_, Vec<String>> {
        self.groups.iter()
    }

    /// Returns the number of levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true if there are no levels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns the total number of scheduled tasks.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    /// Returns the index of the level holding the task.
    #[must_use]
    pub fn level_of(&self, task: &str) -> Option<usize> {
        self.groups
            .iter()
            .position(|group| group.iter().any(|t| t == task))
    }

    /// Returns true if the task is scheduled in any level.
    #[must_use]
    pub fn contains(&self, task: &str) -> bool {
        self.level_of(task).is_some()
    }

    /// Appends a task to the first level if it is not already there.
    pub(crate) fn push_flat(&mut self, task: &str) {
        if self.groups.is_empty() {
            self.groups.push(Vec::new());
        }
        let group = &mut self.groups[0];
        if !group.iter().any(|t| t == task) {
            group.push(task.to_string());
        }
    }

    /// Consumes the levels, returning the groups.
    #[must_use]
    pub fn into_inner(self) -> Vec<Vec<String>> {
        self.groups
    }
}

impl<'a> IntoIterator for &'a Levels {
    type Item = &'a Vec<String>;
    type IntoIter = std::slice::Iter<'a, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::assert_dependencies_precede;
    use pretty_assertions::assert_eq;

    fn names(groups: &[&[&str]]) -> Vec<Vec<String>> {
        groups
            .iter()
            .map(|g| g.iter().map(|s| (*s).to_string()).collect())
            .collect()
    }

    fn breakfast() -> DependencyGraph {
        DependencyGraph::new()
            .depends_on("db", Vec::<String>::new())
            .depends_on("eggs", ["db"])
            .depends_on("milk", ["db"])
            .depends_on("scramble", ["eggs", "milk"])
            .depends_on("cereal", ["milk"])
            .depends_on("breakfast", ["scramble", "cereal"])
            .depends_on("carrots", ["db"])
            .depends_on("cabbages", ["db"])
    }

    #[test]
    fn test_flat_preserves_order() {
        let levels = Levels::flat(["milk", "eggs", "scramble"]);
        assert_eq!(levels.groups(), names(&[&["milk", "eggs", "scramble"]]).as_slice());
    }

    #[test]
    fn test_build_breakfast_levels() {
        let graph = breakfast();
        let levels = Levels::build(&graph);

        assert_eq!(
            levels.groups(),
            names(&[
                &["db"],
                &["cabbages", "carrots", "eggs", "milk"],
                &["cereal", "scramble"],
                &["breakfast"],
            ])
            .as_slice()
        );
        assert_eq!(levels.task_count(), 8);
        assert_dependencies_precede(&graph, &levels);
    }

    #[test]
    fn test_dependency_only_node_is_seeded() {
        let graph = DependencyGraph::new().depends_on("b", ["a"]);
        let levels = Levels::build(&graph);
        assert_eq!(levels.groups(), names(&[&["a"], &["b"]]).as_slice());
    }

    #[test]
    fn test_dependent_never_shares_level() {
        // c depends on both a and b, b depends on a: c must wait for b's level.
        let graph = DependencyGraph::new()
            .depends_on("b", ["a"])
            .depends_on("c", ["a", "b"]);
        let levels = Levels::build(&graph);
        assert_eq!(levels.groups(), names(&[&["a"], &["b"], &["c"]]).as_slice());
    }

    #[test]
    fn test_duplicate_dependency_still_resolves() {
        let graph = DependencyGraph::new().depends_on("b", ["a", "a"]);
        let levels = Levels::build(&graph);
        assert_eq!(levels.groups(), names(&[&["a"], &["b"]]).as_slice());
    }

    #[test]
    fn test_cycle_is_silently_dropped() {
        let graph = DependencyGraph::new()
            .depends_on("root", Vec::<String>::new())
            .depends_on("a", ["b"])
            .depends_on("b", ["a"])
            .depends_on("c", ["root"]);
        let levels = Levels::build(&graph);

        assert_eq!(levels.groups(), names(&[&["root"], &["c"]]).as_slice());
        assert!(!levels.contains("a"));
        assert!(!levels.contains("b"));
    }

    #[test]
    fn test_empty_graph_has_no_levels() {
        let levels = Levels::build(&DependencyGraph::new());
        assert!(levels.is_empty());
        assert_eq!(levels.task_count(), 0);
    }

    #[test]
    fn test_wide_diamond_property() {
        let mut graph = DependencyGraph::new();
        for i in 0..20 {
            let deps: Vec<String> = (0..i).filter(|j| i % (j + 1) == 0).map(|j| format!("t{j}")).collect();
            graph.insert(format!("t{i}"), deps);
        }
        let levels = Levels::build(&graph);

        assert_eq!(levels.task_count(), 20);
        assert_dependencies_precede(&graph, &levels);
    }

    #[test]
    fn test_push_flat_is_idempotent() {
        let mut levels = Levels::default();
        levels.push_flat("a");
        levels.push_flat("b");
        levels.push_flat("a");
        assert_eq!(levels.groups(), names(&[&["a", "b"]]).as_slice());
    }

    #[test]
    fn test_serializes_as_nested_arrays() {
        let levels = Levels::build(&DependencyGraph::new().depends_on("b", ["a"]));
        let json = serde_json::to_value(&levels).unwrap();
        assert_eq!(json, serde_json::json!([["a"], ["b"]]));
    }
}
