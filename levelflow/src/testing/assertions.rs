//! Test assertions for levels and execution logs.

use super::ExecutionLog;
use crate::graph::DependencyGraph;
use crate::levels::Levels;

/// Asserts that every scheduled task sits in a strictly later level than
/// each of its dependencies.
pub fn assert_dependencies_precede(graph: &DependencyGraph, levels: &Levels) {
    for (task, deps) in graph.iter() {
        let Some(level) = levels.level_of(task) else {
            continue;
        };
        for dep in deps {
            let dep_level = levels
                .level_of(dep)
                .unwrap_or_else(|| panic!("dependency '{dep}' of '{task}' was not scheduled"));
            assert!(
                dep_level < level,
                "'{task}' (level {level}) must come after '{dep}' (level {dep_level})"
            );
        }
    }
}

/// Asserts that `first` finished before `second` started.
pub fn assert_finished_before(log: &ExecutionLog, first: &str, second: &str) {
    assert!(
        log.finished_before_started(first, second),
        "Expected '{first}' to finish before '{second}' started. Events: {:?}",
        log.events()
    );
}

/// Asserts that the task never ran.
pub fn assert_not_run(log: &ExecutionLog, task: &str) {
    assert!(
        !log.ran(task),
        "Expected '{task}' not to run. Events: {:?}",
        log.events()
    );
}
