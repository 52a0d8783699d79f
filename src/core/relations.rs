//! Operator sugar for dependency edges.
//!
//! `a >> b` declares that `a` is upstream of `b`; `a << b` declares
//! that `a` is downstream of `b`. Either side may be a `Vec<Task>`,
//! which broadcasts the single side across the sequence (fan-out /
//! fan-in). There is deliberately no operator for sequence >> sequence:
//! the pairing would be ambiguous, so that case is a compile error, and
//! the dynamic [`link`] path rejects it with `InvalidDependency`.
//!
//! Operators mutate the graph only. They never resolve identities and
//! never touch the gateway.

use std::ops::{Shl, Shr};

use crate::core::task::Task;
use crate::error::{Error, Result};

/// One task or an ordered sequence of tasks, as an edge operand.
#[derive(Debug, Clone)]
pub enum TaskSet {
    One(Task),
    Many(Vec<Task>),
}

impl TaskSet {
    fn tasks(&self) -> &[Task] {
        match self {
            TaskSet::One(task) => std::slice::from_ref(task),
            TaskSet::Many(tasks) => tasks,
        }
    }
}

impl From<Task> for TaskSet {
    fn from(task: Task) -> Self {
        TaskSet::One(task)
    }
}

impl From<&Task> for TaskSet {
    fn from(task: &Task) -> Self {
        TaskSet::One(task.clone())
    }
}

impl From<Vec<Task>> for TaskSet {
    fn from(tasks: Vec<Task>) -> Self {
        TaskSet::Many(tasks)
    }
}

impl From<&[Task]> for TaskSet {
    fn from(tasks: &[Task]) -> Self {
        TaskSet::Many(tasks.to_vec())
    }
}

/// Insert upstream -> downstream edges between two operands.
///
/// Exactly one side may be a sequence; linking two sequences is
/// rejected as ambiguous rather than guessed as a product or zip.
/// All tasks must belong to the same workflow.
pub fn link(upstream: TaskSet, downstream: TaskSet) -> Result<()> {
    if let (TaskSet::Many(_), TaskSet::Many(_)) = (&upstream, &downstream) {
        return Err(Error::InvalidDependency(
            "cannot link two task sequences; the pairing is ambiguous, link them pairwise"
                .to_string(),
        ));
    }

    for up in upstream.tasks() {
        for down in downstream.tasks() {
            if !up.workflow().ptr_eq(down.workflow()) {
                return Err(Error::InvalidDependency(format!(
                    "tasks '{}' and '{}' belong to different workflows",
                    up.name(),
                    down.name()
                )));
            }
            down.workflow().add_edge(up.name(), down.name())?;
        }
    }
    Ok(())
}

fn must_link(upstream: TaskSet, downstream: TaskSet) {
    if let Err(err) = link(upstream, downstream) {
        panic!("{}", err);
    }
}

/// `a >> b`: a is upstream of b. Returns `b` for chaining.
///
/// # Panics
/// Panics if the tasks belong to different workflows. Use
/// [`Task::set_upstream`] for the fallible form.
impl Shr for Task {
    type Output = Task;

    fn shr(self, rhs: Task) -> Task {
        must_link(TaskSet::One(self), TaskSet::One(rhs.clone()));
        rhs
    }
}

/// `a >> vec![b, c]`: fan-out. Returns the sequence for chaining.
///
/// # Panics
/// Panics if the tasks belong to different workflows.
impl Shr<Vec<Task>> for Task {
    type Output = Vec<Task>;

    fn shr(self, rhs: Vec<Task>) -> Vec<Task> {
        must_link(TaskSet::One(self), TaskSet::Many(rhs.clone()));
        rhs
    }
}

/// `vec![a, b] >> c`: fan-in. Returns `c` for chaining.
///
/// # Panics
/// Panics if the tasks belong to different workflows.
impl Shr<Task> for Vec<Task> {
    type Output = Task;

    fn shr(self, rhs: Task) -> Task {
        must_link(TaskSet::Many(self), TaskSet::One(rhs.clone()));
        rhs
    }
}

/// `a << b`: a is downstream of b. Returns `b` for chaining.
///
/// # Panics
/// Panics if the tasks belong to different workflows.
impl Shl for Task {
    type Output = Task;

    fn shl(self, rhs: Task) -> Task {
        must_link(TaskSet::One(rhs.clone()), TaskSet::One(self));
        rhs
    }
}

/// `a << vec![b, c]`: fan-in. Returns the sequence for chaining.
///
/// # Panics
/// Panics if the tasks belong to different workflows.
impl Shl<Vec<Task>> for Task {
    type Output = Vec<Task>;

    fn shl(self, rhs: Vec<Task>) -> Vec<Task> {
        must_link(TaskSet::Many(rhs.clone()), TaskSet::One(self));
        rhs
    }
}

/// `vec![a, b] << c`: fan-out. Returns `c` for chaining.
///
/// # Panics
/// Panics if the tasks belong to different workflows.
impl Shl<Task> for Vec<Task> {
    type Output = Task;

    fn shl(self, rhs: Task) -> Task {
        must_link(TaskSet::One(rhs.clone()), TaskSet::Many(self));
        rhs
    }
}
