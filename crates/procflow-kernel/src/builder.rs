//! Process builder.
//!
//! Fluent API for constructing process definitions programmatically.
//! Authoring UX proper lives with collaborators; this builder exists for
//! their glue code and for tests.

use crate::process::{Connection, LifecycleStatus, Process, Step};

/// Fluent builder over [`Process`].
///
/// `then` chains a step onto the previously added one; `step` adds
/// without connecting so arbitrary graph shapes stay expressible via
/// explicit `connect` calls. Connection ids are generated as `e1`, `e2`,
/// ... in insertion order.
pub struct ProcessBuilder {
    process: Process,
    last_step: Option<String>,
    next_edge: usize,
}

impl ProcessBuilder {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            process: Process::new(id, name),
            last_step: None,
            next_edge: 1,
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.process.description = desc.to_string();
        self
    }

    pub fn lifecycle(mut self, lifecycle: LifecycleStatus) -> Self {
        self.process.lifecycle = lifecycle;
        self
    }

    /// Add a step without connecting it.
    pub fn step(mut self, step: Step) -> Self {
        self.last_step = Some(step.id.clone());
        self.process.steps.push(step);
        self
    }

    /// Add a step and connect it from the previously added one.
    pub fn then(mut self, step: Step) -> Self {
        let id = step.id.clone();
        if let Some(previous) = self.last_step.take() {
            self = self.connect(&previous, &id);
        }
        self.last_step = Some(id);
        self.process.steps.push(step);
        self
    }

    pub fn connect(mut self, source: &str, target: &str) -> Self {
        let edge_id = format!("e{}", self.next_edge);
        self.next_edge += 1;
        self.process
            .connections
            .push(Connection::new(edge_id, source, target));
        self
    }

    pub fn connect_with_handle(mut self, source: &str, handle: &str, target: &str) -> Self {
        let edge_id = format!("e{}", self.next_edge);
        self.next_edge += 1;
        self.process.connections.push(
            Connection::new(edge_id, source, target).with_source_handle(handle),
        );
        self
    }

    pub fn build(mut self) -> Process {
        self.process.touch();
        self.process
    }
}
