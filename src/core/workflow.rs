//! Workflow container: the dependency graph of tasks.
//!
//! A `Workflow` owns its task nodes and the upstream adjacency between
//! them. Structure is validated locally (duplicate names, unknown
//! references, cycles) before anything crosses the network. Node order
//! in the serialized payload is insertion order; topological
//! scheduling is the gateway's job, the client only guarantees
//! determinism.

use chrono::{DateTime, Utc};
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::context::{self, WorkflowGuard};
use crate::core::task::TaskData;
use crate::error::{Error, Result};
use crate::flog;
use crate::remote::gateway::Gateway;
use crate::remote::identity::IdentityCache;

/// Shared mutable state behind a `Workflow` handle.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    pub name: String,
    pub description: Option<String>,
    /// Cron expression; interpreted by the gateway, opaque here.
    pub schedule: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub tenant: String,
    pub project: String,
    pub global_params: Vec<(String, String)>,
    pub resources: Vec<String>,
    pub tasks: HashMap<String, TaskData>,
    /// Task names in insertion order, for deterministic serialization.
    pub order: Vec<String>,
    /// downstream name -> set of upstream names.
    pub upstream: HashMap<String, BTreeSet<String>>,
}

impl WorkflowState {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            schedule: None,
            start_time: None,
            tenant: "default".to_string(),
            project: "flowgate".to_string(),
            global_params: Vec::new(),
            resources: Vec::new(),
            tasks: HashMap::new(),
            order: Vec::new(),
            upstream: HashMap::new(),
        }
    }
}

/// Handle to a workflow definition.
///
/// Cheap to clone; clones share the same underlying state. Tasks
/// constructed while this workflow is entered register into it.
#[derive(Debug, Clone)]
pub struct Workflow {
    inner: Arc<Mutex<WorkflowState>>,
}

/// Acknowledgement of a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReceipt {
    pub workflow: String,
    pub code: i64,
    pub version: i32,
}

impl Workflow {
    pub fn new(name: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WorkflowState::new(name))),
        }
    }

    /// New workflow taking tenant and project from client config.
    pub fn from_config(name: &str, config: &crate::config::Config) -> Self {
        let workflow = Self::new(name);
        {
            let mut state = workflow.state();
            state.tenant = config.tenant.clone();
            state.project = config.project.clone();
        }
        workflow
    }

    fn state(&self) -> MutexGuard<'_, WorkflowState> {
        self.inner.lock().expect("workflow state lock poisoned")
    }

    /// Whether two handles refer to the same workflow.
    pub fn ptr_eq(&self, other: &Workflow) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Make this workflow the active registration target for the
    /// current thread. Fails with `NestedWorkflow` if another workflow
    /// is already active on this thread.
    pub fn enter(&self) -> Result<WorkflowGuard> {
        context::activate(self)
    }

    pub fn name(&self) -> String {
        self.state().name.clone()
    }

    pub fn project(&self) -> String {
        self.state().project.clone()
    }

    pub fn tenant(&self) -> String {
        self.state().tenant.clone()
    }

    pub fn set_description(&self, description: &str) -> &Workflow {
        self.state().description = Some(description.to_string());
        self
    }

    pub fn set_schedule(&self, cron: &str) -> &Workflow {
        self.state().schedule = Some(cron.to_string());
        self
    }

    pub fn set_start_time(&self, start: DateTime<Utc>) -> &Workflow {
        self.state().start_time = Some(start);
        self
    }

    pub fn set_tenant(&self, tenant: &str) -> &Workflow {
        self.state().tenant = tenant.to_string();
        self
    }

    pub fn set_project(&self, project: &str) -> &Workflow {
        self.state().project = project.to_string();
        self
    }

    pub fn add_global_param(&self, name: &str, value: &str) -> &Workflow {
        self.state()
            .global_params
            .push((name.to_string(), value.to_string()));
        self
    }

    pub fn add_resource(&self, name: &str) -> &Workflow {
        self.state().resources.push(name.to_string());
        self
    }

    /// Register a task node. Called by `Task::define`.
    pub fn register(&self, data: TaskData) -> Result<()> {
        let mut state = self.state();
        if state.tasks.contains_key(&data.name) {
            return Err(Error::DuplicateNode {
                workflow: state.name.clone(),
                name: data.name,
            });
        }
        state.order.push(data.name.clone());
        state.upstream.insert(data.name.clone(), BTreeSet::new());
        state.tasks.insert(data.name.clone(), data);
        Ok(())
    }

    /// Insert an upstream -> downstream edge. Both endpoints must be
    /// registered in this workflow. Re-inserting an edge is a no-op.
    pub fn add_edge(&self, upstream: &str, downstream: &str) -> Result<()> {
        let mut state = self.state();
        for name in [upstream, downstream] {
            if !state.tasks.contains_key(name) {
                return Err(Error::UnknownNode {
                    workflow: state.name.clone(),
                    name: name.to_string(),
                });
            }
        }
        state
            .upstream
            .get_mut(downstream)
            .expect("registered node has an upstream set")
            .insert(upstream.to_string());
        Ok(())
    }

    pub fn task_count(&self) -> usize {
        self.state().tasks.len()
    }

    pub fn edge_count(&self) -> usize {
        self.state().upstream.values().map(|s| s.len()).sum()
    }

    pub fn contains_task(&self, name: &str) -> bool {
        self.state().tasks.contains_key(name)
    }

    /// Task names in insertion order.
    pub fn task_names(&self) -> Vec<String> {
        self.state().order.clone()
    }

    /// Snapshot of one task's node record.
    pub fn get_task(&self, name: &str) -> Option<TaskData> {
        self.state().tasks.get(name).cloned()
    }

    /// Names of the tasks `name` depends on.
    pub fn upstream_of(&self, name: &str) -> BTreeSet<String> {
        self.state().upstream.get(name).cloned().unwrap_or_default()
    }

    pub(crate) fn with_task(&self, name: &str, f: impl FnOnce(&mut TaskData)) {
        if let Some(data) = self.state().tasks.get_mut(name) {
            f(data);
        }
    }

    pub(crate) fn snapshot(&self) -> WorkflowState {
        self.state().clone()
    }

    /// Check the graph is structurally sound: every referenced task
    /// (including switch branch targets) resolves in-graph, and the
    /// edge set is acyclic. Runs before any network call.
    pub fn validate(&self) -> Result<()> {
        let state = self.state();

        for data in state.tasks.values() {
            for referenced in data.params.referenced_tasks() {
                if !state.tasks.contains_key(referenced) {
                    return Err(Error::UnknownNode {
                        workflow: state.name.clone(),
                        name: referenced.to_string(),
                    });
                }
            }
        }

        let mut graph: DiGraph<String, ()> = DiGraph::new();
        let mut indices: HashMap<&str, NodeIndex> = HashMap::new();
        for name in &state.order {
            indices.insert(name, graph.add_node(name.clone()));
        }
        for down in &state.order {
            for up in &state.upstream[down] {
                graph.add_edge(indices[up.as_str()], indices[down.as_str()], ());
            }
        }

        if toposort(&graph, None).is_err() {
            for scc in tarjan_scc(&graph) {
                let cyclic = scc.len() > 1 || graph.find_edge(scc[0], scc[0]).is_some();
                if cyclic {
                    let mut cycle: Vec<String> =
                        scc.iter().map(|&i| graph[i].clone()).collect();
                    cycle.push(cycle[0].clone());
                    return Err(Error::CyclicDependency {
                        workflow: state.name.clone(),
                        cycle,
                    });
                }
            }
        }

        Ok(())
    }

    /// Validate, resolve identities, serialize, and push the
    /// definition to the gateway in create-only mode.
    ///
    /// Structural errors abort before any network traffic; a gateway
    /// rejection surfaces as `RemoteRejected` with nothing partially
    /// submitted by this client.
    pub fn submit(&self, gateway: &Gateway) -> Result<SubmitReceipt> {
        self.validate()?;
        let state = self.snapshot();
        flog!(
            "submitting workflow '{}' ({} tasks, {} edges)",
            state.name,
            state.order.len(),
            state.upstream.values().map(|s| s.len()).sum::<usize>()
        );

        // Identity cache lives for exactly one submission run.
        let mut cache = IdentityCache::new();
        let payload = crate::wire::assemble(&state, gateway, &mut cache)?;
        gateway.create_workflow(&state.project, &payload)?;

        flog!(
            "workflow '{}' submitted as code {} v{}",
            state.name,
            payload.code,
            payload.version
        );
        Ok(SubmitReceipt {
            workflow: state.name,
            code: payload.code,
            version: payload.version,
        })
    }

    /// Submit, then instruct the gateway to start an execution
    /// immediately. Execution itself happens remotely.
    pub fn run(&self, gateway: &Gateway) -> Result<SubmitReceipt> {
        let receipt = self.submit(gateway)?;
        gateway.start_workflow(&self.project(), &receipt.workflow)?;
        flog!("workflow '{}' started", receipt.workflow);
        Ok(receipt)
    }
}
