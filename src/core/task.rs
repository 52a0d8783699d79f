//! Task data model for the workflow DAG.
//!
//! A `Task` is a lightweight handle (workflow handle + node name) onto
//! the `TaskData` record owned by exactly one workflow. Constructing a
//! task registers it into the workflow that is active on the current
//! thread; the handle is then used to declare dependencies and adjust
//! scheduling attributes.

use serde::{Deserialize, Serialize};

use crate::core::context;
use crate::core::params::{
    HttpMethod, ProgramType, SqlType, SwitchBranch, TaskParams, TaskType,
};
use crate::core::relations::{link, TaskSet};
use crate::core::workflow::Workflow;
use crate::error::{Error, Result};

/// Scheduling priority, written to the wire as the server's enum string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskPriority {
    Highest,
    High,
    Medium,
    Low,
    Lowest,
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Medium
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskPriority::Highest => "HIGHEST",
            TaskPriority::High => "HIGH",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::Low => "LOW",
            TaskPriority::Lowest => "LOWEST",
        };
        write!(f, "{}", s)
    }
}

/// Whether a task participates in scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Flag {
    Yes,
    No,
}

impl Default for Flag {
    fn default() -> Self {
        Self::Yes
    }
}

/// Whether the timeout policy is active for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeoutFlag {
    Open,
    Close,
}

impl Default for TimeoutFlag {
    fn default() -> Self {
        Self::Close
    }
}

/// One node of the workflow DAG, owned by its workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskData {
    pub name: String,
    pub description: Option<String>,
    pub params: TaskParams,
    pub priority: TaskPriority,
    pub worker_group: String,
    pub environment_code: Option<String>,
    pub fail_retry_times: u32,
    pub fail_retry_interval: u32,
    pub delay_time: u32,
    pub timeout_flag: TimeoutFlag,
    pub timeout_notify_strategy: Option<String>,
    pub timeout: u32,
    pub flag: Flag,
}

impl TaskData {
    /// Create a node with system defaults for everything but name and params.
    pub fn new(name: &str, params: TaskParams) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            params,
            priority: TaskPriority::default(),
            worker_group: "default".to_string(),
            environment_code: None,
            fail_retry_times: 0,
            fail_retry_interval: 1,
            delay_time: 0,
            timeout_flag: TimeoutFlag::default(),
            timeout_notify_strategy: None,
            timeout: 0,
            flag: Flag::default(),
        }
    }

    pub fn task_type(&self) -> TaskType {
        self.params.task_type()
    }
}

/// Handle to a task registered in a workflow.
///
/// Cheap to clone; all state lives in the owning workflow.
#[derive(Debug, Clone)]
pub struct Task {
    workflow: Workflow,
    name: String,
}

impl Task {
    /// Register a task into the workflow active on this thread.
    ///
    /// Fails with `NoActiveWorkflow` outside a workflow context, with
    /// `DuplicateNode` if the name is already taken in the active
    /// workflow, and with `InvalidTaskParameter` if required
    /// type-specific fields are missing.
    pub fn define(name: &str, params: TaskParams) -> Result<Task> {
        params.validate(name)?;
        let workflow = context::current().ok_or_else(|| Error::NoActiveWorkflow {
            task: name.to_string(),
        })?;
        workflow.register(TaskData::new(name, params))?;
        Ok(Task {
            workflow,
            name: name.to_string(),
        })
    }

    /// Shell task running a script with the system shell.
    pub fn shell(name: &str, script: &str) -> Result<Task> {
        Task::define(
            name,
            TaskParams::Shell {
                raw_script: script.to_string(),
            },
        )
    }

    /// Python task running an inline script.
    pub fn python(name: &str, script: &str) -> Result<Task> {
        Task::define(
            name,
            TaskParams::Python {
                raw_script: script.to_string(),
            },
        )
    }

    /// SQL task against a named datasource.
    pub fn sql(name: &str, datasource: &str, sql: &str, sql_type: SqlType) -> Result<Task> {
        Task::define(
            name,
            TaskParams::Sql {
                datasource_name: datasource.to_string(),
                sql: sql.to_string(),
                sql_type,
            },
        )
    }

    /// HTTP probe task.
    pub fn http(name: &str, url: &str, method: HttpMethod) -> Result<Task> {
        Task::define(
            name,
            TaskParams::Http {
                url: url.to_string(),
                method,
                check_condition: None,
            },
        )
    }

    /// Spark job task.
    pub fn spark(
        name: &str,
        main_class: &str,
        main_jar: &str,
        program_type: ProgramType,
    ) -> Result<Task> {
        Task::define(
            name,
            TaskParams::Spark {
                main_class: main_class.to_string(),
                main_jar: main_jar.to_string(),
                program_type,
                deploy_mode: "cluster".to_string(),
            },
        )
    }

    /// Task that triggers another workflow by name.
    pub fn sub_workflow(name: &str, workflow_name: &str) -> Result<Task> {
        Task::define(
            name,
            TaskParams::SubWorkflow {
                workflow_name: workflow_name.to_string(),
            },
        )
    }

    /// Switch task routing to branch tasks by condition expression.
    pub fn switch(
        name: &str,
        branches: Vec<SwitchBranch>,
        default_task: Option<&str>,
    ) -> Result<Task> {
        Task::define(
            name,
            TaskParams::Switch {
                branches,
                default_task: default_task.map(|s| s.to_string()),
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    /// Snapshot of this task's node record.
    pub fn data(&self) -> TaskData {
        self.workflow
            .get_task(&self.name)
            .expect("task handle refers to a registered node")
    }

    fn update(&self, f: impl FnOnce(&mut TaskData)) -> &Task {
        self.workflow.with_task(&self.name, f);
        self
    }

    pub fn set_description(&self, description: &str) -> &Task {
        self.update(|d| d.description = Some(description.to_string()))
    }

    pub fn set_priority(&self, priority: TaskPriority) -> &Task {
        self.update(|d| d.priority = priority)
    }

    pub fn set_worker_group(&self, group: &str) -> &Task {
        self.update(|d| d.worker_group = group.to_string())
    }

    pub fn set_environment(&self, code: &str) -> &Task {
        self.update(|d| d.environment_code = Some(code.to_string()))
    }

    /// Retry `times` times with `interval` minutes between attempts.
    pub fn set_retry(&self, times: u32, interval: u32) -> &Task {
        self.update(|d| {
            d.fail_retry_times = times;
            d.fail_retry_interval = interval;
        })
    }

    /// Enable the timeout policy with a limit in minutes.
    pub fn set_timeout(&self, minutes: u32, notify_strategy: Option<&str>) -> &Task {
        self.update(|d| {
            d.timeout_flag = TimeoutFlag::Open;
            d.timeout = minutes;
            d.timeout_notify_strategy = notify_strategy.map(|s| s.to_string());
        })
    }

    pub fn set_delay(&self, minutes: u32) -> &Task {
        self.update(|d| d.delay_time = minutes)
    }

    /// Keep the task in the definition but exclude it from scheduling.
    pub fn disable(&self) -> &Task {
        self.update(|d| d.flag = Flag::No)
    }

    /// Declare that this task runs after `upstream` (one task or a
    /// sequence of tasks, fan-in).
    pub fn set_upstream(&self, upstream: impl Into<TaskSet>) -> Result<()> {
        link(upstream.into(), TaskSet::One(self.clone()))
    }

    /// Declare that `downstream` (one task or a sequence, fan-out)
    /// runs after this task.
    pub fn set_downstream(&self, downstream: impl Into<TaskSet>) -> Result<()> {
        link(TaskSet::One(self.clone()), downstream.into())
    }
}
