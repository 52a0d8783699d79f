//! Wire payload assembly.
//!
//! Turns a workflow snapshot into the camelCase payload the gateway
//! expects: one definition per task, one relation entry per task
//! (downstream code + upstream codes), and workflow-level metadata.
//! Nodes are referenced by resolved numeric code on the wire even
//! though the graph was built with names; every identity is resolved
//! exactly once through the per-run cache before relations are built.
//! Output order is node insertion order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::params::{ParamContext, TaskParams};
use crate::core::task::{Flag, TaskPriority, TimeoutFlag};
use crate::core::workflow::WorkflowState;
use crate::error::Result;
use crate::remote::gateway::Gateway;
use crate::remote::identity::{IdentityCache, IdentityKey};

const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One serialized task node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub code: i64,
    pub name: String,
    pub version: i32,
    pub description: Option<String>,
    pub delay_time: u32,
    pub task_type: String,
    pub task_params: serde_json::Value,
    pub flag: Flag,
    pub task_priority: TaskPriority,
    pub worker_group: String,
    pub environment_code: Option<String>,
    pub fail_retry_times: u32,
    pub fail_retry_interval: u32,
    pub timeout_flag: TimeoutFlag,
    pub timeout_notify_strategy: Option<String>,
    pub timeout: u32,
}

/// Dependency entry for one downstream node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRelation {
    pub task_code: i64,
    pub upstream_codes: Vec<i64>,
}

/// Workflow-level parameter in the gateway's shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalParam {
    pub prop: String,
    pub value: String,
    pub direct: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Complete serialized workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPayload {
    pub name: String,
    pub code: i64,
    pub version: i32,
    pub description: Option<String>,
    pub schedule: Option<String>,
    pub start_time: Option<String>,
    pub tenant_code: String,
    pub project_name: String,
    pub global_params: Vec<GlobalParam>,
    pub resource_list: Vec<String>,
    pub task_definitions: Vec<TaskDefinition>,
    pub task_relations: Vec<TaskRelation>,
}

fn format_start_time(start: &DateTime<Utc>) -> String {
    start.format(START_TIME_FORMAT).to_string()
}

/// Resolve identities and remote references for `state`, then build
/// the full submission payload.
pub fn assemble(
    state: &WorkflowState,
    gateway: &Gateway,
    cache: &mut IdentityCache,
) -> Result<WorkflowPayload> {
    let workflow_identity = cache.resolve(
        gateway,
        IdentityKey::workflow(&state.project, &state.name),
    )?;

    // Every node identity first, so relations and switch branches can
    // reference codes regardless of declaration order.
    let mut ctx = ParamContext::default();
    for name in &state.order {
        let identity = cache.resolve(gateway, IdentityKey::task(&state.project, name))?;
        ctx.identities.insert(name.clone(), identity);
    }

    // Remote lookups for datasource and sub-workflow references,
    // memoized per name within this run.
    for name in &state.order {
        match &state.tasks[name].params {
            TaskParams::Sql {
                datasource_name, ..
            } => {
                if !ctx.datasources.contains_key(datasource_name) {
                    let info = gateway.query_datasource_info(datasource_name)?;
                    ctx.datasources.insert(datasource_name.clone(), info);
                }
            }
            TaskParams::SubWorkflow { workflow_name } => {
                if !ctx.workflow_codes.contains_key(workflow_name) {
                    let code = gateway.query_workflow_info(&state.project, workflow_name)?;
                    ctx.workflow_codes.insert(workflow_name.clone(), code);
                }
            }
            _ => {}
        }
    }

    let mut task_definitions = Vec::with_capacity(state.order.len());
    let mut task_relations = Vec::with_capacity(state.order.len());
    for name in &state.order {
        let data = &state.tasks[name];
        let identity = ctx.identities[name];

        task_definitions.push(TaskDefinition {
            code: identity.code,
            name: data.name.clone(),
            version: identity.version,
            description: data.description.clone(),
            delay_time: data.delay_time,
            task_type: data.task_type().to_string(),
            task_params: data.params.to_wire(name, &ctx)?,
            flag: data.flag,
            task_priority: data.priority,
            worker_group: data.worker_group.clone(),
            environment_code: data.environment_code.clone(),
            fail_retry_times: data.fail_retry_times,
            fail_retry_interval: data.fail_retry_interval,
            timeout_flag: data.timeout_flag,
            timeout_notify_strategy: data.timeout_notify_strategy.clone(),
            timeout: data.timeout,
        });

        // One relation entry per node, upstream set possibly empty.
        let upstream_codes = state.upstream[name]
            .iter()
            .map(|up| ctx.identities[up].code)
            .collect();
        task_relations.push(TaskRelation {
            task_code: identity.code,
            upstream_codes,
        });
    }

    let global_params = state
        .global_params
        .iter()
        .map(|(prop, value)| GlobalParam {
            prop: prop.clone(),
            value: value.clone(),
            direct: "IN".to_string(),
            kind: "VARCHAR".to_string(),
        })
        .collect();

    Ok(WorkflowPayload {
        name: state.name.clone(),
        code: workflow_identity.code,
        version: workflow_identity.version,
        description: state.description.clone(),
        schedule: state.schedule.clone(),
        start_time: state.start_time.as_ref().map(format_start_time),
        tenant_code: state.tenant.clone(),
        project_name: state.project.clone(),
        global_params,
        resource_list: state.resources.clone(),
        task_definitions,
        task_relations,
    })
}
