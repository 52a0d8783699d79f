//! Per-task-type parameter variants.
//!
//! Every task carries one `TaskParams` variant. The variant owns both
//! the local validation of its required fields and the builder that
//! shapes the `taskParams` map the gateway expects. New task types are
//! added as new variants, not as subclasses of a shared base.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::remote::gateway::DatasourceInfo;
use crate::remote::identity::Identity;
use crate::util::to_camel;

/// Task type tag, written to the wire as the server's enum string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    Shell,
    Python,
    Sql,
    Http,
    Spark,
    SubWorkflow,
    Switch,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Shell => "SHELL",
            TaskType::Python => "PYTHON",
            TaskType::Sql => "SQL",
            TaskType::Http => "HTTP",
            TaskType::Spark => "SPARK",
            TaskType::SubWorkflow => "SUB_PROCESS",
            TaskType::Switch => "SWITCH",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SHELL" => Ok(TaskType::Shell),
            "PYTHON" => Ok(TaskType::Python),
            "SQL" => Ok(TaskType::Sql),
            "HTTP" => Ok(TaskType::Http),
            "SPARK" => Ok(TaskType::Spark),
            "SUB_PROCESS" => Ok(TaskType::SubWorkflow),
            "SWITCH" => Ok(TaskType::Switch),
            other => Err(Error::UnsupportedTaskType(other.to_string())),
        }
    }
}

/// Whether a SQL statement produces a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlType {
    Query,
    NonQuery,
}

impl SqlType {
    /// Wire encoding used by the gateway ("0" = query, "1" = non-query).
    pub fn wire_code(&self) -> &'static str {
        match self {
            SqlType::Query => "0",
            SqlType::NonQuery => "1",
        }
    }
}

/// HTTP method for HTTP tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        };
        write!(f, "{}", s)
    }
}

/// Language of a Spark program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProgramType {
    Java,
    Scala,
    Python,
}

impl ProgramType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramType::Java => "JAVA",
            ProgramType::Scala => "SCALA",
            ProgramType::Python => "PYTHON",
        }
    }
}

/// One branch of a switch task: an expression and the task it routes to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchBranch {
    pub condition: String,
    pub task: String,
}

/// Type-specific task parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum TaskParams {
    Shell {
        raw_script: String,
    },
    Python {
        raw_script: String,
    },
    Sql {
        datasource_name: String,
        sql: String,
        sql_type: SqlType,
    },
    Http {
        url: String,
        method: HttpMethod,
        check_condition: Option<String>,
    },
    Spark {
        main_class: String,
        main_jar: String,
        program_type: ProgramType,
        deploy_mode: String,
    },
    SubWorkflow {
        workflow_name: String,
    },
    Switch {
        branches: Vec<SwitchBranch>,
        default_task: Option<String>,
    },
}

/// Lookup tables the serializer resolves before params are shaped.
///
/// Identities are keyed by task name; datasources by datasource name;
/// workflow codes by sub-workflow name.
#[derive(Debug, Default)]
pub struct ParamContext {
    pub identities: HashMap<String, Identity>,
    pub datasources: HashMap<String, DatasourceInfo>,
    pub workflow_codes: HashMap<String, i64>,
}

impl TaskParams {
    pub fn task_type(&self) -> TaskType {
        match self {
            TaskParams::Shell { .. } => TaskType::Shell,
            TaskParams::Python { .. } => TaskType::Python,
            TaskParams::Sql { .. } => TaskType::Sql,
            TaskParams::Http { .. } => TaskType::Http,
            TaskParams::Spark { .. } => TaskType::Spark,
            TaskParams::SubWorkflow { .. } => TaskType::SubWorkflow,
            TaskParams::Switch { .. } => TaskType::Switch,
        }
    }

    /// Check required fields, before the task is registered.
    pub fn validate(&self, task: &str) -> Result<()> {
        let fail = |reason: &str| {
            Err(Error::InvalidTaskParameter {
                task: task.to_string(),
                reason: reason.to_string(),
            })
        };
        match self {
            TaskParams::Shell { raw_script } | TaskParams::Python { raw_script } => {
                if raw_script.trim().is_empty() {
                    return fail("raw_script must not be empty");
                }
            }
            TaskParams::Sql {
                datasource_name,
                sql,
                ..
            } => {
                if datasource_name.is_empty() {
                    return fail("datasource_name must not be empty");
                }
                if sql.trim().is_empty() {
                    return fail("sql must not be empty");
                }
            }
            TaskParams::Http { url, .. } => {
                if url.is_empty() {
                    return fail("url must not be empty");
                }
            }
            TaskParams::Spark {
                main_class,
                main_jar,
                program_type,
                ..
            } => {
                if main_jar.is_empty() {
                    return fail("main_jar must not be empty");
                }
                if main_class.is_empty() && *program_type != ProgramType::Python {
                    return fail("main_class is required for JAVA/SCALA programs");
                }
            }
            TaskParams::SubWorkflow { workflow_name } => {
                if workflow_name.is_empty() {
                    return fail("workflow_name must not be empty");
                }
            }
            TaskParams::Switch { branches, .. } => {
                if branches.is_empty() {
                    return fail("switch requires at least one branch");
                }
                if branches.iter().any(|b| b.condition.trim().is_empty()) {
                    return fail("switch branch condition must not be empty");
                }
            }
        }
        Ok(())
    }

    /// Task names referenced by this variant that must resolve in-graph.
    pub fn referenced_tasks(&self) -> Vec<&str> {
        match self {
            TaskParams::Switch {
                branches,
                default_task,
            } => {
                let mut refs: Vec<&str> = branches.iter().map(|b| b.task.as_str()).collect();
                if let Some(default) = default_task {
                    refs.push(default.as_str());
                }
                refs
            }
            _ => Vec::new(),
        }
    }

    /// Build the `taskParams` wire map for this variant.
    ///
    /// Common keys are always present; variant keys are merged on top.
    /// Node and datasource references are written as resolved numeric
    /// codes taken from `ctx`.
    pub fn to_wire(&self, task: &str, ctx: &ParamContext) -> Result<Value> {
        let mut map = common_keys();

        let missing = |what: &str, name: &str| Error::InvalidTaskParameter {
            task: task.to_string(),
            reason: format!("{} '{}' was not resolved before serialization", what, name),
        };

        match self {
            TaskParams::Shell { raw_script } | TaskParams::Python { raw_script } => {
                map.insert(to_camel("raw_script"), json!(raw_script));
            }
            TaskParams::Sql {
                datasource_name,
                sql,
                sql_type,
            } => {
                let ds = ctx
                    .datasources
                    .get(datasource_name)
                    .ok_or_else(|| missing("datasource", datasource_name))?;
                map.insert("datasource".to_string(), json!(ds.id));
                map.insert("type".to_string(), json!(ds.kind));
                map.insert("sql".to_string(), json!(sql));
                map.insert(to_camel("sql_type"), json!(sql_type.wire_code()));
            }
            TaskParams::Http {
                url,
                method,
                check_condition,
            } => {
                map.insert("url".to_string(), json!(url));
                map.insert(to_camel("http_method"), json!(method.to_string()));
                map.insert(to_camel("http_check_condition"), json!(check_condition));
                map.insert(to_camel("http_params"), json!([]));
            }
            TaskParams::Spark {
                main_class,
                main_jar,
                program_type,
                deploy_mode,
            } => {
                map.insert(to_camel("main_class"), json!(main_class));
                map.insert(
                    to_camel("main_jar"),
                    json!({ "resourceName": main_jar }),
                );
                map.insert(to_camel("program_type"), json!(program_type.as_str()));
                map.insert(to_camel("deploy_mode"), json!(deploy_mode));
            }
            TaskParams::SubWorkflow { workflow_name } => {
                let code = ctx
                    .workflow_codes
                    .get(workflow_name)
                    .ok_or_else(|| missing("sub-workflow", workflow_name))?;
                map.insert(to_camel("process_definition_code"), json!(code));
            }
            TaskParams::Switch {
                branches,
                default_task,
            } => {
                let branch_code = |name: &str| -> Result<i64> {
                    ctx.identities
                        .get(name)
                        .map(|id| id.code)
                        .ok_or_else(|| missing("branch task", name))
                };
                let mut depend_list = Vec::with_capacity(branches.len());
                for branch in branches {
                    depend_list.push(json!({
                        "condition": branch.condition,
                        "nextNode": branch_code(&branch.task)?,
                    }));
                }
                let default_code = match default_task {
                    Some(name) => Some(branch_code(name)?),
                    None => None,
                };
                map.insert(
                    to_camel("switch_result"),
                    json!({
                        "dependTaskList": depend_list,
                        "nextNode": default_code,
                    }),
                );
            }
        }

        Ok(Value::Object(map))
    }
}

/// Keys present in every `taskParams` map regardless of task type.
fn common_keys() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(to_camel("local_params"), json!([]));
    map.insert(to_camel("resource_list"), json!([]));
    map.insert("dependence".to_string(), json!({}));
    map.insert(
        to_camel("condition_result"),
        json!({
            "successNode": [""],
            "failedNode": [""],
        }),
    );
    map.insert(to_camel("wait_start_timeout"), json!({}));
    map
}
