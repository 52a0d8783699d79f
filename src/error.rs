use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Duplicate task '{name}' in workflow '{workflow}'")]
    DuplicateNode { workflow: String, name: String },

    #[error("Unknown task '{name}' referenced in workflow '{workflow}'")]
    UnknownNode { workflow: String, name: String },

    #[error("Cyclic dependency in workflow '{workflow}': {}", cycle.join(" -> "))]
    CyclicDependency { workflow: String, cycle: Vec<String> },

    #[error("Invalid dependency: {0}")]
    InvalidDependency(String),

    #[error("Unsupported task type: {0}")]
    UnsupportedTaskType(String),

    #[error("Invalid parameters for task '{task}': {reason}")]
    InvalidTaskParameter { task: String, reason: String },

    #[error("Workflow '{active}' is already active, cannot enter '{entering}'")]
    NestedWorkflow { active: String, entering: String },

    #[error("No active workflow context for task '{task}'")]
    NoActiveWorkflow { task: String },

    #[error("Gateway unreachable during {operation} for '{entity}': {detail}")]
    RemoteUnavailable {
        operation: String,
        entity: String,
        detail: String,
    },

    #[error("Gateway rejected {operation} for '{entity}' (status {status}): {message}")]
    RemoteRejected {
        operation: String,
        entity: String,
        status: i32,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
