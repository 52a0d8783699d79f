//! Client SDK for defining workflow DAGs in code and submitting them
//! to a remote orchestration gateway.
//!
//! Workflows are built by entering a workflow context and constructing
//! tasks inside it; tasks register themselves implicitly. Dependencies
//! are declared with `>>` / `<<` operators or the `set_upstream` /
//! `set_downstream` methods. `Workflow::submit` validates the graph
//! locally, resolves server-assigned identities, and pushes the
//! serialized definition through a [`remote::gateway::Gateway`].
//!
//! ```no_run
//! use flowgate::{Gateway, Task, Workflow};
//!
//! # fn main() -> flowgate::Result<()> {
//! let config = flowgate::config::Config::load()?;
//! let gateway = Gateway::from_config(&config)?;
//!
//! let workflow = Workflow::new("nightly_etl");
//! workflow.set_schedule("0 0 2 * * ?");
//! {
//!     let _ctx = workflow.enter()?;
//!     let extract = Task::shell("extract", "fetch.sh")?;
//!     let transform = Task::shell("transform", "clean.sh")?;
//!     let load = Task::shell("load", "load.sh")?;
//!     let _ = extract >> transform >> load;
//! }
//! workflow.submit(&gateway)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod log;
pub mod remote;
pub mod util;
pub mod wire;

pub use crate::core::params::{
    HttpMethod, ProgramType, SqlType, SwitchBranch, TaskParams, TaskType,
};
pub use crate::core::relations::{link, TaskSet};
pub use crate::core::task::{Flag, Task, TaskPriority, TimeoutFlag};
pub use crate::core::workflow::{SubmitReceipt, Workflow};
pub use crate::error::{Error, Result};
pub use crate::remote::gateway::Gateway;
pub use crate::remote::identity::{Identity, IdentityAuthority, IdentityCache, IdentityKey};
pub use crate::remote::transport::{HttpTransport, Transport};
