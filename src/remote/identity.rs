//! Identity resolution for workflows and tasks.
//!
//! The gateway assigns every entity a stable `(code, version)` pair.
//! Resolution goes through an `IdentityCache` created fresh for each
//! submission run, so codes never leak between unrelated submissions.
//! Keys are scoped by (project, kind, name) to keep identically-named
//! entities in different projects apart.
//!
//! The cache is not thread-safe; the submit pipeline is single-threaded
//! and owns its cache for the duration of one run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;
use crate::flog_debug;

/// Server-assigned identity of a workflow or task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub code: i64,
    pub version: i32,
}

/// What kind of entity an identity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Workflow,
    Task,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Workflow => "WORKFLOW",
            EntityKind::Task => "TASK",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cache key: project scope + entity kind + entity name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub project: String,
    pub kind: EntityKind,
    pub name: String,
}

impl IdentityKey {
    pub fn workflow(project: &str, name: &str) -> Self {
        Self {
            project: project.to_string(),
            kind: EntityKind::Workflow,
            name: name.to_string(),
        }
    }

    pub fn task(project: &str, name: &str) -> Self {
        Self {
            project: project.to_string(),
            kind: EntityKind::Task,
            name: name.to_string(),
        }
    }
}

/// Source of identities, normally the gateway's get-or-create call.
pub trait IdentityAuthority {
    fn fetch(&self, key: &IdentityKey) -> Result<Identity>;
}

/// Per-run memoization of resolved identities.
#[derive(Debug, Default)]
pub struct IdentityCache {
    entries: HashMap<IdentityKey, Identity>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached identity for `key`, fetching it from the
    /// authority on first use. Idempotent: a second call for the same
    /// key never reaches the authority again.
    pub fn resolve(
        &mut self,
        authority: &dyn IdentityAuthority,
        key: IdentityKey,
    ) -> Result<Identity> {
        if let Some(identity) = self.entries.get(&key) {
            return Ok(*identity);
        }
        let identity = authority.fetch(&key)?;
        flog_debug!(
            "resolved identity {}/{}/{} -> code={} version={}",
            key.project,
            key.kind,
            key.name,
            identity.code,
            identity.version
        );
        self.entries.insert(key, identity);
        Ok(identity)
    }

    pub fn get(&self, key: &IdentityKey) -> Option<Identity> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
