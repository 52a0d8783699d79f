//! Typed operations against the orchestration gateway.
//!
//! Every call is wrapped in the gateway's response envelope
//! `{ code, msg, data }`. Code zero is success; anything else is
//! surfaced as `RemoteRejected`; a non-success status is never a
//! silent no-op. Transport failures come back as `RemoteUnavailable`
//! tagged with the entity that was in flight.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::flog_debug;
use crate::remote::identity::{Identity, IdentityAuthority, IdentityKey};
use crate::remote::transport::{HttpTransport, Transport};
use crate::wire::WorkflowPayload;

/// Datasource record as the gateway reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasourceInfo {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    code: i32,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Value,
}

/// Client for the gateway's RPC surface.
pub struct Gateway {
    transport: Box<dyn Transport>,
}

impl Gateway {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(Box::new(HttpTransport::from_config(config)?)))
    }

    /// One enveloped round trip. `entity` names what the call is about,
    /// for error context only; it is not part of the payload.
    fn call(&self, operation: &str, entity: &str, mut payload: Value) -> Result<Value> {
        if let Value::Object(map) = &mut payload {
            map.insert("requestId".to_string(), json!(Uuid::new_v4().to_string()));
        }

        let raw = self.transport.call(operation, &payload).map_err(|err| {
            match err {
                Error::RemoteUnavailable {
                    operation, detail, ..
                } => Error::RemoteUnavailable {
                    operation,
                    entity: entity.to_string(),
                    detail,
                },
                other => other,
            }
        })?;

        let envelope: Envelope = serde_json::from_value(raw)?;
        if envelope.code != 0 {
            return Err(Error::RemoteRejected {
                operation: operation.to_string(),
                entity: entity.to_string(),
                status: envelope.code,
                message: envelope.msg,
            });
        }
        flog_debug!("{} '{}' ok", operation, entity);
        Ok(envelope.data)
    }

    pub fn create_or_update_project(&self, user: &str, project: &str) -> Result<()> {
        self.call(
            "createOrUpdateProject",
            project,
            json!({ "userName": user, "projectName": project }),
        )?;
        Ok(())
    }

    pub fn create_tenant(&self, tenant: &str, queue: &str) -> Result<()> {
        self.call(
            "createTenant",
            tenant,
            json!({ "tenantCode": tenant, "queueName": queue }),
        )?;
        Ok(())
    }

    pub fn create_user(&self, user: &str, tenant: &str, queue: &str) -> Result<()> {
        self.call(
            "createUser",
            user,
            json!({ "userName": user, "tenantCode": tenant, "queueName": queue }),
        )?;
        Ok(())
    }

    /// Numeric id of an already-uploaded resource file.
    pub fn query_resource_info(&self, user: &str, name: &str) -> Result<i64> {
        let data = self.call(
            "getResourcesFileInfo",
            name,
            json!({ "userName": user, "fullName": name }),
        )?;
        let id = data
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::RemoteRejected {
                operation: "getResourcesFileInfo".to_string(),
                entity: name.to_string(),
                status: 0,
                message: "response data is missing resource id".to_string(),
            })?;
        Ok(id)
    }

    pub fn query_datasource_info(&self, name: &str) -> Result<DatasourceInfo> {
        let data = self.call("getDatasourceInfo", name, json!({ "name": name }))?;
        Ok(serde_json::from_value(data)?)
    }

    pub fn create_or_update_resource(
        &self,
        user: &str,
        name: &str,
        content: &str,
    ) -> Result<()> {
        self.call(
            "createOrUpdateResource",
            name,
            json!({ "userName": user, "fullName": name, "resourceContent": content }),
        )?;
        Ok(())
    }

    /// Code of an existing workflow definition, for sub-workflow tasks.
    pub fn query_workflow_info(&self, project: &str, name: &str) -> Result<i64> {
        let data = self.call(
            "getProcessDefinitionInfo",
            name,
            json!({ "projectName": project, "processDefinitionName": name }),
        )?;
        let code = data
            .get("code")
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::RemoteRejected {
                operation: "getProcessDefinitionInfo".to_string(),
                entity: name.to_string(),
                status: 0,
                message: "response data is missing workflow code".to_string(),
            })?;
        Ok(code)
    }

    /// Get-or-create the stable `(code, version)` identity of an entity.
    pub fn get_or_create_code(&self, key: &IdentityKey) -> Result<Identity> {
        let data = self.call(
            "getOrCreateCode",
            &key.name,
            json!({
                "projectName": key.project,
                "entityKind": key.kind.as_str(),
                "entityName": key.name,
            }),
        )?;
        Ok(serde_json::from_value(data)?)
    }

    /// Push a workflow definition. Create-only: the gateway rejects a
    /// name that already exists instead of updating it in place.
    pub fn create_workflow(&self, project: &str, payload: &WorkflowPayload) -> Result<()> {
        self.call(
            "createProcessDefinition",
            &payload.name,
            json!({
                "projectName": project,
                "processDefinition": serde_json::to_value(payload)?,
            }),
        )?;
        Ok(())
    }

    /// Start an execution of a previously submitted workflow.
    pub fn start_workflow(&self, project: &str, name: &str) -> Result<()> {
        self.call(
            "startProcessInstance",
            name,
            json!({ "projectName": project, "processDefinitionName": name }),
        )?;
        Ok(())
    }
}

impl IdentityAuthority for Gateway {
    fn fetch(&self, key: &IdentityKey) -> Result<Identity> {
        self.get_or_create_code(key)
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").finish_non_exhaustive()
    }
}
