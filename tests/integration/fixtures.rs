//! Test fixtures for integration tests.
//!
//! Provides an in-memory gateway transport that hands out sequential
//! identity codes and records every operation, plus helpers for
//! building common graph shapes through the public API.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{json, Value};

use flowgate::{Gateway, Result, Task, Transport, Workflow};

/// Every call made through the transport: (operation, payload).
pub type CallLog = Rc<RefCell<Vec<(String, Value)>>>;

/// Transport standing in for a live gateway.
///
/// Identity requests get sequential codes, datasource and workflow
/// lookups get fixed records, everything else succeeds with empty
/// data. One operation can be scripted to fail with a non-zero
/// envelope status.
pub struct RecordingTransport {
    next_code: RefCell<i64>,
    reject: Option<(String, i32, String)>,
    calls: CallLog,
}

impl RecordingTransport {
    pub fn new() -> (Self, CallLog) {
        let calls: CallLog = Rc::default();
        let transport = Self {
            next_code: RefCell::new(1000),
            reject: None,
            calls: calls.clone(),
        };
        (transport, calls)
    }

    /// Script `operation` to be rejected with `status` / `message`.
    pub fn rejecting(operation: &str, status: i32, message: &str) -> (Self, CallLog) {
        let (mut transport, calls) = Self::new();
        transport.reject = Some((operation.to_string(), status, message.to_string()));
        (transport, calls)
    }
}

impl Transport for RecordingTransport {
    fn call(&self, operation: &str, payload: &Value) -> Result<Value> {
        self.calls
            .borrow_mut()
            .push((operation.to_string(), payload.clone()));

        if let Some((rejected_op, status, message)) = &self.reject {
            if operation == rejected_op {
                return Ok(json!({ "code": status, "msg": message, "data": null }));
            }
        }

        let data = match operation {
            "getOrCreateCode" => {
                let mut code = self.next_code.borrow_mut();
                *code += 1;
                json!({ "code": *code, "version": 1 })
            }
            "getDatasourceInfo" => json!({
                "id": 31,
                "type": "POSTGRESQL",
                "name": payload["name"],
            }),
            "getProcessDefinitionInfo" => json!({ "code": 7777 }),
            "getResourcesFileInfo" => json!({ "id": 5 }),
            _ => json!(null),
        };
        Ok(json!({ "code": 0, "msg": "success", "data": data }))
    }
}

/// Gateway backed by a fresh recording transport.
pub fn recording_gateway() -> (Gateway, CallLog) {
    let (transport, calls) = RecordingTransport::new();
    (Gateway::new(Box::new(transport)), calls)
}

/// Operations in the order they hit the transport.
pub fn operations(calls: &CallLog) -> Vec<String> {
    calls.borrow().iter().map(|(op, _)| op.clone()).collect()
}

/// Payloads sent for one operation.
pub fn payloads_for(calls: &CallLog, operation: &str) -> Vec<Value> {
    calls
        .borrow()
        .iter()
        .filter(|(op, _)| op == operation)
        .map(|(_, payload)| payload.clone())
        .collect()
}

/// The `processDefinition` body of the single submit call.
pub fn submitted_definition(calls: &CallLog) -> Value {
    let mut submits = payloads_for(calls, "createProcessDefinition");
    assert_eq!(submits.len(), 1, "expected exactly one submit call");
    submits.remove(0)["processDefinition"].clone()
}

/// Map task name -> resolved code from a submitted definition.
pub fn codes_by_name(definition: &Value) -> HashMap<String, i64> {
    definition["taskDefinitions"]
        .as_array()
        .expect("taskDefinitions is an array")
        .iter()
        .map(|node| {
            (
                node["name"].as_str().unwrap().to_string(),
                node["code"].as_i64().unwrap(),
            )
        })
        .collect()
}

/// Upstream codes for the relation entry of `code`.
pub fn upstream_codes(definition: &Value, code: i64) -> Vec<i64> {
    definition["taskRelations"]
        .as_array()
        .expect("taskRelations is an array")
        .iter()
        .find(|rel| rel["taskCode"].as_i64() == Some(code))
        .expect("relation entry for every task")["upstreamCodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_i64().unwrap())
        .collect()
}

/// Four shell tasks wired as parent -> {child_one, child_two} -> union.
pub fn build_diamond(workflow: &Workflow) {
    let _ctx = workflow.enter().unwrap();
    let parent = Task::shell("parent", "echo parent").unwrap();
    let child_one = Task::shell("child_one", "echo 1").unwrap();
    let child_two = Task::shell("child_two", "echo 2").unwrap();
    let union = Task::shell("union", "echo union").unwrap();

    let _ = parent >> vec![child_one.clone(), child_two.clone()];
    let _ = vec![child_one, child_two] >> union;
}
