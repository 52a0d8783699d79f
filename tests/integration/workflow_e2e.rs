//! End-to-end submission tests against an in-memory gateway.

use serde_json::json;

use flowgate::{Error, SqlType, Task, Workflow};

use crate::fixtures::{
    build_diamond, codes_by_name, operations, payloads_for, recording_gateway,
    submitted_definition, upstream_codes, RecordingTransport,
};

#[test]
fn test_submit_diamond_edge_sets() {
    let workflow = Workflow::new("nightly_etl");
    build_diamond(&workflow);

    let (gateway, calls) = recording_gateway();
    let receipt = workflow.submit(&gateway).unwrap();
    assert_eq!(receipt.workflow, "nightly_etl");

    let definition = submitted_definition(&calls);
    let codes = codes_by_name(&definition);

    assert!(upstream_codes(&definition, codes["parent"]).is_empty());
    let mut union_upstream = upstream_codes(&definition, codes["union"]);
    union_upstream.sort_unstable();
    let mut expected = vec![codes["child_one"], codes["child_two"]];
    expected.sort_unstable();
    assert_eq!(union_upstream, expected);

    assert_eq!(
        upstream_codes(&definition, codes["child_one"]),
        vec![codes["parent"]]
    );
}

#[test]
fn test_submit_receipt_carries_workflow_identity() {
    let workflow = Workflow::new("nightly_etl");
    build_diamond(&workflow);

    let (gateway, calls) = recording_gateway();
    let receipt = workflow.submit(&gateway).unwrap();

    let definition = submitted_definition(&calls);
    assert_eq!(definition["code"].as_i64(), Some(receipt.code));
    assert_eq!(definition["version"].as_i64(), Some(receipt.version as i64));
    assert_eq!(definition["name"], json!("nightly_etl"));
}

#[test]
fn test_submit_resolves_each_identity_once() {
    let workflow = Workflow::new("nightly_etl");
    build_diamond(&workflow);

    let (gateway, calls) = recording_gateway();
    workflow.submit(&gateway).unwrap();

    // Workflow itself plus four tasks.
    assert_eq!(payloads_for(&calls, "getOrCreateCode").len(), 5);
}

#[test]
fn test_wire_defaults_present_on_every_node() {
    let workflow = Workflow::new("nightly_etl");
    build_diamond(&workflow);

    let (gateway, calls) = recording_gateway();
    workflow.submit(&gateway).unwrap();

    let definition = submitted_definition(&calls);
    for node in definition["taskDefinitions"].as_array().unwrap() {
        assert_eq!(node["flag"], json!("YES"));
        assert_eq!(node["taskPriority"], json!("MEDIUM"));
        assert_eq!(node["workerGroup"], json!("default"));
        assert_eq!(node["timeoutFlag"], json!("CLOSE"));
        assert_eq!(node["timeout"], json!(0));
        assert_eq!(node["delayTime"], json!(0));
        assert_eq!(node["taskParams"]["localParams"], json!([]));
    }
}

#[test]
fn test_run_submits_then_starts() {
    let workflow = Workflow::new("nightly_etl");
    build_diamond(&workflow);

    let (gateway, calls) = recording_gateway();
    workflow.run(&gateway).unwrap();

    let ops = operations(&calls);
    assert_eq!(ops.last().map(String::as_str), Some("startProcessInstance"));
    assert!(ops.contains(&"createProcessDefinition".to_string()));

    let starts = payloads_for(&calls, "startProcessInstance");
    assert_eq!(starts.len(), 1);
    assert_eq!(starts[0]["processDefinitionName"], json!("nightly_etl"));
}

#[test]
fn test_cyclic_workflow_never_reaches_the_network() {
    let workflow = Workflow::new("looped");
    {
        let _ctx = workflow.enter().unwrap();
        let a = Task::shell("a", "echo a").unwrap();
        let b = Task::shell("b", "echo b").unwrap();
        let c = Task::shell("c", "echo c").unwrap();
        let _ = a.clone() >> b >> c >> a;
    }

    let (gateway, calls) = recording_gateway();
    let result = workflow.submit(&gateway);

    assert!(matches!(
        result.unwrap_err(),
        Error::CyclicDependency { workflow, .. } if workflow == "looped"
    ));
    assert!(calls.borrow().is_empty(), "no network traffic on local failure");
}

#[test]
fn test_gateway_rejection_surfaces() {
    let workflow = Workflow::new("nightly_etl");
    build_diamond(&workflow);

    let (transport, _calls) =
        RecordingTransport::rejecting("createProcessDefinition", 10113, "definition exists");
    let gateway = flowgate::Gateway::new(Box::new(transport));

    let result = workflow.submit(&gateway);

    assert!(matches!(
        result.unwrap_err(),
        Error::RemoteRejected { operation, status, message, .. }
            if operation == "createProcessDefinition"
                && status == 10113
                && message == "definition exists"
    ));
}

#[test]
fn test_mixed_task_types_submit() {
    let workflow = Workflow::new("reporting");
    {
        let _ctx = workflow.enter().unwrap();
        let refresh = Task::sql(
            "refresh",
            "warehouse",
            "refresh materialized view sales",
            SqlType::NonQuery,
        )
        .unwrap();
        let trigger = Task::sub_workflow("trigger_export", "export").unwrap();
        let _ = refresh >> trigger;
    }

    let (gateway, calls) = recording_gateway();
    workflow.submit(&gateway).unwrap();

    let definition = submitted_definition(&calls);
    let nodes = definition["taskDefinitions"].as_array().unwrap();

    let sql_node = nodes.iter().find(|n| n["name"] == json!("refresh")).unwrap();
    assert_eq!(sql_node["taskType"], json!("SQL"));
    assert_eq!(sql_node["taskParams"]["datasource"], json!(31));
    assert_eq!(sql_node["taskParams"]["type"], json!("POSTGRESQL"));
    assert_eq!(sql_node["taskParams"]["sqlType"], json!("1"));

    let sub_node = nodes
        .iter()
        .find(|n| n["name"] == json!("trigger_export"))
        .unwrap();
    assert_eq!(sub_node["taskType"], json!("SUB_PROCESS"));
    assert_eq!(sub_node["taskParams"]["processDefinitionCode"], json!(7777));
}
