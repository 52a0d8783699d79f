//! Graph construction rules exercised through the public API.

use serde_json::json;

use flowgate::{Error, SwitchBranch, Task, Workflow};

use crate::fixtures::{codes_by_name, recording_gateway, submitted_definition};

#[test]
fn test_duplicate_name_rejected_within_one_context() {
    let workflow = Workflow::new("etl");
    let _ctx = workflow.enter().unwrap();

    Task::shell("x", "echo 1").unwrap();
    let result = Task::shell("x", "echo 2");

    assert!(matches!(result.unwrap_err(), Error::DuplicateNode { .. }));
}

#[test]
fn test_duplicate_name_allowed_across_contexts() {
    let first = Workflow::new("first");
    {
        let _ctx = first.enter().unwrap();
        Task::shell("x", "echo 1").unwrap();
    }

    let second = Workflow::new("second");
    {
        let _ctx = second.enter().unwrap();
        Task::shell("x", "echo 2").unwrap();
    }

    assert!(first.contains_task("x"));
    assert!(second.contains_task("x"));
}

#[test]
fn test_task_outside_context_rejected() {
    let result = Task::shell("stray", "echo 1");
    assert!(matches!(
        result.unwrap_err(),
        Error::NoActiveWorkflow { task } if task == "stray"
    ));
}

#[test]
fn test_nested_context_rejected() {
    let outer = Workflow::new("outer");
    let inner = Workflow::new("inner");

    let _ctx = outer.enter().unwrap();
    let result = inner.enter();

    assert!(matches!(
        result.unwrap_err(),
        Error::NestedWorkflow { active, entering }
            if active == "outer" && entering == "inner"
    ));
}

#[test]
fn test_cross_workflow_dependency_rejected() {
    let first = Workflow::new("first");
    let a = {
        let _ctx = first.enter().unwrap();
        Task::shell("a", "echo a").unwrap()
    };

    let second = Workflow::new("second");
    let b = {
        let _ctx = second.enter().unwrap();
        Task::shell("b", "echo b").unwrap()
    };

    let result = b.set_upstream(&a);
    assert!(matches!(result.unwrap_err(), Error::InvalidDependency(_)));
}

#[test]
fn test_switch_branches_serialize_with_resolved_codes() {
    let workflow = Workflow::new("routing");
    {
        let _ctx = workflow.enter().unwrap();
        let probe = Task::shell("probe", "check_mode.sh").unwrap();
        let fast = Task::shell("fast_path", "fast.sh").unwrap();
        let slow = Task::shell("slow_path", "slow.sh").unwrap();
        let route = Task::switch(
            "route",
            vec![SwitchBranch {
                condition: "${mode} == 'fast'".to_string(),
                task: "fast_path".to_string(),
            }],
            Some("slow_path"),
        )
        .unwrap();

        let _ = probe >> route >> vec![fast, slow];
    }

    let (gateway, calls) = recording_gateway();
    workflow.submit(&gateway).unwrap();

    let definition = submitted_definition(&calls);
    let codes = codes_by_name(&definition);
    let route_node = definition["taskDefinitions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["name"] == json!("route"))
        .unwrap();

    let switch_result = &route_node["taskParams"]["switchResult"];
    assert_eq!(
        switch_result["dependTaskList"][0]["nextNode"].as_i64(),
        Some(codes["fast_path"])
    );
    assert_eq!(
        switch_result["nextNode"].as_i64(),
        Some(codes["slow_path"])
    );
}

#[test]
fn test_switch_with_dangling_branch_fails_validation() {
    let workflow = Workflow::new("routing");
    {
        let _ctx = workflow.enter().unwrap();
        Task::switch(
            "route",
            vec![SwitchBranch {
                condition: "${mode} == 'fast'".to_string(),
                task: "nowhere".to_string(),
            }],
            None,
        )
        .unwrap();
    }

    let (gateway, calls) = recording_gateway();
    let result = workflow.submit(&gateway);

    assert!(matches!(
        result.unwrap_err(),
        Error::UnknownNode { name, .. } if name == "nowhere"
    ));
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_task_attributes_flow_to_wire() {
    let workflow = Workflow::new("etl");
    {
        let _ctx = workflow.enter().unwrap();
        let extract = Task::shell("extract", "fetch.sh").unwrap();
        extract
            .set_priority(flowgate::TaskPriority::High)
            .set_worker_group("etl_workers")
            .set_retry(3, 2)
            .set_timeout(30, Some("WARN"));
    }

    let (gateway, calls) = recording_gateway();
    workflow.submit(&gateway).unwrap();

    let definition = submitted_definition(&calls);
    let node = &definition["taskDefinitions"][0];
    assert_eq!(node["taskPriority"], json!("HIGH"));
    assert_eq!(node["workerGroup"], json!("etl_workers"));
    assert_eq!(node["failRetryTimes"], json!(3));
    assert_eq!(node["failRetryInterval"], json!(2));
    assert_eq!(node["timeoutFlag"], json!("OPEN"));
    assert_eq!(node["timeout"], json!(30));
    assert_eq!(node["timeoutNotifyStrategy"], json!("WARN"));
}
