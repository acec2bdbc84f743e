//! End-to-end dispatch: discovery populates a registry, the executor runs
//! free-form input against it.

use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use speckit_engine::CommandExecutor;
use speckit_registry::{CommandCandidate, CommandDiscovery, CommandRegistry, ParamDecl};
use speckit_types::{ExecutionContext, ParamType};

fn echo_candidate() -> CommandCandidate {
    CommandCandidate::new(
        "cmd_echo",
        "builtin",
        Arc::new(|_args, kwargs, _context| Ok(kwargs.get("msg").cloned().unwrap_or(Value::Null))),
    )
    .with_doc("Echo a message back to the caller")
    .with_signature(vec![ParamDecl::required("msg", ParamType::String)])
}

fn build_executor() -> CommandExecutor {
    let registry = Arc::new(Mutex::new(CommandRegistry::new()));
    let mut discovery = CommandDiscovery::new();
    discovery.add_namespace("builtin", vec![echo_candidate()]);
    {
        let mut guard = registry.lock().expect("registry lock");
        let report = discovery.discover_and_register("builtin", &mut guard);
        assert_eq!(report.registered_count, 1);
    }
    CommandExecutor::new(registry)
}

#[test]
fn discovered_command_executes_from_raw_input() {
    let executor = build_executor();
    let result = executor.run("/echo --msg=hello", &ExecutionContext::new());

    assert!(result.success, "unexpected error: {:?}", result.error);
    assert_eq!(result.output, Some(json!("hello")));
    assert_eq!(result.command_name, "echo");
    assert!(result.context.is_some());
}

#[test]
fn missing_required_parameter_surfaces_in_the_envelope() {
    let executor = build_executor();
    let result = executor.run("/echo", &ExecutionContext::new());

    assert!(!result.success);
    assert!(result.error.as_deref().unwrap_or("").contains("msg"));
}

#[test]
fn quoted_arguments_travel_intact_through_the_pipeline() {
    let executor = build_executor();
    let result = executor.run("/echo --msg=\"hello there, world\"", &ExecutionContext::new());

    assert!(result.success);
    assert_eq!(result.output, Some(json!("hello there, world")));
}

#[test]
fn session_context_is_echoed_back_on_the_result() {
    let executor = build_executor();
    let context = ExecutionContext::for_session(Some("/work/demo"), Some("casey"), None);
    let result = executor.run("/echo --msg=hi", &context);

    assert!(result.success);
    let returned = result.context.expect("context");
    assert_eq!(returned.get("project_path"), Some(&json!("/work/demo")));
    assert_eq!(returned.get("user_id"), Some(&json!("casey")));
}
