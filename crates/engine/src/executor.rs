//! Command executor: orchestrates parser and registry into result envelopes.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde_json::Value;
use speckit_registry::{CommandRegistry, RegisteredCommand};
use speckit_types::{ExecutionContext, ExecutionResult};
use tracing::debug;

use crate::parser::{Invocation, parse_command_line};

/// Executor over a shared command registry.
///
/// The registry lives behind one mutex at the boundary; the executor takes
/// the lock per operation and never holds it across calls. `run` upholds
/// the embedding contract: whatever a handler does, the caller gets an
/// [`ExecutionResult`] back, never a propagated failure.
pub struct CommandExecutor {
    registry: Arc<Mutex<CommandRegistry>>,
}

impl CommandExecutor {
    pub fn new(registry: Arc<Mutex<CommandRegistry>>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Mutex<CommandRegistry>> {
        &self.registry
    }

    /// Parse and execute one line of input.
    ///
    /// Timing spans from just before parsing to just after the handler
    /// returns or fails. A line that fails to parse yields a failure
    /// result with an empty invocation name.
    pub fn run(&self, text: &str, context: &ExecutionContext) -> ExecutionResult {
        let started = Instant::now();

        let mut result = match parse_command_line(text) {
            Some(invocation) => self.execute_invocation(&invocation, context),
            None => ExecutionResult::failure("", "Failed to parse command"),
        };

        result.execution_time = started.elapsed().as_secs_f64();
        result.context = Some(context.clone());
        result
    }

    fn execute_invocation(&self, invocation: &Invocation, context: &ExecutionContext) -> ExecutionResult {
        let registry = self.registry.lock().expect("registry lock");

        let Some(command) = registry.get(&invocation.name) else {
            return ExecutionResult::failure(&invocation.name, format!("Command '{}' not found", invocation.name));
        };

        if !command.enabled {
            return ExecutionResult::failure(&invocation.name, format!("Command '{}' is disabled", invocation.name));
        }

        if command.metadata.requires_project && context.project_path().is_none() {
            return ExecutionResult::failure(
                &invocation.name,
                format!("Command '{}' requires a project context", invocation.name),
            );
        }

        let violations = validate_arguments(invocation, command);
        if !violations.is_empty() {
            return ExecutionResult::failure(&invocation.name, violations.join("; "));
        }

        debug!(command = %invocation.name, arg_count = invocation.args.len(), "dispatching command");
        match registry.execute(&invocation.name, &invocation.args, &invocation.kwargs, context) {
            Ok(output) => ExecutionResult::success(&invocation.name, output),
            Err(error) => ExecutionResult::failure(&invocation.name, error.to_string()),
        }
    }

    /// Primary names of visible, enabled commands matching a prefix.
    pub fn suggest(&self, partial: &str) -> Vec<String> {
        if partial.is_empty() {
            return Vec::new();
        }
        let registry = self.registry.lock().expect("registry lock");
        registry
            .list_commands(None, false, false)
            .iter()
            .map(|command| command.metadata.name.clone())
            .filter(|name| name.starts_with(partial))
            .collect()
    }

    /// Declared parameter names of a command matching a prefix, rendered as
    /// long flags.
    pub fn complete(&self, command_name: &str, partial_arg: &str) -> Vec<String> {
        let registry = self.registry.lock().expect("registry lock");
        let Some(command) = registry.get(command_name) else {
            return Vec::new();
        };
        command
            .metadata
            .parameters
            .keys()
            .filter(|name| name.starts_with(partial_arg))
            .map(|name| format!("--{}", name))
            .collect()
    }

    /// Render a result for interactive display.
    pub fn format_result(result: &ExecutionResult) -> String {
        if result.success {
            match &result.output {
                Some(Value::String(text)) => text.clone(),
                Some(output) => output.to_string(),
                None => format!("Command '{}' executed successfully", result.command_name),
            }
        } else {
            format!(
                "Error executing '{}': {}",
                result.command_name,
                result.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}

/// Check supplied arguments against the declared parameter schema.
///
/// Every violation is accumulated before failing so the caller sees the
/// complete list: required parameters missing from both keyword and
/// positional args, and keyword values whose coerced type contradicts a
/// declared (non-`any`) type.
fn validate_arguments(invocation: &Invocation, command: &RegisteredCommand) -> Vec<String> {
    let parameters = &command.metadata.parameters;
    if parameters.is_empty() {
        return Vec::new();
    }

    let mut violations = Vec::new();

    for (name, spec) in parameters {
        if spec.required && !invocation.kwargs.contains_key(name) && invocation.args.is_empty() {
            violations.push(format!("Required parameter '{}' is missing", name));
        }
    }

    for (name, value) in &invocation.kwargs {
        if let Some(spec) = parameters.get(name) {
            if !spec.ty.matches(value) {
                violations.push(format!("Parameter '{}' should be of type {}", name, spec.ty));
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use speckit_registry::CommandHandler;
    use speckit_types::{CommandMetadata, ParamSpec, ParamType};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn shared_registry() -> Arc<Mutex<CommandRegistry>> {
        Arc::new(Mutex::new(CommandRegistry::new()))
    }

    fn register(registry: &Arc<Mutex<CommandRegistry>>, metadata: CommandMetadata, handler: CommandHandler) {
        registry.lock().expect("registry lock").register(metadata, handler).expect("register");
    }

    fn echo_metadata() -> CommandMetadata {
        let mut metadata = CommandMetadata::new("echo", "Echo a message");
        metadata.parameters.insert("msg".into(), ParamSpec::required(ParamType::String));
        metadata
    }

    fn echo_handler() -> CommandHandler {
        Arc::new(|_args, kwargs, _context| Ok(kwargs.get("msg").cloned().unwrap_or(Value::Null)))
    }

    #[test]
    fn run_executes_echo_end_to_end() {
        let registry = shared_registry();
        register(&registry, echo_metadata(), echo_handler());
        let executor = CommandExecutor::new(registry);

        let result = executor.run("/echo --msg=hello", &ExecutionContext::new());
        assert!(result.success);
        assert_eq!(result.output, Some(json!("hello")));
        assert_eq!(result.command_name, "echo");
        assert!(result.execution_time >= 0.0);
    }

    #[test]
    fn unparseable_input_yields_failure_with_empty_name() {
        let executor = CommandExecutor::new(shared_registry());
        let result = executor.run("   ", &ExecutionContext::new());
        assert!(!result.success);
        assert_eq!(result.command_name, "");
        assert!(result.error.as_deref().unwrap_or("").contains("parse"));
    }

    #[test]
    fn unknown_command_is_reported_not_raised() {
        let executor = CommandExecutor::new(shared_registry());
        let result = executor.run("/ghost", &ExecutionContext::new());
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap_or("").contains("not found"));
    }

    #[test]
    fn disabled_command_never_reaches_its_handler() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let registry = shared_registry();
        register(
            &registry,
            CommandMetadata::new("spec", "Spec command"),
            Arc::new(|_, _, _| {
                CALLS.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Null)
            }),
        );
        registry.lock().expect("registry lock").disable_command("spec");
        let executor = CommandExecutor::new(registry);

        let result = executor.run("/spec", &ExecutionContext::new());
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap_or("").contains("disabled"));
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn missing_project_context_blocks_invocation() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let registry = shared_registry();
        let mut metadata = CommandMetadata::new("migrate", "Migrate the project");
        metadata.requires_project = true;
        register(
            &registry,
            metadata,
            Arc::new(|_, _, _| {
                CALLS.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Null)
            }),
        );
        let executor = CommandExecutor::new(registry);

        let result = executor.run("/migrate", &ExecutionContext::new());
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap_or("").contains("project"));
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);

        let context = ExecutionContext::for_session(Some("/tmp/project"), None, None);
        assert!(executor.run("/migrate", &context).success);
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn validation_accumulates_every_violation() {
        let registry = shared_registry();
        let mut metadata = CommandMetadata::new("spec", "Spec command");
        metadata
            .parameters
            .insert("description".into(), ParamSpec::required(ParamType::String));
        metadata.parameters.insert("branch".into(), ParamSpec::required(ParamType::String));
        register(&registry, metadata, Arc::new(|_, _, _| Ok(Value::Null)));
        let executor = CommandExecutor::new(registry);

        let result = executor.run("/spec", &ExecutionContext::new());
        assert!(!result.success);
        let error = result.error.expect("error");
        assert!(error.contains("description"));
        assert!(error.contains("branch"));
    }

    #[test]
    fn declared_types_are_enforced_for_keywords() {
        let registry = shared_registry();
        let mut metadata = CommandMetadata::new("scale", "Scale a formation");
        metadata.parameters.insert("count".into(), ParamSpec::required(ParamType::Int));
        metadata.parameters.insert("notes".into(), ParamSpec::optional(ParamType::Any));
        register(&registry, metadata, Arc::new(|_, _, _| Ok(Value::Null)));
        let executor = CommandExecutor::new(registry);

        let result = executor.run("/scale --count=lots --notes=3", &ExecutionContext::new());
        assert!(!result.success);
        let error = result.error.expect("error");
        // `count` coerced to a string against a declared int; `notes` is any.
        assert!(error.contains("count"));
        assert!(!error.contains("notes"));

        assert!(executor.run("/scale --count=3", &ExecutionContext::new()).success);
    }

    #[test]
    fn handler_failure_is_contained_with_its_message() {
        let registry = shared_registry();
        register(
            &registry,
            CommandMetadata::new("boom", "Failing command"),
            Arc::new(|_, _, _| Err(anyhow::anyhow!("kaboom"))),
        );
        let executor = CommandExecutor::new(registry);

        let result = executor.run("/boom", &ExecutionContext::new());
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap_or("").contains("kaboom"));
    }

    #[test]
    fn suggest_matches_prefixes_of_visible_commands() {
        let registry = shared_registry();
        register(&registry, CommandMetadata::new("spec", "Spec"), Arc::new(|_, _, _| Ok(Value::Null)));
        register(&registry, CommandMetadata::new("split", "Split"), Arc::new(|_, _, _| Ok(Value::Null)));
        register(&registry, CommandMetadata::new("plan", "Plan"), Arc::new(|_, _, _| Ok(Value::Null)));
        registry.lock().expect("registry lock").disable_command("split");
        let executor = CommandExecutor::new(registry);

        assert_eq!(executor.suggest("sp"), vec!["spec"]);
        assert!(executor.suggest("").is_empty());
    }

    #[test]
    fn complete_renders_parameter_names_as_long_flags() {
        let registry = shared_registry();
        register(&registry, echo_metadata(), echo_handler());
        let executor = CommandExecutor::new(registry);

        assert_eq!(executor.complete("echo", "m"), vec!["--msg"]);
        assert!(executor.complete("echo", "z").is_empty());
        assert!(executor.complete("ghost", "m").is_empty());
    }

    #[test]
    fn format_result_renders_success_and_failure() {
        let success = ExecutionResult::success("echo", json!("hello"));
        assert_eq!(CommandExecutor::format_result(&success), "hello");

        let bare = ExecutionResult::success("init", Value::Null);
        assert_eq!(CommandExecutor::format_result(&bare), "null");

        let failure = ExecutionResult::failure("spec", "Command 'spec' is disabled");
        assert_eq!(
            CommandExecutor::format_result(&failure),
            "Error executing 'spec': Command 'spec' is disabled"
        );
    }
}
