//! Result envelopes returned by the executor and agent dispatch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::ExecutionContext;

/// Outcome of running one command invocation.
///
/// This is the stable contract between the dispatch core and its callers:
/// failures of any kind — parse, lookup, validation, handler — surface
/// through `error` rather than escaping `run`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    /// Opaque handler return value on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Invocation name; empty when the input failed to parse.
    pub command_name: String,
    /// Wall-clock seconds from just before parsing to just after the
    /// handler returned or failed.
    pub execution_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ExecutionContext>,
}

impl ExecutionResult {
    pub fn success(command_name: impl Into<String>, output: Value) -> Self {
        Self {
            success: true,
            output: Some(output),
            error: None,
            command_name: command_name.into(),
            execution_time: 0.0,
            context: None,
        }
    }

    pub fn failure(command_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
            command_name: command_name.into(),
            execution_time: 0.0,
            context: None,
        }
    }
}

/// Outcome of one agent execution, the agent-scoped counterpart of
/// [`ExecutionResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentExecution {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub agent: String,
    pub timestamp: DateTime<Utc>,
}

impl AgentExecution {
    pub fn succeeded(agent: impl Into<String>, result: Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            agent: agent.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn failed(agent: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
            agent: agent.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_envelope_carries_error_only() {
        let result = ExecutionResult::failure("spec", "Command 'spec' is disabled");
        assert!(!result.success);
        assert!(result.output.is_none());
        assert_eq!(result.error.as_deref(), Some("Command 'spec' is disabled"));
    }

    #[test]
    fn envelopes_serialize_without_absent_fields() {
        let encoded = serde_json::to_value(ExecutionResult::success("echo", json!("hi"))).expect("encode");
        assert_eq!(encoded["output"], json!("hi"));
        assert!(encoded.get("error").is_none());
        assert!(encoded.get("context").is_none());
    }
}
