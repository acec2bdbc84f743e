//! Opaque execution context passed through to handlers.

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};

/// Key-value bag carried alongside every invocation.
///
/// The dispatch core reads exactly one key — `project_path`, to enforce
/// `requires_project` — and otherwise passes the bag through to handlers
/// unmodified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext {
    values: JsonMap<String, Value>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context for an interactive session.
    ///
    /// The project path is recorded under `project_path`, which is the key
    /// the executor checks for project-scoped commands.
    pub fn for_session(
        project_path: Option<&str>,
        user_id: Option<&str>,
        session_id: Option<&str>,
    ) -> Self {
        let mut context = Self::new();
        if let Some(path) = project_path {
            context.insert("project_path", Value::String(path.to_string()));
        }
        if let Some(user) = user_id {
            context.insert("user_id", Value::String(user.to_string()));
        }
        if let Some(session) = session_id {
            context.insert("session_id", Value::String(session.to_string()));
        }
        context
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Chainable insert for test and call-site ergonomics.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Project path, when present and non-empty.
    pub fn project_path(&self) -> Option<&str> {
        match self.values.get("project_path") {
            Some(Value::String(path)) if !path.is_empty() => Some(path.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &JsonMap<String, Value> {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_context_records_project_path() {
        let context = ExecutionContext::for_session(Some("/tmp/project"), Some("u1"), None);
        assert_eq!(context.project_path(), Some("/tmp/project"));
        assert_eq!(context.get("user_id"), Some(&json!("u1")));
        assert_eq!(context.get("session_id"), None);
    }

    #[test]
    fn empty_or_non_string_project_path_is_absent() {
        assert_eq!(ExecutionContext::new().project_path(), None);

        let blank = ExecutionContext::new().with("project_path", json!(""));
        assert_eq!(blank.project_path(), None);

        let wrong_type = ExecutionContext::new().with("project_path", json!(42));
        assert_eq!(wrong_type.project_path(), None);
    }
}
