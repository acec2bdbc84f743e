//! Agent dispatch: long-lived capability providers invoked by name.
//!
//! Unlike commands, agents are stateful objects kept alive for the process
//! lifetime. The registry constructs them from candidate factories, caches
//! one instance per name, and forwards structured input opaquely; the agent
//! itself branches on its own `action` field.

pub mod registry;

use chrono::Utc;
use indexmap::IndexMap;
use serde_json::{Value, json};
use speckit_types::ParamSpec;
use thiserror::Error;

pub use registry::{AgentRegistry, InitReport};

/// A stateful capability provider.
///
/// `execute` takes `&mut self` because agents may carry mutable internal
/// state between calls; `reload` on the registry is the recovery path for
/// an agent left in a bad state.
pub trait Agent: Send {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Ordered capability labels, used for cataloging and search.
    fn capabilities(&self) -> Vec<String>;

    /// Perform one unit of work. The input is free-form structured data
    /// containing at minimum an `action` field the agent dispatches on.
    fn execute(&mut self, input: &Value) -> anyhow::Result<Value>;

    /// Self-reported status record. The default is a generic active record;
    /// agents with richer health state override it.
    fn status(&self) -> anyhow::Result<Value> {
        Ok(json!({
            "name": self.name(),
            "status": "active",
            "capabilities": self.capabilities(),
            "last_active": Utc::now().to_rfc3339(),
        }))
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn author(&self) -> &str {
        "speckit"
    }

    /// Field specs per action name. Descriptive only; never enforced here.
    fn input_schema(&self) -> IndexMap<String, IndexMap<String, ParamSpec>> {
        IndexMap::new()
    }
}

/// Constructor for a fresh agent instance. Fallible so a single broken
/// agent degrades to a warning instead of aborting initialization.
pub type AgentFactory = fn() -> anyhow::Result<Box<dyn Agent>>;

/// One discoverable agent source unit: a type name, the module it lives
/// in, and the factory that builds it.
#[derive(Clone)]
pub struct AgentCandidate {
    /// Source type name; must end in `Agent` to be accepted.
    pub class_name: String,
    pub module: String,
    pub factory: AgentFactory,
}

impl AgentCandidate {
    pub fn new(class_name: impl Into<String>, module: impl Into<String>, factory: AgentFactory) -> Self {
        Self {
            class_name: class_name.into(),
            module: module.into(),
            factory,
        }
    }
}

impl std::fmt::Debug for AgentCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentCandidate")
            .field("class_name", &self.class_name)
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent '{name}' not found in registry")]
    NotFound { name: String },
    #[error("Agent '{name}' failed to construct: {message}")]
    Construction { name: String, message: String },
}
