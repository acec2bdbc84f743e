//! Registry of live agent instances with metadata, status, and reload.

use chrono::Utc;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Value, json};
use speckit_types::{AgentExecution, AgentMetadata};
use tracing::{debug, info, warn};

use crate::{Agent, AgentCandidate, AgentError};

/// Outcome of one `initialize` pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InitReport {
    pub already_initialized: bool,
    pub discovered_count: usize,
    pub registered_count: usize,
    pub initialized_count: usize,
}

/// Catalog of agents: stored factories, cached singleton instances, and
/// extracted metadata.
///
/// An agent whose factory fails at initialization is still cataloged (with
/// fallback metadata derived from its type name) so it shows up as
/// `inactive` and can be recovered later through `reload`.
#[derive(Default)]
pub struct AgentRegistry {
    candidates: IndexMap<String, AgentCandidate>,
    instances: IndexMap<String, Box<dyn Agent>>,
    metadata: IndexMap<String, AgentMetadata>,
    initialized: bool,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discover agents from a candidate table and instantiate singletons.
    ///
    /// Idempotent: a second call is a no-op reported as such. Candidates
    /// whose type name does not end in `Agent` are silently skipped;
    /// candidates whose factory fails are cataloged without an instance.
    pub fn initialize(&mut self, candidates: Vec<AgentCandidate>) -> InitReport {
        if self.initialized {
            return InitReport {
                already_initialized: true,
                ..InitReport::default()
            };
        }

        let mut report = InitReport::default();

        for candidate in candidates {
            if !candidate.class_name.ends_with("Agent") {
                debug!(class_name = %candidate.class_name, "skipping non-agent candidate");
                continue;
            }
            report.discovered_count += 1;

            match (candidate.factory)() {
                Ok(instance) => {
                    let name = instance_name(instance.as_ref(), &candidate.class_name);
                    self.metadata.insert(name.clone(), extract_metadata(instance.as_ref(), &candidate, &name));
                    self.instances.insert(name.clone(), instance);
                    self.candidates.insert(name, candidate);
                    report.registered_count += 1;
                    report.initialized_count += 1;
                }
                Err(error) => {
                    let name = derive_agent_name(&candidate.class_name);
                    warn!(agent = %name, %error, "failed to initialize agent");
                    self.metadata.insert(name.clone(), fallback_metadata(&candidate, &name));
                    self.candidates.insert(name, candidate);
                    report.registered_count += 1;
                }
            }
        }

        self.initialized = true;
        info!(
            discovered = report.discovered_count,
            initialized = report.initialized_count,
            "agent registry initialized"
        );
        report
    }

    pub fn get_metadata(&self, name: &str) -> Option<&AgentMetadata> {
        self.metadata.get(name)
    }

    /// Catalog entries with an `active`/`inactive` status marker.
    pub fn list_agents(&self) -> Vec<Value> {
        self.metadata
            .iter()
            .map(|(name, metadata)| self.catalog_entry(name, metadata))
            .collect()
    }

    /// Substring search over name, description, and capability labels.
    pub fn search_agents(&self, query: &str) -> Vec<Value> {
        let needle = query.to_lowercase();
        self.metadata
            .iter()
            .filter(|(name, metadata)| {
                name.to_lowercase().contains(&needle)
                    || metadata.description.to_lowercase().contains(&needle)
                    || metadata.capabilities.iter().any(|cap| cap.to_lowercase().contains(&needle))
            })
            .map(|(name, metadata)| self.catalog_entry(name, metadata))
            .collect()
    }

    /// Capability labels keyed by agent name.
    pub fn capabilities_summary(&self) -> IndexMap<String, Vec<String>> {
        self.metadata
            .iter()
            .map(|(name, metadata)| (name.clone(), metadata.capabilities.clone()))
            .collect()
    }

    /// Forward input to a named agent and wrap the outcome in a timestamped
    /// envelope. Agent failures are contained here, never propagated.
    pub fn execute_agent(&mut self, name: &str, input: &Value) -> AgentExecution {
        let Some(instance) = self.instances.get_mut(name) else {
            return AgentExecution::failed(name, format!("Agent \"{name}\" not found"));
        };

        debug!(agent = %name, "dispatching agent input");
        match instance.execute(input) {
            Ok(result) => AgentExecution::succeeded(name, result),
            Err(error) => AgentExecution::failed(name, error.to_string()),
        }
    }

    /// Status record for one agent.
    ///
    /// A missing instance reports `not_found`; a failing `status`
    /// implementation substitutes an `error` record rather than
    /// propagating.
    pub fn status(&self, name: &str) -> Value {
        let Some(instance) = self.instances.get(name) else {
            return json!({ "name": name, "status": "not_found" });
        };

        match instance.status() {
            Ok(status) => status,
            Err(error) => json!({
                "name": name,
                "status": "error",
                "error": error.to_string(),
            }),
        }
    }

    pub fn status_all(&self) -> Vec<Value> {
        self.metadata.keys().map(|name| self.status(name)).collect()
    }

    /// Discard the cached instance and rebuild it from the stored factory.
    /// The only supported recovery for an agent in a bad internal state.
    pub fn reload(&mut self, name: &str) -> Result<(), AgentError> {
        let candidate = self.candidates.get(name).ok_or_else(|| AgentError::NotFound {
            name: name.to_string(),
        })?;

        let instance = (candidate.factory)().map_err(|error| AgentError::Construction {
            name: name.to_string(),
            message: error.to_string(),
        })?;

        self.metadata.insert(name.to_string(), extract_metadata(instance.as_ref(), candidate, name));
        self.instances.insert(name.to_string(), instance);
        info!(agent = %name, "agent reloaded");
        Ok(())
    }

    fn catalog_entry(&self, name: &str, metadata: &AgentMetadata) -> Value {
        let mut entry = metadata.to_value();
        if let Value::Object(map) = &mut entry {
            let status = if self.instances.contains_key(name) { "active" } else { "inactive" };
            map.insert("status".to_string(), Value::String(status.to_string()));
        }
        entry
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.metadata.keys().collect::<Vec<_>>())
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}

/// Preferred name: the instance's own, else derived from the type name.
fn instance_name(instance: &dyn Agent, class_name: &str) -> String {
    let name = instance.name();
    if name.is_empty() { derive_agent_name(class_name) } else { name.to_string() }
}

/// `SpecBuilderAgent` becomes `specbuilder`.
fn derive_agent_name(class_name: &str) -> String {
    class_name.to_lowercase().replace("agent", "")
}

fn extract_metadata(instance: &dyn Agent, candidate: &AgentCandidate, name: &str) -> AgentMetadata {
    let mut metadata = AgentMetadata::new(name, instance.description());
    metadata.capabilities = instance.capabilities();
    metadata.version = instance.version().to_string();
    metadata.author = instance.author().to_string();
    metadata.class_name = candidate.class_name.clone();
    metadata.module = candidate.module.clone();
    metadata.input_schema = instance.input_schema();
    metadata
}

fn fallback_metadata(candidate: &AgentCandidate, name: &str) -> AgentMetadata {
    let mut metadata = AgentMetadata::new(name, format!("{} agent", candidate.class_name));
    metadata.class_name = candidate.class_name.clone();
    metadata.module = candidate.module.clone();
    metadata
}
