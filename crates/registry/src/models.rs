//! Command registry: entries, aliasing, categories, search, and invocation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map as JsonMap, Value, json};
use speckit_types::{CommandMetadata, ExecutionContext};
use tracing::debug;

use crate::RegistryError;

/// Uniform handler interface for registered commands.
///
/// Handlers receive positional args, keyword args, and the opaque execution
/// context, and return an opaque value or an error. Argument-shape concerns
/// live in the parameter schema, never in the handler signature.
pub type CommandHandler =
    Arc<dyn Fn(&[Value], &JsonMap<String, Value>, &ExecutionContext) -> anyhow::Result<Value> + Send + Sync>;

/// A registered command: metadata plus the handler it delegates to.
#[derive(Clone)]
pub struct RegisteredCommand {
    pub metadata: CommandMetadata,
    pub handler: CommandHandler,
    /// Module path the handler originated from, for diagnostics.
    pub module_path: String,
    /// Disabled entries reject invocation but stay registered.
    pub enabled: bool,
}

impl fmt::Debug for RegisteredCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredCommand")
            .field("name", &self.metadata.name)
            .field("module_path", &self.module_path)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl RegisteredCommand {
    /// Dictionary encoding of the entry (handler omitted).
    pub fn to_value(&self) -> Value {
        json!({
            "metadata": self.metadata.to_value(),
            "module_path": self.module_path,
            "enabled": self.enabled,
        })
    }
}

/// Registry statistics computed from the primary-only view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryStats {
    pub total_commands: usize,
    pub enabled_commands: usize,
    pub disabled_commands: usize,
    pub categories: usize,
    pub commands_per_category: IndexMap<String, usize>,
}

/// Registry for dispatchable commands.
///
/// The single source of truth for registered entries: primary names map to
/// entries in insertion order, aliases resolve to primary names, and a
/// category index supports grouped listings. Aliases are alternate keys, not
/// separate entries — enable/disable toggles are visible through any key.
#[derive(Default)]
pub struct CommandRegistry {
    commands: IndexMap<String, RegisteredCommand>,
    aliases: HashMap<String, String>,
    categories: IndexMap<String, Vec<String>>,
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands.len())
            .field("aliases", &self.aliases.len())
            .field("categories", &self.categories.len())
            .finish()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command under its primary name and every alias.
    ///
    /// Re-registering an existing primary name replaces the old entry
    /// wholesale, dropping its aliases first. A collision between a new
    /// name/alias and a *different* entry's key is rejected rather than
    /// silently shadowed.
    pub fn register(&mut self, metadata: CommandMetadata, handler: CommandHandler) -> Result<(), RegistryError> {
        self.register_in_module(metadata, handler, "unknown")
    }

    /// Like [`register`](Self::register), recording the originating module.
    pub fn register_in_module(
        &mut self,
        metadata: CommandMetadata,
        handler: CommandHandler,
        module_path: &str,
    ) -> Result<(), RegistryError> {
        let name = metadata.name.clone();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }

        // The new primary name must not shadow another entry's alias.
        if let Some(owner) = self.aliases.get(&name) {
            if owner != &name {
                return Err(RegistryError::NameConflict {
                    name,
                    existing: owner.clone(),
                });
            }
        }

        // No alias may shadow a different entry's primary name or alias.
        for alias in &metadata.aliases {
            if alias == &name {
                continue;
            }
            if self.commands.contains_key(alias) {
                return Err(RegistryError::AliasCollision {
                    alias: alias.clone(),
                    existing: alias.clone(),
                });
            }
            if let Some(owner) = self.aliases.get(alias) {
                if owner != &name {
                    return Err(RegistryError::AliasCollision {
                        alias: alias.clone(),
                        existing: owner.clone(),
                    });
                }
            }
        }

        // Wholesale replacement: drop the previous registration entirely so
        // stale aliases cannot linger.
        if self.commands.contains_key(&name) {
            self.unregister(&name);
        }

        let category = metadata.category.clone();
        let aliases = metadata.aliases.clone();
        let entry = RegisteredCommand {
            metadata,
            handler,
            module_path: module_path.to_string(),
            enabled: true,
        };

        debug!(command = %name, category = %category, alias_count = aliases.len(), "command registered");
        self.commands.insert(name.clone(), entry);

        let members = self.categories.entry(category).or_default();
        if !members.contains(&name) {
            members.push(name.clone());
        }

        for alias in aliases {
            if alias != name {
                self.aliases.insert(alias, name.clone());
            }
        }

        Ok(())
    }

    /// Remove a command and every alias pointing at it, atomically.
    ///
    /// Accepts the primary name or any alias. Returns false when the name is
    /// unknown; that is a no-op, not an error.
    pub fn unregister(&mut self, name: &str) -> bool {
        let Some(primary) = self.resolve(name) else {
            return false;
        };

        let Some(entry) = self.commands.shift_remove(&primary) else {
            return false;
        };

        if let Some(members) = self.categories.get_mut(&entry.metadata.category) {
            members.retain(|member| member != &primary);
            if members.is_empty() {
                self.categories.shift_remove(&entry.metadata.category);
            }
        }

        self.aliases.retain(|_, owner| owner != &primary);
        debug!(command = %primary, "command unregistered");
        true
    }

    /// Resolve a primary name or alias to the primary name.
    fn resolve(&self, name: &str) -> Option<String> {
        if self.commands.contains_key(name) {
            return Some(name.to_string());
        }
        self.aliases.get(name).cloned()
    }

    /// Look up a command by primary name or alias.
    pub fn get(&self, name: &str) -> Option<&RegisteredCommand> {
        match self.commands.get(name) {
            Some(entry) => Some(entry),
            None => self.aliases.get(name).and_then(|primary| self.commands.get(primary)),
        }
    }

    /// List commands in primary registration order.
    ///
    /// Aliases never appear as entries of their own. Hidden and disabled
    /// commands are excluded unless explicitly included.
    pub fn list_commands(
        &self,
        category: Option<&str>,
        include_hidden: bool,
        include_disabled: bool,
    ) -> Vec<&RegisteredCommand> {
        self.commands
            .values()
            .filter(|entry| category.is_none_or(|wanted| entry.metadata.category == wanted))
            .filter(|entry| include_hidden || !entry.metadata.hidden)
            .filter(|entry| include_disabled || entry.enabled)
            .collect()
    }

    pub fn list_categories(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }

    /// Case-insensitive substring search over name, description, and tags.
    ///
    /// First matching field wins; an entry is returned at most once.
    pub fn search_commands(
        &self,
        query: &str,
        category: Option<&str>,
        include_hidden: bool,
    ) -> Vec<&RegisteredCommand> {
        let query = query.to_lowercase();
        self.list_commands(category, include_hidden, false)
            .into_iter()
            .filter(|entry| {
                entry.metadata.name.to_lowercase().contains(&query)
                    || entry.metadata.description.to_lowercase().contains(&query)
                    || entry.metadata.tags.iter().any(|tag| tag.to_lowercase().contains(&query))
            })
            .collect()
    }

    pub fn enable_command(&mut self, name: &str) -> bool {
        self.set_enabled(name, true)
    }

    pub fn disable_command(&mut self, name: &str) -> bool {
        self.set_enabled(name, false)
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let Some(primary) = self.resolve(name) else {
            return false;
        };
        if let Some(entry) = self.commands.get_mut(&primary) {
            entry.enabled = enabled;
            debug!(command = %primary, enabled, "command toggled");
            true
        } else {
            false
        }
    }

    pub fn is_command_enabled(&self, name: &str) -> bool {
        self.get(name).is_some_and(|entry| entry.enabled)
    }

    /// Invoke a registered handler after lifecycle and context checks.
    ///
    /// Handler failures are wrapped as `HandlerFailed` with the original
    /// message preserved; they are never silently swallowed.
    pub fn execute(
        &self,
        name: &str,
        args: &[Value],
        kwargs: &JsonMap<String, Value>,
        context: &ExecutionContext,
    ) -> Result<Value, RegistryError> {
        let entry = self.get(name).ok_or_else(|| RegistryError::CommandNotFound {
            name: name.to_string(),
        })?;

        if !entry.enabled {
            return Err(RegistryError::CommandDisabled {
                name: name.to_string(),
            });
        }

        if entry.metadata.requires_project && context.project_path().is_none() {
            return Err(RegistryError::MissingProjectContext {
                name: name.to_string(),
            });
        }

        (entry.handler)(args, kwargs, context).map_err(|error| RegistryError::HandlerFailed {
            name: name.to_string(),
            message: error.to_string(),
        })
    }

    /// Help record for a command, by primary name or alias.
    pub fn command_help(&self, name: &str) -> Option<Value> {
        let entry = self.get(name)?;
        let meta = &entry.metadata;
        Some(json!({
            "name": meta.name,
            "description": meta.description,
            "category": meta.category,
            "aliases": meta.aliases,
            "parameters": serde_json::to_value(&meta.parameters).unwrap_or(Value::Null),
            "examples": meta.examples,
            "version": meta.version,
            "author": meta.author,
            "tags": meta.tags,
            "requires_project": meta.requires_project,
            "enabled": entry.enabled,
        }))
    }

    /// Statistics over primary entries only; aliases are never counted.
    pub fn stats(&self) -> RegistryStats {
        let total = self.commands.len();
        let enabled = self.commands.values().filter(|entry| entry.enabled).count();
        let commands_per_category: IndexMap<String, usize> = self
            .categories
            .iter()
            .map(|(category, members)| (category.clone(), members.len()))
            .collect();

        RegistryStats {
            total_commands: total,
            enabled_commands: enabled,
            disabled_commands: total - enabled,
            categories: self.categories.len(),
            commands_per_category,
        }
    }

    /// Export the registry for persistence or inspection.
    pub fn to_value(&self) -> Value {
        let commands: JsonMap<String, Value> = self
            .commands
            .iter()
            .map(|(name, entry)| (name.clone(), entry.to_value()))
            .collect();
        json!({
            "commands": commands,
            "categories": serde_json::to_value(&self.categories).unwrap_or(Value::Null),
            "stats": serde_json::to_value(self.stats()).unwrap_or(Value::Null),
        })
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.aliases.clear();
        self.categories.clear();
    }
}
