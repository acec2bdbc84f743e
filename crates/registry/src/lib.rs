//! Registry crate for the speckit dispatch core.
//!
//! Owns the mapping from command name (or alias) to a registered entry, plus
//! the discovery pass that populates it from declared candidate tables at
//! process start.
//!
//! The registry is an owned object with an explicit lifecycle: construct it
//! once at startup and share it behind a single `Arc<Mutex<_>>` at the
//! boundary. Mutating operations take `&mut self`; the data structures carry
//! no interior locking of their own.

pub mod discovery;
pub mod models;

pub use discovery::{
    CandidateOverrides, CommandCandidate, CommandDiscovery, DiscoveredCommand, DiscoveryReport, ParamDecl,
};
pub use models::{CommandHandler, CommandRegistry, RegisteredCommand, RegistryStats};

/// Errors surfaced by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Command '{name}' not found")]
    CommandNotFound { name: String },

    #[error("Command '{name}' is disabled")]
    CommandDisabled { name: String },

    #[error("Command '{name}' requires a project context")]
    MissingProjectContext { name: String },

    #[error("Command name must not be empty")]
    EmptyName,

    #[error("Alias '{alias}' already resolves to command '{existing}'")]
    AliasCollision { alias: String, existing: String },

    #[error("Name '{name}' is already an alias of command '{existing}'")]
    NameConflict { name: String, existing: String },

    #[error("Command '{name}' execution failed: {message}")]
    HandlerFailed { name: String, message: String },
}
