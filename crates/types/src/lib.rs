//! Shared type definitions for the speckit dispatch core.
//!
//! This crate is the leaf of the workspace: descriptor types for commands and
//! agents, the opaque execution context, and the result envelopes returned to
//! callers. It carries no behavior beyond canonical encoding/decoding —
//! validation and lifecycle rules live in `speckit-registry`.

pub mod context;
pub mod metadata;
pub mod result;

pub use context::ExecutionContext;
pub use metadata::{AgentMetadata, CommandMetadata, ParamSpec, ParamType};
pub use result::{AgentExecution, ExecutionResult};
