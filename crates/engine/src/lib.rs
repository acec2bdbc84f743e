//! Execution engine for the speckit dispatch core.
//!
//! `parser` turns one line of free-form text into a structured invocation;
//! `executor` orchestrates parser and registry into a uniform result
//! envelope that never lets a handler failure escape to the caller.

pub mod executor;
pub mod parser;

pub use executor::CommandExecutor;
pub use parser::{Invocation, coerce_scalar, parse_command_line};
