//! Utility helpers shared across the speckit workspace.

pub mod shell_lexing;

pub use shell_lexing::split_shell_words;
