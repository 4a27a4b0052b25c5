//! Accessors for the JSON events emitted by agent CLIs.

pub mod codex;
