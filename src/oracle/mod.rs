//! Move Oracle Module
//!
//! The boundary to the external move-generation capability. The provider
//! speaks an OpenAI-style chat-completion protocol; the oracle wraps it
//! behind a total interface that always yields a move, falling back to a
//! seeded random choice on any failure.

pub mod provider;
pub mod oracle;

// Re-export key types
pub use provider::{
    CompletionProvider, CompletionError, OracleConfig, HttpCompletionProvider,
    SimulatedProvider, ScriptedProvider,
};
pub use oracle::MoveOracle;
