//! Match Logic Module
//!
//! The match lifecycle and its records. 100% deterministic: outcomes are a
//! pure function of the two moves, ids come from monotonic counters, and
//! timestamps are supplied by the caller.
//!
//! ## Module Structure
//!
//! - `moves`: move/player/outcome vocabulary and the winner rule table
//! - `engine`: match lifecycle state machine
//! - `history`: completed-match records, append-only and newest-first
//! - `events`: arena events for broadcast

pub mod moves;
pub mod engine;
pub mod history;
pub mod events;

// Re-export key types
pub use moves::{Move, Player, MatchOutcome, determine_winner};
pub use engine::{MatchEngine, MatchPhase, TickOutcome, EngineError};
pub use history::{MatchRecord, MatchHistory};
pub use events::ArenaEvent;
