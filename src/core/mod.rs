//! Core deterministic primitives.
//!
//! Integer-only odds arithmetic and a seedable PRNG. Everything in this
//! module produces identical results on every platform, so payouts and
//! fallback moves can be replayed exactly in tests.

pub mod odds;
pub mod rng;

// Re-export core types
pub use odds::{Odds, ODDS_ONE, DEFAULT_ODDS, odds_from_totals, payout};
pub use rng::DeterministicRng;
