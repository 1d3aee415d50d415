//! Betting Module
//!
//! The pari-mutuel wagering core: the two-sided pool, the spectator
//! ledger, and the settlement pass that ties the two to match outcomes.
//! All accounting is integer arithmetic on whole wagering units.
//!
//! ## Module Structure
//!
//! - `pool`: per-side wager accumulation and live odds
//! - `ledger`: address-keyed balances, active bets and bet history
//! - `settlement`: exactly-once resolution of pending bets per match

pub mod pool;
pub mod ledger;
pub mod settlement;

// Re-export key types
pub use pool::{BettingPool, PoolSide, PoolSnapshot, Bettor, WagerError};
pub use ledger::{UserLedger, SpectatorAccount, Bet, LedgerError};
pub use settlement::{settle_match, SettlementOutcome};
