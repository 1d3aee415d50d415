//! # RPS Arena Server
//!
//! AI-vs-AI rock-paper-scissors arena with pari-mutuel spectator betting.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     RPS ARENA SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/             - Deterministic primitives                │
//! │  ├── odds.rs       - Integer pari-mutuel odds and payouts    │
//! │  └── rng.rs        - Deterministic Xorshift128+ PRNG         │
//! │                                                              │
//! │  game/             - Match logic (deterministic)             │
//! │  ├── moves.rs      - Moves, players and the winner table     │
//! │  ├── engine.rs     - Match lifecycle state machine           │
//! │  ├── history.rs    - Completed-match records                 │
//! │  └── events.rs     - Arena events for broadcast              │
//! │                                                              │
//! │  betting/          - Wagers and settlement (deterministic)   │
//! │  ├── pool.rs       - Two-sided pari-mutuel pool              │
//! │  ├── ledger.rs     - Balances, bets, exactly-once gating     │
//! │  └── settlement.rs - Match settlement sequence               │
//! │                                                              │
//! │  oracle/           - Move generation (external boundary)     │
//! │  ├── provider.rs   - Chat-completion transport               │
//! │  └── oracle.rs     - Total move interface with fallback      │
//! │                                                              │
//! │  network/          - Spectator gateway (non-deterministic)   │
//! │  ├── protocol.rs   - JSON message types                      │
//! │  ├── wallet.rs     - Wallet/balance boundary                 │
//! │  ├── session.rs    - Arena session and round task            │
//! │  └── server.rs     - WebSocket server                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/`, `game/` and `betting/` modules are **100% deterministic**:
//! - Integer-only odds and payout arithmetic
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - Timestamps are supplied by the caller
//! - All randomness from seeded Xorshift128+
//!
//! Given the same wagers and moves, settlement produces **identical
//! payouts** on any platform. Timers, oracle calls and sockets live in
//! `oracle/` and `network/`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod betting;
pub mod oracle;
pub mod network;

// Re-export commonly used types
pub use crate::core::odds::{Odds, ODDS_ONE, DEFAULT_ODDS};
pub use crate::core::rng::DeterministicRng;
pub use game::moves::{Move, Player, MatchOutcome, determine_winner};
pub use game::engine::{MatchEngine, MatchPhase};
pub use game::history::{MatchRecord, MatchHistory};
pub use betting::pool::BettingPool;
pub use betting::ledger::UserLedger;
pub use oracle::oracle::MoveOracle;
pub use network::session::ArenaSession;
pub use network::server::ArenaServer;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Countdown ticks before each round
pub const COUNTDOWN_START: u32 = 3;

/// Starting balance granted to every spectator account
pub const STARTING_BALANCE: u64 = 1000;
