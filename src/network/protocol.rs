//! Protocol Messages
//!
//! Wire format for spectator-gateway communication over WebSocket.
//! All messages are serialized as JSON, tagged by a `type` field for
//! debugging ease.

use serde::{Serialize, Deserialize};

use crate::betting::ledger::Bet;
use crate::betting::pool::Bettor;
use crate::core::odds::Odds;
use crate::game::history::MatchRecord;
use crate::game::moves::Player;

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from spectator client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join the arena, optionally with a wallet address.
    ///
    /// Without an address the server assigns a guest identity.
    Join {
        /// Wallet address; None means no wallet connected.
        address: Option<String>,
    },

    /// Place a wager on the current pool.
    PlaceWager {
        /// Side to back.
        player: Player,
        /// Amount in wagering units.
        amount: u64,
    },

    /// Start the next match.
    StartMatch,

    /// Request a full state snapshot (for reconnection).
    SyncRequest,

    /// Ping for latency measurement.
    Ping {
        /// Client timestamp, echoed back.
        timestamp: u64,
    },

    /// Spectator is leaving. The account and any pending bet survive.
    Leave,
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to spectator client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Join accepted; full state snapshot.
    Welcome(WelcomeInfo),

    /// Pool totals, odds or recent bettors changed.
    PoolUpdate(PoolInfo),

    /// A wager was accepted.
    WagerAccepted {
        /// The opened bet.
        bet: Bet,
        /// Balance after the debit.
        balance: u64,
    },

    /// Countdown value before the next round.
    Countdown {
        /// Seconds until moves are requested.
        seconds: u32,
    },

    /// Countdown finished; moves are being requested.
    RoundStarted {
        /// Round number the match will carry if it completes.
        round_number: u64,
    },

    /// A match completed.
    MatchResult {
        /// The emitted record.
        record: MatchRecord,
    },

    /// A round failed before producing a record.
    RoundAborted {
        /// Round number that was underway.
        round_number: u64,
        /// What went wrong.
        reason: String,
    },

    /// The recipient's pending bet was resolved.
    BetSettled {
        /// The settled bet.
        bet: Bet,
        /// Amount credited; zero on loss or draw.
        payout: u64,
        /// Balance after settlement.
        balance: u64,
    },

    /// Pong response.
    Pong {
        /// Client timestamp from the ping.
        timestamp: u64,
        /// Server wall-clock time (unix millis).
        server_time: u64,
    },

    /// Request rejected.
    Error(GatewayError),

    /// Server is shutting down.
    Shutdown {
        /// Reason string for display.
        reason: String,
    },
}

/// Snapshot sent on join and sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeInfo {
    /// The spectator's resolved address.
    pub address: String,
    /// Current ledger balance.
    pub balance: u64,
    /// The spectator's pending bet, if one survives from before.
    pub active_bet: Option<Bet>,
    /// Rounds completed so far.
    pub round_number: u64,
    /// Recent completed matches, newest first.
    pub history: Vec<MatchRecord>,
    /// Current pool state.
    pub pool: PoolInfo,
}

/// Pool totals, live odds and recent bettors for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolInfo {
    /// AI-1 side total.
    pub ai1_total: u64,
    /// AI-2 side total.
    pub ai2_total: u64,
    /// Live odds for AI-1, in hundredths.
    pub ai1_odds: Odds,
    /// Live odds for AI-2, in hundredths.
    pub ai2_odds: Odds,
    /// Most recent wagers across both sides, newest first.
    pub recent_bettors: Vec<Bettor>,
}

/// Gateway rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Message could not be parsed.
    InvalidMessage,
    /// Action requires joining first.
    NotJoined,
    /// Wager exceeds the current balance.
    InsufficientFunds,
    /// Zero amount, overflow, or otherwise malformed wager.
    InvalidWager,
    /// An unsettled bet is already pending.
    BetPending,
    /// A countdown or round is already underway.
    MatchInProgress,
    /// Wallet lookup failed.
    WalletUnavailable,
    /// Internal error.
    InternalError,
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
