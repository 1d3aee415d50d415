//! Arena Events
//!
//! Events generated by store mutations, drained by the session layer and
//! mapped onto protocol messages for broadcast. Emission order is the
//! mutation order under the store lock, so no priority sorting is needed.

use serde::{Serialize, Deserialize};

use crate::game::history::MatchRecord;
use crate::game::moves::Player;

/// One arena event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ArenaEvent {
    /// Countdown value changed
    CountdownTick {
        /// Ticks left before moves are requested
        seconds_remaining: u32,
    },

    /// Countdown finished, moves are being requested
    RoundStarted {
        /// Round number the match will carry if it completes
        round_number: u64,
    },

    /// A match completed and was settled
    MatchCompleted {
        /// The emitted record
        record: MatchRecord,
    },

    /// A round failed before producing a record
    RoundAborted {
        /// Round number that was underway
        round_number: u64,
        /// What went wrong
        reason: String,
    },

    /// A wager was accepted into the pool
    WagerPlaced {
        /// Bettor address
        address: String,
        /// Chosen side
        player: Player,
        /// Wagered amount
        amount: u64,
        /// AI-1 side total after the wager
        ai1_total: u64,
        /// AI-2 side total after the wager
        ai2_total: u64,
    },

    /// A pending bet was resolved by settlement
    BetSettled {
        /// Bettor address
        address: String,
        /// Bet id
        bet_id: u64,
        /// Match the bet settled against
        match_id: u64,
        /// Whether the bet won
        won: bool,
        /// Amount credited (zero on loss or draw)
        payout: u64,
        /// Balance after settlement
        balance: u64,
    },
}

impl ArenaEvent {
    /// Create a wager placed event.
    pub fn wager_placed(
        address: impl Into<String>,
        player: Player,
        amount: u64,
        ai1_total: u64,
        ai2_total: u64,
    ) -> Self {
        ArenaEvent::WagerPlaced {
            address: address.into(),
            player,
            amount,
            ai1_total,
            ai2_total,
        }
    }

    /// Create a bet settled event.
    pub fn bet_settled(
        address: impl Into<String>,
        bet_id: u64,
        match_id: u64,
        won: bool,
        payout: u64,
        balance: u64,
    ) -> Self {
        ArenaEvent::BetSettled {
            address: address.into(),
            bet_id,
            match_id,
            won,
            payout,
            balance,
        }
    }

    /// Create a round aborted event.
    pub fn round_aborted(round_number: u64, reason: impl Into<String>) -> Self {
        ArenaEvent::RoundAborted {
            round_number,
            reason: reason.into(),
        }
    }
}
