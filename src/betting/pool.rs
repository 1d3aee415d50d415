//! Betting Pool
//!
//! Per-side wager accumulation for the current match. Each side's running
//! total must equal the literal sum of its bettor amounts at every
//! observable instant, so additions use checked arithmetic and rejections
//! happen before any mutation.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::odds::{odds_from_totals, Odds};
use crate::game::moves::Player;
use crate::betting::ledger::{Bet, LedgerError, UserLedger};

// =============================================================================
// BETTOR
// =============================================================================

/// One accepted wager inside a pool side. Immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bettor {
    /// Unique bettor id (monotonic across matches)
    pub id: u64,

    /// Opaque wallet address
    pub address: String,

    /// Wagered amount
    pub amount: u64,

    /// Side the wager backs
    pub player: Player,

    /// When the wager was accepted
    pub placed_at: DateTime<Utc>,
}

/// One side of the pool: a running total and its bettors in insertion order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PoolSide {
    /// Sum of all bettor amounts on this side
    pub total: u64,

    /// Accepted wagers, oldest first
    pub bettors: Vec<Bettor>,
}

/// Side totals captured before a reset, used for payout odds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolSnapshot {
    /// AI-1 side total
    pub ai1_total: u64,

    /// AI-2 side total
    pub ai2_total: u64,
}

impl PoolSnapshot {
    /// Payout odds for the given side, from these totals.
    pub fn odds_for(&self, player: Player) -> Odds {
        match player {
            Player::Ai1 => odds_from_totals(self.ai1_total, self.ai2_total),
            Player::Ai2 => odds_from_totals(self.ai2_total, self.ai1_total),
        }
    }
}

/// Wager rejection reasons.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WagerError {
    /// Zero wager amount.
    #[error("wager amount must be positive")]
    InvalidAmount,
    /// Accepting the wager would overflow the side total.
    #[error("pool side total would overflow")]
    PoolOverflow,
    /// Ledger rejected the wager (unknown account, pending bet,
    /// insufficient funds).
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

// =============================================================================
// BETTING POOL
// =============================================================================

/// The two-sided pari-mutuel pool for the current match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BettingPool {
    ai1: PoolSide,
    ai2: PoolSide,
    next_bettor_id: u64,
}

impl Default for BettingPool {
    fn default() -> Self {
        Self::new()
    }
}

impl BettingPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            ai1: PoolSide::default(),
            ai2: PoolSide::default(),
            next_bettor_id: 1,
        }
    }

    /// The side backing the given player.
    pub fn side(&self, player: Player) -> &PoolSide {
        match player {
            Player::Ai1 => &self.ai1,
            Player::Ai2 => &self.ai2,
        }
    }

    fn side_mut(&mut self, player: Player) -> &mut PoolSide {
        match player {
            Player::Ai1 => &mut self.ai1,
            Player::Ai2 => &mut self.ai2,
        }
    }

    /// Accept a wager: debit the ledger, open the spectator's bet and add
    /// a bettor to the chosen side.
    ///
    /// All preconditions (positive amount, side-total headroom, open
    /// account, no pending bet, sufficient balance) are checked before any
    /// mutation, so a rejection has no partial effect. Wagers are accepted
    /// in any match phase; the bet pends on the next completed match.
    pub fn place_wager(
        &mut self,
        ledger: &mut UserLedger,
        address: &str,
        player: Player,
        amount: u64,
        placed_at: DateTime<Utc>,
    ) -> Result<Bet, WagerError> {
        if amount == 0 {
            return Err(WagerError::InvalidAmount);
        }
        let new_total = self
            .side(player)
            .total
            .checked_add(amount)
            .ok_or(WagerError::PoolOverflow)?;

        // Debit and bet creation are atomic inside the ledger
        let bet = ledger.open_bet(address, player, amount)?;

        let id = self.next_bettor_id;
        self.next_bettor_id += 1;
        let side = self.side_mut(player);
        side.bettors.push(Bettor {
            id,
            address: address.to_string(),
            amount,
            player,
            placed_at,
        });
        side.total = new_total;

        Ok(bet)
    }

    /// Live pari-mutuel odds for the given side.
    ///
    /// 2.00x whenever either side is empty, otherwise pool total divided
    /// by the side total.
    pub fn current_odds(&self, player: Player) -> Odds {
        self.snapshot().odds_for(player)
    }

    /// Capture both side totals. Settlement takes this before `reset`.
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            ai1_total: self.ai1.total,
            ai2_total: self.ai2.total,
        }
    }

    /// Both side totals as a pair (AI-1, AI-2).
    pub fn totals(&self) -> (u64, u64) {
        (self.ai1.total, self.ai2.total)
    }

    /// Whole-pool total, saturating. Display only.
    pub fn total(&self) -> u64 {
        self.ai1.total.saturating_add(self.ai2.total)
    }

    /// Whether no wager has been accepted since the last reset.
    pub fn is_empty(&self) -> bool {
        self.ai1.bettors.is_empty() && self.ai2.bettors.is_empty()
    }

    /// Up to `limit` most recent wagers across both sides, newest first.
    pub fn recent_bettors(&self, limit: usize) -> Vec<Bettor> {
        let mut all: Vec<Bettor> = self
            .ai1
            .bettors
            .iter()
            .chain(self.ai2.bettors.iter())
            .cloned()
            .collect();
        // Ids are monotonic, so sorting by id descending is newest-first
        all.sort_by(|a, b| b.id.cmp(&a.id));
        all.truncate(limit);
        all
    }

    /// Clear both sides for the next match.
    ///
    /// Only settlement calls this, strictly after taking the snapshot used
    /// for payouts. Bettor ids keep counting across resets.
    pub fn reset(&mut self) {
        self.ai1 = PoolSide::default();
        self.ai2 = PoolSide::default();
    }
}

// =============================================================================
// TESTS
// =============================================================================
