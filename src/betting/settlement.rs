//! Bet Settlement
//!
//! Resolves every pending bet against a completed match record, exactly
//! once. Payout odds come from the pool snapshot captured before the
//! reset, so the snapshot-then-reset ordering is enforced here rather
//! than left to callers.

use crate::betting::ledger::{Bet, UserLedger};
use crate::betting::pool::BettingPool;
use crate::core::odds::{payout, Odds};
use crate::game::history::MatchRecord;

/// Result of settling one spectator's pending bet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettlementOutcome {
    /// Spectator address
    pub address: String,

    /// The bet, now settled
    pub bet: Bet,

    /// Odds the payout used, from the pre-reset snapshot
    pub odds: Odds,

    /// Amount credited; zero on loss or draw
    pub payout: u64,

    /// Balance after settlement
    pub balance: u64,
}

/// Settle every pending bet against `record`, then clear the pool.
///
/// The pool snapshot is taken before anything else; each pending bet is
/// compared against the record's outcome, winners are credited
/// `round(amount * odds)` from the snapshot, and losers get nothing
/// (a draw counts as a loss, with no refund). The pool is cleared last,
/// after the snapshot has fed every payout.
///
/// Re-delivery of the same record finds no pending bets and an empty
/// pool, so running settlement twice is a no-op rather than an error:
/// finalizing a bet empties the account's pending slot, which is the
/// exactly-once gate.
pub fn settle_match(
    pool: &mut BettingPool,
    ledger: &mut UserLedger,
    record: &MatchRecord,
) -> Vec<SettlementOutcome> {
    let snapshot = pool.snapshot();
    let mut outcomes = Vec::new();

    for address in ledger.pending_addresses() {
        let Some(pending) = ledger.active_bet(&address) else {
            continue;
        };
        let amount = pending.amount;
        let chosen = pending.player;

        let won = record.outcome.is_win_for(chosen);
        // The winning side normally contains the bettor's own stake, so a
        // zero side total is degenerate; the snapshot still defaults it.
        let odds = snapshot.odds_for(chosen);
        let winnings = if won { payout(amount, odds) } else { 0 };

        let Ok(bet) = ledger.finalize_bet(&address, record.id, won, winnings) else {
            continue;
        };
        let balance = ledger.balance(&address).unwrap_or(0);
        outcomes.push(SettlementOutcome {
            address,
            bet,
            odds,
            payout: winnings,
            balance,
        });
    }

    pool.reset();
    outcomes
}

// =============================================================================
// TESTS
// =============================================================================
