//! User Ledger
//!
//! In-memory balance register keyed by spectator address, plus each
//! account's active bet and settled-bet history. Balances are debited at
//! wager time and credited at settlement; nothing else touches them.
//! Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::moves::Player;

// =============================================================================
// BET
// =============================================================================

/// A spectator's wager, from placement to settlement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    /// Unique bet id (monotonic across the ledger)
    pub id: u64,

    /// Wagered amount
    pub amount: u64,

    /// Chosen side
    pub player: Player,

    /// Match the bet settled against; unset while pending
    pub match_id: Option<u64>,

    /// Whether settlement has run for this bet
    pub settled: bool,

    /// Settlement verdict; unset while pending
    pub won: Option<bool>,
}

// =============================================================================
// SPECTATOR ACCOUNT
// =============================================================================

/// One spectator's ledger entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpectatorAccount {
    /// Opaque wallet address
    pub address: String,

    /// Current balance, never negative
    pub balance: u64,

    /// The single pending bet, if any
    pub active_bet: Option<Bet>,

    /// Settled bets, oldest first
    pub history: Vec<Bet>,
}

impl SpectatorAccount {
    fn new(address: String, balance: u64) -> Self {
        Self {
            address,
            balance,
            active_bet: None,
            history: Vec::new(),
        }
    }

    fn debit(&mut self, amount: u64) -> Result<u64, LedgerError> {
        if amount > self.balance {
            return Err(LedgerError::InsufficientFunds {
                balance: self.balance,
                amount,
            });
        }
        self.balance -= amount;
        Ok(self.balance)
    }

    fn credit(&mut self, amount: u64) -> u64 {
        self.balance = self.balance.saturating_add(amount);
        self.balance
    }
}

/// Ledger errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Address has no open account.
    #[error("no account for address {0}")]
    UnknownAccount(String),
    /// Debit or wager larger than the current balance.
    #[error("insufficient funds: balance {balance}, requested {amount}")]
    InsufficientFunds {
        /// Balance at rejection time
        balance: u64,
        /// Amount requested
        amount: u64,
    },
    /// A bet is already pending for this account.
    #[error("an unsettled bet is already pending")]
    BetPending,
    /// Settlement asked for a bet that does not exist.
    #[error("no active bet to settle")]
    NoActiveBet,
}

// =============================================================================
// USER LEDGER
// =============================================================================

/// Address-keyed balance and bet register.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserLedger {
    accounts: BTreeMap<String, SpectatorAccount>,
    next_bet_id: u64,
}

impl Default for UserLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl UserLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            accounts: BTreeMap::new(),
            next_bet_id: 1,
        }
    }

    /// Open an account with the given starting balance.
    ///
    /// Idempotent: an existing account keeps its current balance and bets.
    pub fn open_account(&mut self, address: &str, initial_balance: u64) -> &SpectatorAccount {
        self.accounts
            .entry(address.to_string())
            .or_insert_with(|| SpectatorAccount::new(address.to_string(), initial_balance))
    }

    /// Look up an account.
    pub fn account(&self, address: &str) -> Option<&SpectatorAccount> {
        self.accounts.get(address)
    }

    /// Current balance for an address.
    pub fn balance(&self, address: &str) -> Option<u64> {
        self.accounts.get(address).map(|a| a.balance)
    }

    /// Remove `amount` from the balance.
    ///
    /// The primitive beneath `open_bet`'s wager debit, exposed for direct
    /// balance adjustments. Rejected without mutation when the balance is
    /// too small. Returns the new balance.
    pub fn debit(&mut self, address: &str, amount: u64) -> Result<u64, LedgerError> {
        self.accounts
            .get_mut(address)
            .ok_or_else(|| LedgerError::UnknownAccount(address.to_string()))?
            .debit(amount)
    }

    /// Add `amount` to the balance, saturating at the integer limit.
    ///
    /// The primitive beneath `finalize_bet`'s payout credit. Returns the
    /// new balance.
    pub fn credit(&mut self, address: &str, amount: u64) -> Result<u64, LedgerError> {
        let account = self
            .accounts
            .get_mut(address)
            .ok_or_else(|| LedgerError::UnknownAccount(address.to_string()))?;

        Ok(account.credit(amount))
    }

    /// Debit the wager and open the account's pending bet, atomically.
    ///
    /// All preconditions are checked before any mutation: open account, no
    /// pending bet, sufficient balance. Amount validation is the pool's
    /// job.
    pub fn open_bet(
        &mut self,
        address: &str,
        player: Player,
        amount: u64,
    ) -> Result<Bet, LedgerError> {
        let account = self
            .accounts
            .get_mut(address)
            .ok_or_else(|| LedgerError::UnknownAccount(address.to_string()))?;

        if account.active_bet.is_some() {
            return Err(LedgerError::BetPending);
        }
        account.debit(amount)?;

        let bet = Bet {
            id: self.next_bet_id,
            amount,
            player,
            match_id: None,
            settled: false,
            won: None,
        };
        self.next_bet_id += 1;
        account.active_bet = Some(bet.clone());
        Ok(bet)
    }

    /// The account's pending bet, if any.
    pub fn active_bet(&self, address: &str) -> Option<&Bet> {
        self.accounts.get(address).and_then(|a| a.active_bet.as_ref())
    }

    /// Addresses with a pending bet, in deterministic order.
    pub fn pending_addresses(&self) -> Vec<String> {
        self.accounts
            .values()
            .filter(|a| a.active_bet.is_some())
            .map(|a| a.address.clone())
            .collect()
    }

    /// Resolve the account's pending bet.
    ///
    /// Marks it settled, records the verdict and match id, credits the
    /// payout and archives the bet into the account's history. The pending
    /// slot empties, which is the gate that makes re-settlement a no-op.
    pub fn finalize_bet(
        &mut self,
        address: &str,
        match_id: u64,
        won: bool,
        payout: u64,
    ) -> Result<Bet, LedgerError> {
        let account = self
            .accounts
            .get_mut(address)
            .ok_or_else(|| LedgerError::UnknownAccount(address.to_string()))?;

        let mut bet = account.active_bet.take().ok_or(LedgerError::NoActiveBet)?;
        bet.settled = true;
        bet.won = Some(won);
        bet.match_id = Some(match_id);

        if won {
            account.credit(payout);
        }

        account.history.push(bet.clone());
        Ok(bet)
    }

    /// Number of open accounts.
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================
