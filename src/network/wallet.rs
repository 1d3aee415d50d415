//! Wallet Provider
//!
//! Boundary to the external wallet/balance source. The gateway calls it
//! once at join time to open the ledger account; debit/credit bookkeeping
//! afterwards is owned by the ledger, not the wallet. The default
//! provider is simulated: every address is granted the configured
//! starting balance.

use thiserror::Error;

/// A wallet lookup result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletInfo {
    /// The resolved address.
    pub address: String,
    /// Reported balance, used to seed the ledger account.
    pub balance: u64,
}

/// Wallet errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalletError {
    /// No wallet connected (empty address).
    #[error("no wallet connected")]
    Disconnected,
}

/// External wallet/balance source.
pub trait WalletProvider: Send + Sync {
    /// Resolve an address to wallet info.
    fn lookup(&self, address: &str) -> Result<WalletInfo, WalletError>;
}

/// Grants every address a fixed starting balance.
#[derive(Clone, Debug)]
pub struct SimulatedWallet {
    starting_balance: u64,
}

impl SimulatedWallet {
    /// Create a simulated wallet granting `starting_balance` per address.
    pub fn new(starting_balance: u64) -> Self {
        Self { starting_balance }
    }
}

impl WalletProvider for SimulatedWallet {
    fn lookup(&self, address: &str) -> Result<WalletInfo, WalletError> {
        if address.is_empty() {
            return Err(WalletError::Disconnected);
        }
        Ok(WalletInfo {
            address: address.to_string(),
            balance: self.starting_balance,
        })
    }
}

/// Shorten an address for display and logs, e.g. `A1b2...x9Z0`.
///
/// Short addresses pass through unchanged.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

// =============================================================================
// TESTS
// =============================================================================
