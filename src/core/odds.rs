//! Scaled-Integer Odds Arithmetic
//!
//! Pari-mutuel odds and payouts computed with integer arithmetic only.
//! No floats anywhere in the accounting path.
//!
//! ## Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Odds stored as hundredths (two decimal places)             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  100  = 1.00x   (even money)                                │
//! │  200  = 2.00x   (fair-coin default)                         │
//! │  400  = 4.00x   (pool 400, winning side 100)                │
//! │                                                             │
//! │  odds = total_pool / side_total, rounded half-up            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Wager amounts are whole units (u64), so two fractional digits are the
//! finest granularity a payout can use without drifting from the literal
//! pool sums.

use std::fmt;

/// Odds in hundredths, stored as u64.
pub type Odds = u64;

/// 1.00x in scaled odds (100)
pub const ODDS_ONE: Odds = 100;

/// Default odds when either side of the pool is empty: 2.00x.
///
/// A pool with an empty side carries no information about relative stake,
/// so the fair-coin payout applies.
pub const DEFAULT_ODDS: Odds = 2 * ODDS_ONE;

// =============================================================================
// CORE OPERATIONS
// =============================================================================

/// Pari-mutuel odds for one side of a two-sided pool.
///
/// `side_total` is the stake on the side being quoted, `other_total` the
/// stake on the opposite side. Returns [`DEFAULT_ODDS`] whenever either
/// side is empty (which covers the empty-pool case); otherwise
/// `(side_total + other_total) / side_total` rounded half-up to hundredths.
///
/// # Example
/// ```
/// use rps_arena::core::odds::{odds_from_totals, DEFAULT_ODDS};
///
/// assert_eq!(odds_from_totals(100, 300), 400); // 4.00x
/// assert_eq!(odds_from_totals(100, 0), DEFAULT_ODDS);
/// ```
#[inline]
pub fn odds_from_totals(side_total: u64, other_total: u64) -> Odds {
    if side_total == 0 || other_total == 0 {
        return DEFAULT_ODDS;
    }
    let pool = side_total as u128 + other_total as u128;
    // Widen to u128 so pool * 100 cannot overflow
    round_div(pool * ODDS_ONE as u128, side_total as u128)
}

/// Payout for a winning wager: `round(amount * odds)`.
///
/// Widened to u128 internally; saturates at u64::MAX rather than wrapping.
#[inline]
pub fn payout(amount: u64, odds: Odds) -> u64 {
    let wide = amount as u128 * odds as u128;
    round_div(wide, ODDS_ONE as u128)
}

/// Divide with half-up rounding, saturating into u64.
#[inline]
fn round_div(numerator: u128, denominator: u128) -> u64 {
    let q = (numerator + denominator / 2) / denominator;
    u64::try_from(q).unwrap_or(u64::MAX)
}

/// Render scaled odds as a decimal multiplier, e.g. `4.00x`.
///
/// Integer formatting only; for display, never for computation.
pub struct DisplayOdds(pub Odds);

impl fmt::Display for DisplayOdds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}x", self.0 / ODDS_ONE, self.0 % ODDS_ONE)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odds_constants() {
        assert_eq!(ODDS_ONE, 100);
        assert_eq!(DEFAULT_ODDS, 200);
    }

    #[test]
    fn test_default_when_either_side_empty() {
        assert_eq!(odds_from_totals(0, 0), DEFAULT_ODDS);
        assert_eq!(odds_from_totals(100, 0), DEFAULT_ODDS);
        assert_eq!(odds_from_totals(0, 100), DEFAULT_ODDS);
    }

    #[test]
    fn test_exact_division() {
        // 400 total / 100 side = 4.00x
        assert_eq!(odds_from_totals(100, 300), 400);
        // 200 total / 100 side = 2.00x
        assert_eq!(odds_from_totals(100, 100), 200);
        // 400 total / 300 side = 1.33x
        assert_eq!(odds_from_totals(300, 100), 133);
    }

    #[test]
    fn test_rounding_half_up() {
        // 500 / 300 = 1.666... -> 1.67x
        assert_eq!(odds_from_totals(300, 200), 167);
        // 500 / 200 = 2.5 -> 2.50x exactly
        assert_eq!(odds_from_totals(200, 300), 250);
        // 1000 / 700 = 1.42857... -> 1.43x
        assert_eq!(odds_from_totals(700, 300), 143);
    }

    #[test]
    fn test_payout() {
        assert_eq!(payout(100, 200), 200);
        assert_eq!(payout(100, 400), 400);
        // 100 * 1.33 = 133
        assert_eq!(payout(100, 133), 133);
        // Half-up: 25 * 1.33 = 33.25 -> 33; 50 * 1.33 = 66.5 -> 67
        assert_eq!(payout(25, 133), 33);
        assert_eq!(payout(50, 133), 67);
        assert_eq!(payout(0, 400), 0);
    }

    #[test]
    fn test_no_overflow_on_large_pools() {
        // Totals near u64::MAX must not wrap in the widened math
        let big = u64::MAX / 2;
        let odds = odds_from_totals(big, big);
        assert_eq!(odds, 200);
        assert_eq!(payout(u64::MAX, ODDS_ONE), u64::MAX);
    }

    #[test]
    fn test_display_odds() {
        assert_eq!(DisplayOdds(200).to_string(), "2.00x");
        assert_eq!(DisplayOdds(400).to_string(), "4.00x");
        assert_eq!(DisplayOdds(133).to_string(), "1.33x");
        assert_eq!(DisplayOdds(105).to_string(), "1.05x");
    }
}
