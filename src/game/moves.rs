//! Moves, Players and Outcomes
//!
//! The fixed vocabulary of a match: the three moves, the two player slots,
//! and the table-driven winner rule. Everything here is a pure value type.

use std::fmt;
use serde::{Serialize, Deserialize};

// =============================================================================
// MOVE
// =============================================================================

/// One of the three legal moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Move {
    /// Beats scissors, loses to paper
    Rock = 0,
    /// Beats rock, loses to scissors
    Paper = 1,
    /// Beats paper, loses to rock
    Scissors = 2,
}

impl Move {
    /// All moves, in canonical order. Used for uniform random fallback.
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Move::Rock => "rock",
            Move::Paper => "paper",
            Move::Scissors => "scissors",
        }
    }

    /// Parse an exact lowercase move name.
    pub fn from_name(name: &str) -> Option<Move> {
        match name {
            "rock" => Some(Move::Rock),
            "paper" => Some(Move::Paper),
            "scissors" => Some(Move::Scissors),
            _ => None,
        }
    }

    /// Does this move beat the other one?
    #[inline]
    pub fn beats(self, other: Move) -> bool {
        matches!(
            (self, other),
            (Move::Rock, Move::Scissors)
                | (Move::Scissors, Move::Paper)
                | (Move::Paper, Move::Rock)
        )
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// The two fixed player slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Player {
    /// First slot ("AI-1")
    Ai1 = 0,
    /// Second slot ("AI-2")
    Ai2 = 1,
}

impl Player {
    /// Both slots, in canonical order.
    pub const BOTH: [Player; 2] = [Player::Ai1, Player::Ai2];

    /// The opposing slot.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::Ai1 => Player::Ai2,
            Player::Ai2 => Player::Ai1,
        }
    }

    /// Display label, e.g. `AI-1`.
    pub fn label(self) -> &'static str {
        match self {
            Player::Ai1 => "AI-1",
            Player::Ai2 => "AI-2",
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// Result of one completed match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOutcome {
    /// AI-1 won
    Ai1,
    /// AI-2 won
    Ai2,
    /// Equal moves
    Draw,
}

impl MatchOutcome {
    /// The winning slot, if any.
    pub fn winner(self) -> Option<Player> {
        match self {
            MatchOutcome::Ai1 => Some(Player::Ai1),
            MatchOutcome::Ai2 => Some(Player::Ai2),
            MatchOutcome::Draw => None,
        }
    }

    /// Whether this outcome is a win for the given slot.
    ///
    /// A draw is a win for neither slot.
    #[inline]
    pub fn is_win_for(self, player: Player) -> bool {
        self.winner() == Some(player)
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchOutcome::Ai1 => f.write_str("AI-1 wins"),
            MatchOutcome::Ai2 => f.write_str("AI-2 wins"),
            MatchOutcome::Draw => f.write_str("draw"),
        }
    }
}

/// The winner rule, written out as the full table.
///
/// Pure function of the two moves; every one of the 9 combinations is an
/// explicit arm.
pub fn determine_winner(ai1_move: Move, ai2_move: Move) -> MatchOutcome {
    use Move::*;
    match (ai1_move, ai2_move) {
        (Rock, Rock) => MatchOutcome::Draw,
        (Rock, Paper) => MatchOutcome::Ai2,
        (Rock, Scissors) => MatchOutcome::Ai1,
        (Paper, Rock) => MatchOutcome::Ai1,
        (Paper, Paper) => MatchOutcome::Draw,
        (Paper, Scissors) => MatchOutcome::Ai2,
        (Scissors, Rock) => MatchOutcome::Ai2,
        (Scissors, Paper) => MatchOutcome::Ai1,
        (Scissors, Scissors) => MatchOutcome::Draw,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_nine_combinations() {
        use Move::*;
        use MatchOutcome::*;

        let table = [
            (Rock, Rock, Draw),
            (Rock, Paper, Ai2),
            (Rock, Scissors, Ai1),
            (Paper, Rock, Ai1),
            (Paper, Paper, Draw),
            (Paper, Scissors, Ai2),
            (Scissors, Rock, Ai2),
            (Scissors, Paper, Ai1),
            (Scissors, Scissors, Draw),
        ];

        for (m1, m2, expected) in table {
            assert_eq!(
                determine_winner(m1, m2),
                expected,
                "{} vs {}",
                m1,
                m2
            );
        }
    }

    #[test]
    fn test_equal_moves_always_draw() {
        for m in Move::ALL {
            assert_eq!(determine_winner(m, m), MatchOutcome::Draw);
        }
    }

    #[test]
    fn test_beats_is_antisymmetric() {
        for a in Move::ALL {
            for b in Move::ALL {
                if a == b {
                    assert!(!a.beats(b));
                } else {
                    // Exactly one of the two directions wins
                    assert_ne!(a.beats(b), b.beats(a), "{} vs {}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_outcome_consistent_with_beats() {
        for a in Move::ALL {
            for b in Move::ALL {
                let outcome = determine_winner(a, b);
                match outcome {
                    MatchOutcome::Ai1 => assert!(a.beats(b)),
                    MatchOutcome::Ai2 => assert!(b.beats(a)),
                    MatchOutcome::Draw => assert_eq!(a, b),
                }
            }
        }
    }

    #[test]
    fn test_move_names_roundtrip() {
        for m in Move::ALL {
            assert_eq!(Move::from_name(m.name()), Some(m));
        }
        assert_eq!(Move::from_name("lizard"), None);
        // Exact match only: case and whitespace are the caller's problem
        assert_eq!(Move::from_name("Rock"), None);
    }

    #[test]
    fn test_serde_wire_names() {
        assert_eq!(serde_json::to_string(&Move::Rock).unwrap(), "\"rock\"");
        assert_eq!(serde_json::to_string(&Player::Ai2).unwrap(), "\"ai2\"");
        assert_eq!(
            serde_json::to_string(&MatchOutcome::Draw).unwrap(),
            "\"draw\""
        );
        let m: Move = serde_json::from_str("\"scissors\"").unwrap();
        assert_eq!(m, Move::Scissors);
    }

    #[test]
    fn test_win_for_and_opponent() {
        assert!(MatchOutcome::Ai1.is_win_for(Player::Ai1));
        assert!(!MatchOutcome::Ai1.is_win_for(Player::Ai2));
        assert!(!MatchOutcome::Draw.is_win_for(Player::Ai1));
        assert!(!MatchOutcome::Draw.is_win_for(Player::Ai2));
        assert_eq!(Player::Ai1.opponent(), Player::Ai2);
        assert_eq!(Player::Ai2.opponent(), Player::Ai1);
    }
}
