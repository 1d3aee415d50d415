//! Move Oracle
//!
//! Total interface over the completion provider: `get_move` always
//! returns a move. Provider failures and unrecognizable replies fall
//! back to a uniformly random move from the injected seedable RNG, so a
//! round can never stall or fail on oracle unavailability.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::core::rng::DeterministicRng;
use crate::game::moves::{Move, Player};
use crate::oracle::provider::CompletionProvider;

/// Requests one move per player slot from the completion provider.
pub struct MoveOracle {
    provider: Arc<dyn CompletionProvider>,
    rng: Mutex<DeterministicRng>,
}

impl MoveOracle {
    /// Create an oracle over `provider`, seeding the fallback RNG.
    pub fn new(provider: Arc<dyn CompletionProvider>, fallback_seed: u64) -> Self {
        Self {
            provider,
            rng: Mutex::new(DeterministicRng::new(fallback_seed)),
        }
    }

    /// The per-slot instruction sent to the completion provider.
    pub fn prompt_for(player: Player) -> String {
        format!(
            "You are {} in a rock-paper-scissors game. Choose your move \
             based on game theory and strategic thinking. Respond with \
             ONLY ONE of these words: rock, paper, or scissors.",
            player.label()
        )
    }

    /// Extract a move token from free-form completion text.
    ///
    /// An exact match of the trimmed lowercase reply is preferred;
    /// otherwise the earliest occurrence of any move name wins, so a
    /// wordy reply like "I will play rock." still parses.
    pub fn extract_move(content: &str) -> Option<Move> {
        let lower = content.trim().to_lowercase();
        if let Some(chosen) = Move::from_name(&lower) {
            return Some(chosen);
        }
        Move::ALL
            .iter()
            .copied()
            .filter_map(|m| lower.find(m.name()).map(|pos| (pos, m)))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, m)| m)
    }

    /// Obtain a move for the given slot. Never fails.
    ///
    /// Any provider error or token-free reply is logged as recoverable
    /// and replaced by a uniform-random move.
    pub async fn get_move(&self, player: Player) -> Move {
        let prompt = Self::prompt_for(player);
        match self.provider.complete(&prompt).await {
            Ok(content) => match Self::extract_move(&content) {
                Some(chosen) => {
                    debug!(slot = %player, chosen = %chosen, "oracle move");
                    chosen
                }
                None => {
                    warn!(
                        slot = %player,
                        reply = %content.trim(),
                        "no move token in completion, using random fallback"
                    );
                    self.fallback_move()
                }
            },
            Err(err) => {
                warn!(
                    slot = %player,
                    error = %err,
                    "completion provider failed, using random fallback"
                );
                self.fallback_move()
            }
        }
    }

    fn fallback_move(&self) -> Move {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        *rng.choose(&Move::ALL).unwrap_or(&Move::Rock)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::provider::{CompletionError, ScriptedProvider};

    fn oracle_with(replies: Vec<Result<String, CompletionError>>, seed: u64) -> MoveOracle {
        MoveOracle::new(Arc::new(ScriptedProvider::new(replies)), seed)
    }

    fn expected_fallback(seed: u64) -> Move {
        let mut rng = DeterministicRng::new(seed);
        *rng.choose(&Move::ALL).unwrap()
    }

    #[test]
    fn test_extract_exact_match() {
        assert_eq!(MoveOracle::extract_move("rock"), Some(Move::Rock));
        assert_eq!(MoveOracle::extract_move("  Paper \n"), Some(Move::Paper));
        assert_eq!(MoveOracle::extract_move("SCISSORS"), Some(Move::Scissors));
    }

    #[test]
    fn test_extract_substring_earliest_occurrence() {
        assert_eq!(
            MoveOracle::extract_move("I will play rock."),
            Some(Move::Rock)
        );
        // Earliest token wins when a reply names more than one move
        assert_eq!(
            MoveOracle::extract_move("paper beats rock, so paper"),
            Some(Move::Paper)
        );
        assert_eq!(
            MoveOracle::extract_move("My choice: Scissors!"),
            Some(Move::Scissors)
        );
    }

    #[test]
    fn test_extract_no_token() {
        assert_eq!(MoveOracle::extract_move(""), None);
        assert_eq!(MoveOracle::extract_move("lizard"), None);
        assert_eq!(MoveOracle::extract_move("I refuse to play"), None);
    }

    #[test]
    fn test_prompt_names_the_slot() {
        assert!(MoveOracle::prompt_for(Player::Ai1).contains("AI-1"));
        assert!(MoveOracle::prompt_for(Player::Ai2).contains("AI-2"));
    }

    #[tokio::test]
    async fn test_get_move_passes_through_valid_reply() {
        let oracle = oracle_with(vec![Ok("scissors".to_string())], 1);
        assert_eq!(oracle.get_move(Player::Ai1).await, Move::Scissors);
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back_deterministically() {
        let seed = 42;
        let oracle = oracle_with(vec![Err(CompletionError::BadStatus(500))], seed);
        assert_eq!(oracle.get_move(Player::Ai1).await, expected_fallback(seed));
    }

    #[tokio::test]
    async fn test_token_free_reply_falls_back() {
        let seed = 7;
        let oracle = oracle_with(vec![Ok("I choose violence".to_string())], seed);
        assert_eq!(oracle.get_move(Player::Ai2).await, expected_fallback(seed));
    }

    #[tokio::test]
    async fn test_each_slot_fails_independently() {
        // One good reply, one failure: the good slot keeps its move, the
        // failed slot gets the fallback.
        let seed = 3;
        let oracle = oracle_with(
            vec![
                Ok("paper".to_string()),
                Err(CompletionError::MalformedBody),
            ],
            seed,
        );
        assert_eq!(oracle.get_move(Player::Ai1).await, Move::Paper);
        assert_eq!(oracle.get_move(Player::Ai2).await, expected_fallback(seed));
    }
}
