//! Match Lifecycle Engine
//!
//! The state machine driving one match at a time through
//! idle -> countdown -> playing -> result. Purely synchronous: the caller
//! supplies elapsed time units (ticks), resolved moves and timestamps, so
//! every transition is replayable in tests. Oracle calls and timers live in
//! the session layer.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::COUNTDOWN_START;
use crate::game::history::MatchRecord;
use crate::game::moves::{determine_winner, Move};

// =============================================================================
// MATCH PHASE
// =============================================================================

/// Current phase of the match lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Default)]
pub enum MatchPhase {
    /// No match underway
    #[default]
    Idle,
    /// Countdown before moves are requested
    Countdown { ticks_remaining: u32 },
    /// Both moves requested, waiting for them to resolve
    Playing,
    /// Last match completed, showing its result
    Result,
}

// =============================================================================
// TICK OUTCOME
// =============================================================================

/// What one elapsed countdown tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Engine was not in countdown; nothing changed
    NotCounting,
    /// Countdown decremented and continues
    Counting {
        /// Ticks left before moves are requested
        ticks_remaining: u32,
    },
    /// Countdown hit zero; engine is now playing and both moves
    /// must be requested
    MovesRequested,
}

/// Engine misuse errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// `start` while a countdown or round is already underway.
    #[error("match already in progress")]
    AlreadyRunning,
    /// Round completion or abort outside the playing phase.
    #[error("no round in progress")]
    NotPlaying,
}

// =============================================================================
// MATCH ENGINE
// =============================================================================

/// Drives the match lifecycle and numbers completed rounds.
///
/// Round numbers and match ids are monotonic counters; a round that aborts
/// consumes neither.
#[derive(Clone, Debug)]
pub struct MatchEngine {
    phase: MatchPhase,
    /// Rounds completed so far; the next record gets this + 1
    round_number: u64,
    /// Next match id to hand out (starts at 1)
    next_match_id: u64,
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchEngine {
    /// Create an idle engine with no completed rounds.
    pub fn new() -> Self {
        Self {
            phase: MatchPhase::Idle,
            round_number: 0,
            next_match_id: 1,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Number of rounds completed so far.
    pub fn round_number(&self) -> u64 {
        self.round_number
    }

    /// The round number the next completed match will carry.
    pub fn next_round_number(&self) -> u64 {
        self.round_number + 1
    }

    /// Whether a round is waiting on moves.
    pub fn is_playing(&self) -> bool {
        matches!(self.phase, MatchPhase::Playing)
    }

    /// Begin a new round: idle or result -> countdown.
    ///
    /// Returns the initial tick count. Rejected while a countdown or round
    /// is already underway.
    pub fn start(&mut self) -> Result<u32, EngineError> {
        match self.phase {
            MatchPhase::Idle | MatchPhase::Result => {
                self.phase = MatchPhase::Countdown {
                    ticks_remaining: COUNTDOWN_START,
                };
                Ok(COUNTDOWN_START)
            }
            MatchPhase::Countdown { .. } | MatchPhase::Playing => {
                Err(EngineError::AlreadyRunning)
            }
        }
    }

    /// One countdown time unit has elapsed.
    ///
    /// Decrements the countdown; on reaching zero the engine moves to
    /// playing and reports that both moves must now be requested. In any
    /// other phase this is a no-op, so a stale timer can never re-enter
    /// countdown or disturb a running round.
    pub fn tick(&mut self) -> TickOutcome {
        match self.phase {
            MatchPhase::Countdown { ticks_remaining } => {
                let remaining = ticks_remaining.saturating_sub(1);
                if remaining == 0 {
                    self.phase = MatchPhase::Playing;
                    TickOutcome::MovesRequested
                } else {
                    self.phase = MatchPhase::Countdown {
                        ticks_remaining: remaining,
                    };
                    TickOutcome::Counting {
                        ticks_remaining: remaining,
                    }
                }
            }
            _ => TickOutcome::NotCounting,
        }
    }

    /// Both moves resolved: playing -> result.
    ///
    /// Computes the outcome, allocates the match id and increments the
    /// round number. The returned record is the only copy; the caller hands
    /// it to history and settlement.
    pub fn complete_round(
        &mut self,
        ai1_move: Move,
        ai2_move: Move,
        completed_at: DateTime<Utc>,
    ) -> Result<MatchRecord, EngineError> {
        if !self.is_playing() {
            return Err(EngineError::NotPlaying);
        }

        let record = MatchRecord {
            id: self.next_match_id,
            round_number: self.round_number + 1,
            ai1_move,
            ai2_move,
            outcome: determine_winner(ai1_move, ai2_move),
            completed_at,
        };

        self.next_match_id += 1;
        self.round_number += 1;
        self.phase = MatchPhase::Result;

        Ok(record)
    }

    /// Hard failure while playing: playing -> idle.
    ///
    /// No record is produced and the round number is not consumed; pending
    /// bets roll forward to the next completed match.
    pub fn abort_round(&mut self) -> Result<(), EngineError> {
        if !self.is_playing() {
            return Err(EngineError::NotPlaying);
        }
        self.phase = MatchPhase::Idle;
        Ok(())
    }

    /// Return to idle from any phase, cancelling a countdown or round.
    pub fn reset(&mut self) {
        self.phase = MatchPhase::Idle;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::moves::MatchOutcome;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_initial_state() {
        let engine = MatchEngine::new();
        assert_eq!(engine.phase(), MatchPhase::Idle);
        assert_eq!(engine.round_number(), 0);
        assert_eq!(engine.next_round_number(), 1);
    }

    #[test]
    fn test_countdown_exactly_three_ticks() {
        let mut engine = MatchEngine::new();
        assert_eq!(engine.start().unwrap(), 3);
        assert_eq!(
            engine.phase(),
            MatchPhase::Countdown { ticks_remaining: 3 }
        );

        assert_eq!(engine.tick(), TickOutcome::Counting { ticks_remaining: 2 });
        assert_eq!(engine.tick(), TickOutcome::Counting { ticks_remaining: 1 });
        assert_eq!(engine.tick(), TickOutcome::MovesRequested);
        assert_eq!(engine.phase(), MatchPhase::Playing);

        // Further ticks are inert and can never go negative
        assert_eq!(engine.tick(), TickOutcome::NotCounting);
        assert_eq!(engine.phase(), MatchPhase::Playing);
    }

    #[test]
    fn test_start_rejected_while_running() {
        let mut engine = MatchEngine::new();
        engine.start().unwrap();
        assert_eq!(engine.start(), Err(EngineError::AlreadyRunning));

        // Drive into playing; still rejected
        while engine.tick() != TickOutcome::MovesRequested {}
        assert_eq!(engine.start(), Err(EngineError::AlreadyRunning));
    }

    #[test]
    fn test_complete_round_numbers_and_outcome() {
        let mut engine = MatchEngine::new();
        engine.start().unwrap();
        while engine.tick() != TickOutcome::MovesRequested {}

        let record = engine
            .complete_round(Move::Rock, Move::Scissors, now())
            .unwrap();
        assert_eq!(record.id, 1);
        assert_eq!(record.round_number, 1);
        assert_eq!(record.outcome, MatchOutcome::Ai1);
        assert_eq!(engine.phase(), MatchPhase::Result);
        assert_eq!(engine.round_number(), 1);

        // Restart from result and complete a second round
        engine.start().unwrap();
        while engine.tick() != TickOutcome::MovesRequested {}
        let record = engine
            .complete_round(Move::Paper, Move::Paper, now())
            .unwrap();
        assert_eq!(record.id, 2);
        assert_eq!(record.round_number, 2);
        assert_eq!(record.outcome, MatchOutcome::Draw);
    }

    #[test]
    fn test_complete_requires_playing() {
        let mut engine = MatchEngine::new();
        assert_eq!(
            engine.complete_round(Move::Rock, Move::Rock, now()),
            Err(EngineError::NotPlaying)
        );

        engine.start().unwrap();
        // Still counting down
        assert_eq!(
            engine.complete_round(Move::Rock, Move::Rock, now()),
            Err(EngineError::NotPlaying)
        );
    }

    #[test]
    fn test_abort_returns_to_idle_without_counting_round() {
        let mut engine = MatchEngine::new();
        engine.start().unwrap();
        while engine.tick() != TickOutcome::MovesRequested {}

        engine.abort_round().unwrap();
        assert_eq!(engine.phase(), MatchPhase::Idle);
        assert_eq!(engine.round_number(), 0);

        // The next completed round still gets round number 1
        engine.start().unwrap();
        while engine.tick() != TickOutcome::MovesRequested {}
        let record = engine
            .complete_round(Move::Scissors, Move::Rock, now())
            .unwrap();
        assert_eq!(record.round_number, 1);
        // Aborted round did not consume a match id either
        assert_eq!(record.id, 1);
    }

    #[test]
    fn test_abort_requires_playing() {
        let mut engine = MatchEngine::new();
        assert_eq!(engine.abort_round(), Err(EngineError::NotPlaying));
    }

    #[test]
    fn test_reset_cancels_countdown() {
        let mut engine = MatchEngine::new();
        engine.start().unwrap();
        engine.tick();
        engine.reset();
        assert_eq!(engine.phase(), MatchPhase::Idle);

        // A stale timer tick after reset does nothing
        assert_eq!(engine.tick(), TickOutcome::NotCounting);
        assert_eq!(engine.phase(), MatchPhase::Idle);
    }

    #[test]
    fn test_playing_never_reenters_countdown_directly() {
        let mut engine = MatchEngine::new();
        engine.start().unwrap();
        while engine.tick() != TickOutcome::MovesRequested {}
        assert_eq!(engine.phase(), MatchPhase::Playing);

        // Only completion or abort leaves playing; start is rejected
        assert_eq!(engine.start(), Err(EngineError::AlreadyRunning));
        engine
            .complete_round(Move::Rock, Move::Paper, now())
            .unwrap();
        assert_eq!(engine.phase(), MatchPhase::Result);
        assert_eq!(engine.start().unwrap(), 3);
    }
}
