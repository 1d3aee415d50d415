//! Match History
//!
//! Completed-match records and the append-only history they land in.
//! Records are immutable once emitted; the history only ever grows and is
//! ordered newest-first for display.

use std::collections::VecDeque;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::game::moves::{Move, MatchOutcome};

/// Immutable record of one completed match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Unique match id (monotonic, starts at 1)
    pub id: u64,

    /// Sequential round number (starts at 1, only counts completed rounds)
    pub round_number: u64,

    /// Move played by AI-1
    pub ai1_move: Move,

    /// Move played by AI-2
    pub ai2_move: Move,

    /// Derived outcome
    pub outcome: MatchOutcome,

    /// When the match completed
    pub completed_at: DateTime<Utc>,
}

/// Append-only history of completed matches, newest first.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MatchHistory {
    records: VecDeque<MatchRecord>,
}

impl MatchHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a newly completed record at the front.
    ///
    /// Existing entries are never touched.
    pub fn push(&mut self, record: MatchRecord) {
        self.records.push_front(record);
    }

    /// The most recently completed match, if any.
    pub fn latest(&self) -> Option<&MatchRecord> {
        self.records.front()
    }

    /// Iterate newest-first.
    pub fn iter(&self) -> impl Iterator<Item = &MatchRecord> {
        self.records.iter()
    }

    /// Up to `limit` most recent records, newest first.
    pub fn recent(&self, limit: usize) -> Vec<MatchRecord> {
        self.records.iter().take(limit).cloned().collect()
    }

    /// Number of completed matches recorded.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no match has completed yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
