use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::end::{CapacityExceeded, End, Shot};

/// Distances (meters) offered by the setup screen.
pub const DISTANCES_M: [u16; 9] = [10, 18, 20, 30, 40, 50, 60, 70, 90];

/// Arrows-per-end choices.
pub const END_SIZES: [u8; 2] = [3, 6];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    CapacityExceeded(#[from] CapacityExceeded),
    /// Forward advancement requires a completed end; browsing history
    /// via seek does not.
    #[error("current end has {recorded} of {capacity} arrows")]
    EndNotComplete { recorded: usize, capacity: u8 },
    /// An invalid seek indicates a caller bug.
    #[error("end index {index} out of range ({len} ends)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// An in-progress scoring session: ordered ends plus a cursor.
///
/// Invariant: `current_end_index` is always a valid index into `ends`,
/// and `ends` is never empty. The cursor may point at an earlier end
/// while the archer reviews history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub distance_meters: u16,
    pub arrows_per_end: u8,
    ends: Vec<End>,
    current_end_index: usize,
    #[serde(default)]
    pub created_at_epoch_millis: i64,
}

impl Session {
    /// Start a new session with one empty end and the cursor on it.
    pub fn start(distance_meters: u16, arrows_per_end: u8) -> Self {
        Self {
            distance_meters,
            arrows_per_end,
            ends: vec![End::new()],
            current_end_index: 0,
            created_at_epoch_millis: Utc::now().timestamp_millis(),
        }
    }

    pub fn ends(&self) -> &[End] {
        &self.ends
    }

    pub fn current_end_index(&self) -> usize {
        self.current_end_index
    }

    pub fn current_end(&self) -> &End {
        &self.ends[self.current_end_index]
    }

    /// Record a shot into the current end.
    pub fn record_shot(&mut self, shot: Shot) -> Result<(), SessionError> {
        let end = self.current_end().with_shot(shot, self.arrows_per_end)?;
        self.ends[self.current_end_index] = end;
        Ok(())
    }

    /// Drop the most recent shot of the current end, if any.
    pub fn undo_last_shot(&mut self) {
        let end = self.current_end().without_last();
        self.ends[self.current_end_index] = end;
    }

    /// Move the cursor forward, appending a fresh end when leaving the
    /// last one.
    pub fn advance_end(&mut self) -> Result<(), SessionError> {
        let current = self.current_end();
        if !current.is_complete(self.arrows_per_end) {
            return Err(SessionError::EndNotComplete {
                recorded: current.len(),
                capacity: self.arrows_per_end,
            });
        }
        if self.current_end_index + 1 == self.ends.len() {
            self.ends.push(End::new());
        }
        self.current_end_index += 1;
        Ok(())
    }

    /// Browse to a recorded end without mutating it.
    pub fn seek_end(&mut self, index: usize) -> Result<(), SessionError> {
        if index >= self.ends.len() {
            return Err(SessionError::IndexOutOfRange {
                index,
                len: self.ends.len(),
            });
        }
        self.current_end_index = index;
        Ok(())
    }

    /// All shots across all ends, in recording order.
    pub fn shots(&self) -> impl Iterator<Item = &Shot> {
        self.ends.iter().flat_map(|e| e.shots())
    }

    /// Total points over every recorded end.
    pub fn running_total(&self) -> u32 {
        self.ends.iter().map(End::total).sum()
    }

    pub fn arrows_recorded(&self) -> u32 {
        self.ends.iter().map(|e| e.len() as u32).sum()
    }

    /// Ten points per recorded arrow, for the "score / possible" readout.
    pub fn max_possible(&self) -> u32 {
        self.arrows_recorded() * 10
    }

    /// Structural sanity of a restored session. A snapshot that fails
    /// this is treated as corrupt.
    pub fn is_well_formed(&self) -> bool {
        !self.ends.is_empty()
            && self.current_end_index < self.ends.len()
            && self
                .ends
                .iter()
                .all(|e| e.len() <= usize::from(self.arrows_per_end))
    }

    /// Project the session into its finalized record.
    ///
    /// Pure: computable at any point, whether or not the trailing end is
    /// complete. Ends holding no shots are dropped from the snapshot.
    pub fn finalize(&self) -> FinalizedSession {
        FinalizedSession {
            distance_meters: self.distance_meters,
            arrows_per_end: self.arrows_per_end,
            total_score: self.running_total(),
            total_arrows: self.arrows_recorded(),
            ends_snapshot: self
                .ends
                .iter()
                .filter(|e| !e.is_empty())
                .cloned()
                .collect(),
        }
    }
}

/// Finalized record handed to the history store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedSession {
    pub distance_meters: u16,
    pub arrows_per_end: u8,
    pub total_score: u32,
    pub total_arrows: u32,
    pub ends_snapshot: Vec<End>,
}
