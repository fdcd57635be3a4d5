use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::score::ShotValue;

/// A single recorded arrow: where it landed and what it scored.
///
/// Immutable once recorded; only ever removed again by "clear last"
/// within its own end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "ringValue")]
    pub value: ShotValue,
    /// 1-based identity of the physical arrow, assigned on confirmation.
    #[serde(rename = "arrowIndex", default, skip_serializing_if = "Option::is_none")]
    pub arrow_index: Option<u8>,
}

impl Shot {
    pub fn new(x: f64, y: f64, value: ShotValue) -> Self {
        Self {
            x,
            y,
            value,
            arrow_index: None,
        }
    }

    pub fn with_arrow_index(mut self, arrow_index: u8) -> Self {
        self.arrow_index = Some(arrow_index);
        self
    }
}

/// Returned when appending to an end that already holds a full set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("end already holds {capacity} arrows")]
pub struct CapacityExceeded {
    pub capacity: u8,
}

/// An ordered group of shots scored as a unit.
///
/// Operations return new snapshots; the caller commits the result back
/// into the session. Shots are never reordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct End {
    shots: Vec<Shot>,
}

impl End {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shots(&self) -> &[Shot] {
        &self.shots
    }

    pub fn len(&self) -> usize {
        self.shots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }

    pub fn is_complete(&self, arrows_per_end: u8) -> bool {
        self.shots.len() == usize::from(arrows_per_end)
    }

    /// Append a shot, or fail when the end already holds a full set.
    pub fn with_shot(&self, shot: Shot, arrows_per_end: u8) -> Result<End, CapacityExceeded> {
        if self.shots.len() >= usize::from(arrows_per_end) {
            return Err(CapacityExceeded {
                capacity: arrows_per_end,
            });
        }
        let mut shots = self.shots.clone();
        shots.push(shot);
        Ok(End { shots })
    }

    /// Drop the most recent shot. No-op on an empty end.
    pub fn without_last(&self) -> End {
        let mut shots = self.shots.clone();
        shots.pop();
        End { shots }
    }

    /// Sum of ring points; an inner ten counts ten, a miss zero.
    pub fn total(&self) -> u32 {
        self.shots.iter().map(|s| s.value.points()).sum()
    }
}

impl From<Vec<Shot>> for End {
    fn from(shots: Vec<Shot>) -> Self {
        End { shots }
    }
}
