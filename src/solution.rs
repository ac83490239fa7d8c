//! An ordered list of plates with a derived score.

use crate::plate::Plate;

/// A complete layout: every plate a Placer sealed, in order. Immutable once
/// built; owns its plates.
pub struct Solution {
    plates: Vec<Plate>,
}

impl Solution {
    pub fn new(plates: Vec<Plate>) -> Self {
        Solution { plates }
    }

    pub fn plate_count(&self) -> usize {
        self.plates.len()
    }

    pub fn plates(&self) -> &[Plate] {
        &self.plates
    }

    /// `plates + 0.1 * bbox_diagonal(last_plate)`. The last plate is the
    /// only one that isn't fully packed, so it alone carries the
    /// tie-breaking compactness term; lower is better.
    pub fn score(&self) -> f64 {
        let diag = self.plates.last().map(|p| p.bbox_diagonal()).unwrap_or(0.0);
        self.plates.len() as f64 + 0.1 * diag
    }
}
