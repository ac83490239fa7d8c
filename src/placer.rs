//! Greedy single-plate placer: one deterministic strategy, one Solution.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::part::Part;
use crate::plate::Plate;
use crate::plate_mode::PlateMode;
use crate::solution::Solution;

/// The axis a Placer's input queue is sorted by (§4.3).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SortMode {
    SurfaceDec,
    SurfaceInc,
    HeightDec,
    HeightInc,
    WidthDec,
    WidthInc,
    DensityInc,
    DensityDec,
    Shuffle(u64),
}

/// The gravity tie-breaker a Placer scores candidate positions with.
///
/// The strategy enumeration in `SearchEngine` only ever constructs `Yx` and
/// `Xy`: the source excludes `Eq` from the gravity axis of its Cartesian
/// product (`gravity < PLACER_GRAVITY_EQ`), a quirk this crate reproduces
/// (see `SearchEngine::enumerate_strategies`). `Eq` itself is implemented
/// and tested here so the exclusion is a visible choice, not a missing mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gravity {
    Yx,
    Xy,
    Eq,
}

/// One point in the strategy space: `(sortMode, gravity, rotateOffset,
/// rotateDirection)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Strategy {
    pub sort_mode: SortMode,
    pub gravity: Gravity,
    pub rotate_offset: bool,
    pub rotate_direction: bool,
}

/// Runs one strategy against a fixed list of (part, quantity) pairs,
/// packing every requested copy onto as few plates as possible.
pub struct Placer<'a> {
    strategy: Strategy,
    parts: &'a [(Arc<Part>, i32)],
    plate_mode: PlateMode,
    precision: f64,
    delta: f64,
}

impl<'a> Placer<'a> {
    pub fn new(
        strategy: Strategy,
        parts: &'a [(Arc<Part>, i32)],
        plate_mode: PlateMode,
        precision: f64,
        delta: f64,
    ) -> Self {
        Placer { strategy, parts, plate_mode, precision, delta }
    }

    /// Expands (part, quantity) pairs into one queue entry per copy, then
    /// orders the queue by `strategy.sort_mode`.
    fn build_queue(&self) -> Vec<Arc<Part>> {
        let mut queue: Vec<Arc<Part>> = Vec::new();
        for (part, quantity) in self.parts {
            for _ in 0..(*quantity).max(0) {
                queue.push(part.clone());
            }
        }

        match self.strategy.sort_mode {
            SortMode::SurfaceDec => queue.sort_by(|a, b| b.surface().total_cmp(&a.surface())),
            SortMode::SurfaceInc => queue.sort_by(|a, b| a.surface().total_cmp(&b.surface())),
            SortMode::HeightDec => queue.sort_by(|a, b| b.height().total_cmp(&a.height())),
            SortMode::HeightInc => queue.sort_by(|a, b| a.height().total_cmp(&b.height())),
            SortMode::WidthDec => queue.sort_by(|a, b| b.width().total_cmp(&a.width())),
            SortMode::WidthInc => queue.sort_by(|a, b| a.width().total_cmp(&b.width())),
            SortMode::DensityInc => queue.sort_by(|a, b| a.density().total_cmp(&b.density())),
            SortMode::DensityDec => queue.sort_by(|a, b| b.density().total_cmp(&a.density())),
            SortMode::Shuffle(seed) => {
                let mut rng = SmallRng::seed_from_u64(seed);
                queue.shuffle(&mut rng);
            }
        }

        queue
    }

    /// Runs the full placement loop. Returns `None` if `cancel` is observed
    /// between parts, matching the cooperative cancellation model (§5).
    pub fn run(&self, cancel: &AtomicBool) -> Option<Solution> {
        let queue = self.build_queue();
        let mut plates: Vec<Plate> = vec![Plate::new(self.plate_mode, self.precision)];

        for part in &queue {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }

            let current = plates.last_mut().expect("at least one plate always exists");
            if !self.place_on(current, part) {
                plates.push(Plate::new(self.plate_mode, self.precision));
                let fresh = plates.last_mut().unwrap();
                let placed = self.place_on(fresh, part);
                debug_assert!(
                    placed,
                    "a part that failed feasibility would have been rejected at load time"
                );
                if !placed {
                    return None;
                }
            }
        }

        Some(Solution::new(plates))
    }

    /// Attempts to place a single part on `plate`, trying rotations in the
    /// order `rotate_offset`/`rotate_direction` select, and committing the
    /// minimum-gravity candidate position of the first rotation that fits.
    fn place_on(&self, plate: &mut Plate, part: &Arc<Part>) -> bool {
        let r = part.rotations();
        for k in self.rotation_order(r) {
            let Some(bmp) = part.bmp(k) else { continue };

            let step = ((self.delta / self.precision).round() as i64).max(1);
            let max_x = plate.bitmap().width() as i64 - bmp.width() as i64;
            let max_y = plate.bitmap().height() as i64 - bmp.height() as i64;
            if max_x < 0 || max_y < 0 {
                continue;
            }

            let mut best: Option<(i64, i64, f64, f64)> = None;
            let mut y = 0;
            while y <= max_y {
                let mut x = 0;
                while x <= max_x {
                    if plate.shape_contains(bmp, x, y) && !plate.overlaps(bmp, x, y) {
                        let w = plate.bitmap().width() as f64;
                        let h = plate.bitmap().height() as f64;
                        let (primary, secondary) = gravity_score(self.strategy.gravity, x, y, w, h);
                        let better = match best {
                            None => true,
                            Some((_, _, bp, bs)) => (primary, secondary) < (bp, bs),
                        };
                        if better {
                            best = Some((x, y, primary, secondary));
                        }
                    }
                    x += step;
                }
                y += step;
            }

            if let Some((x, y, _, _)) = best {
                plate.place(part.clone(), k, x, y);
                return true;
            }
        }
        false
    }

    /// The order rotation indices `0..r` are tried in, starting at `0` or
    /// `r/2` and walking ascending or descending (wrapping modulo `r`).
    fn rotation_order(&self, r: usize) -> Vec<usize> {
        if r == 0 {
            return Vec::new();
        }
        let start = if self.strategy.rotate_offset { r / 2 } else { 0 };
        (0..r)
            .map(|i| {
                if self.strategy.rotate_direction {
                    (start + r - i % r) % r
                } else {
                    (start + i) % r
                }
            })
            .collect()
    }
}

/// `(primary, secondary)` gravity score; lower sorts first. `secondary` is
/// always `y`, which only changes ordering for `Eq` (the spec's explicit
/// tie-break) since `Yx`/`Xy` are already injective over valid positions.
fn gravity_score(gravity: Gravity, x: i64, y: i64, w: f64, h: f64) -> (f64, f64) {
    let (x, y) = (x as f64, y as f64);
    let primary = match gravity {
        Gravity::Yx => y * w + x,
        Gravity::Xy => x * h + y,
        Gravity::Eq => x + y,
    };
    (primary, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::RectModel;
    use std::f64::consts::PI;

    fn rect_plate() -> PlateMode {
        PlateMode::Rectangle { width: 150_000.0, height: 150_000.0 }
    }

    /// An asymmetric plate a 200x50mm part only fits on once rotated 90deg:
    /// see the erratum on spec scenario 3 in DESIGN.md's Open Questions.
    fn asymmetric_plate() -> PlateMode {
        PlateMode::Rectangle { width: 150_000.0, height: 250_000.0 }
    }

    fn make_part(w_mm: f64, h_mm: f64) -> Arc<Part> {
        let model = RectModel::new(w_mm * 1000.0, h_mm * 1000.0);
        Arc::new(
            Part::load("p.synth", &model, 500.0, PI / 2.0, 1500.0, "bottom", rect_plate()).unwrap(),
        )
    }

    #[test]
    fn single_square_fits_on_one_plate() {
        let part = make_part(50.0, 50.0);
        let parts = vec![(part, 1)];
        let strategy = Strategy {
            sort_mode: SortMode::SurfaceDec,
            gravity: Gravity::Yx,
            rotate_offset: false,
            rotate_direction: false,
        };
        let placer = Placer::new(strategy, &parts, rect_plate(), 500.0, 1000.0);
        let cancel = AtomicBool::new(false);
        let solution = placer.run(&cancel).unwrap();
        assert_eq!(solution.plate_count(), 1);
        assert_eq!(solution.plates()[0].instances().len(), 1);
    }

    #[test]
    fn four_squares_tile_one_plate_fifth_forces_second() {
        let part = make_part(70.0, 70.0);
        let strategy = Strategy {
            sort_mode: SortMode::SurfaceDec,
            gravity: Gravity::Yx,
            rotate_offset: false,
            rotate_direction: false,
        };

        let four = vec![(part.clone(), 4)];
        let placer = Placer::new(strategy, &four, rect_plate(), 500.0, 1000.0);
        let cancel = AtomicBool::new(false);
        let solution = placer.run(&cancel).unwrap();
        assert_eq!(solution.plate_count(), 1);
        assert_eq!(solution.plates()[0].instances().len(), 4);

        let five = vec![(part, 5)];
        let placer = Placer::new(strategy, &five, rect_plate(), 500.0, 1000.0);
        let solution = placer.run(&cancel).unwrap();
        assert_eq!(solution.plate_count(), 2);
    }

    #[test]
    fn oblong_part_places_rotated() {
        let model = RectModel::new(200_000.0, 50_000.0);
        let part = Arc::new(
            Part::load("bar.synth", &model, 500.0, PI / 2.0, 1500.0, "bottom", asymmetric_plate())
                .unwrap(),
        );
        let parts = vec![(part, 1)];
        let strategy = Strategy {
            sort_mode: SortMode::SurfaceDec,
            gravity: Gravity::Yx,
            rotate_offset: false,
            rotate_direction: false,
        };
        let placer = Placer::new(strategy, &parts, asymmetric_plate(), 500.0, 1000.0);
        let cancel = AtomicBool::new(false);
        let solution = placer.run(&cancel).unwrap();
        assert_eq!(solution.plate_count(), 1);
        assert_eq!(solution.plates()[0].instances()[0].rotation() % 2, 1);
    }

    #[test]
    fn cancelling_between_parts_returns_none() {
        let part = make_part(50.0, 50.0);
        let parts = vec![(part, 3)];
        let strategy = Strategy {
            sort_mode: SortMode::SurfaceDec,
            gravity: Gravity::Yx,
            rotate_offset: false,
            rotate_direction: false,
        };
        let placer = Placer::new(strategy, &parts, rect_plate(), 500.0, 1000.0);
        let cancel = AtomicBool::new(true);
        assert!(placer.run(&cancel).is_none());
    }

    #[test]
    fn rotation_order_offset_and_direction() {
        let strategy = Strategy {
            sort_mode: SortMode::SurfaceDec,
            gravity: Gravity::Yx,
            rotate_offset: true,
            rotate_direction: true,
        };
        let parts: Vec<(Arc<Part>, i32)> = Vec::new();
        let placer = Placer::new(strategy, &parts, rect_plate(), 500.0, 1000.0);
        let order = placer.rotation_order(4);
        assert_eq!(order[0], 2); // r/2 offset
        assert_eq!(order.len(), 4);
        // every index appears exactly once
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3]);
    }
}
