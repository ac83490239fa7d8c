//! Strategy enumeration and the bounded worker pool that races Placers
//! against each other, keeping the lowest-scoring Solution.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, RecvTimeoutError};

use crate::placer::{Gravity, Placer, SortMode as PlacerSortMode, Strategy};
use crate::request::{Request, SortMode as RequestSortMode};
use crate::solution::Solution;

const RESULT_POLL: Duration = Duration::from_millis(150);

/// Result of a full search: the best Solution found (if any) and whether
/// the search was cancelled before every strategy had been tried.
pub struct SearchResult {
    pub solution: Option<Solution>,
    pub cancelled: bool,
}

/// Generates strategy tuples, dispatches Placers to a bounded worker pool,
/// and keeps the minimum-score Solution (§4.4).
pub struct SearchEngine {
    request: Arc<Request>,
}

impl SearchEngine {
    pub fn new(request: Arc<Request>) -> Self {
        SearchEngine { request }
    }

    /// Runs every strategy the request's sort mode admits, stopping early
    /// if a one-plate Solution turns up, or if `cancel` is set.
    pub fn run(&self, cancel: Arc<AtomicBool>) -> SearchResult {
        let strategies = enumerate_strategies(&self.request);
        log::info!(
            "processing request: {} strategies, {} worker(s)",
            strategies.len(),
            self.request.nb_threads
        );

        let (work_tx, work_rx) = unbounded::<Strategy>();
        let (result_tx, result_rx) = bounded::<Option<Solution>>(strategies.len().max(1));

        for strategy in &strategies {
            work_tx.send(*strategy).expect("work channel receiver outlives senders");
        }
        drop(work_tx);

        let stop = Arc::new(AtomicBool::new(false));
        let nb_threads = self.request.nb_threads.max(1);
        let mut handles = Vec::with_capacity(nb_threads);

        for worker_id in 0..nb_threads {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            let request = self.request.clone();
            let cancel = cancel.clone();
            let stop = stop.clone();

            handles.push(std::thread::spawn(move || {
                while let Ok(strategy) = work_rx.recv() {
                    if cancel.load(Ordering::Relaxed) || stop.load(Ordering::Relaxed) {
                        let _ = result_tx.send(None);
                        continue;
                    }

                    let placer = Placer::new(
                        strategy,
                        &request.parts,
                        request.plate_mode,
                        request.precision,
                        request.delta,
                    );
                    let solution = placer.run(&cancel);
                    log::debug!(
                        "worker {worker_id} finished strategy {strategy:?} -> {:?} plate(s)",
                        solution.as_ref().map(Solution::plate_count)
                    );
                    let _ = result_tx.send(solution);
                }
            }));
        }
        drop(result_tx);

        let mut best: Option<Solution> = None;
        let mut received = 0usize;
        let total = strategies.len();

        while received < total {
            match result_rx.recv_timeout(RESULT_POLL) {
                Ok(Some(solution)) => {
                    received += 1;
                    if solution.plate_count() == 1 {
                        stop.store(true, Ordering::Relaxed);
                    }
                    best = pick_better(best, solution);
                }
                Ok(None) => {
                    received += 1;
                }
                Err(RecvTimeoutError::Timeout) => {
                    if cancel.load(Ordering::Relaxed) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        for handle in handles {
            let _ = handle.join();
        }

        if let Some(ref solution) = best {
            log::info!(
                "best solution: {} plate(s), score {:.3}",
                solution.plate_count(),
                solution.score()
            );
        } else {
            log::warn!("search produced no solution");
        }

        SearchResult { solution: best, cancelled: cancel.load(Ordering::Relaxed) }
    }
}

fn pick_better(best: Option<Solution>, candidate: Solution) -> Option<Solution> {
    match best {
        None => Some(candidate),
        Some(current) => {
            if candidate.score() < current.score() {
                Some(candidate)
            } else {
                Some(current)
            }
        }
    }
}

/// Builds the full Cartesian product of strategy axes per §4.4. `gravity`
/// only ranges over `{Yx, Xy}`: the source's enumeration loop excludes the
/// last gravity value (`gravity < PLACER_GRAVITY_EQ`), and this crate
/// reproduces that quirk rather than silently fixing it.
fn enumerate_strategies(request: &Request) -> Vec<Strategy> {
    let sort_modes: Vec<PlacerSortMode> = match request.sort_mode {
        RequestSortMode::SingleSort => vec![PlacerSortMode::SurfaceDec],
        RequestSortMode::MultipleSort => {
            let mut modes = vec![
                PlacerSortMode::SurfaceDec,
                PlacerSortMode::SurfaceInc,
                PlacerSortMode::HeightDec,
                PlacerSortMode::HeightInc,
                PlacerSortMode::WidthDec,
                PlacerSortMode::WidthInc,
                PlacerSortMode::DensityInc,
                PlacerSortMode::DensityDec,
            ];
            for n in 0..request.random_iterations {
                modes.push(PlacerSortMode::Shuffle(n as u64));
            }
            modes
        }
    };

    let gravities = [Gravity::Yx, Gravity::Xy];
    let mut strategies = Vec::new();
    for &sort_mode in &sort_modes {
        for &gravity in &gravities {
            for &rotate_offset in &[false, true] {
                for &rotate_direction in &[false, true] {
                    strategies.push(Strategy { sort_mode, gravity, rotate_offset, rotate_direction });
                }
            }
        }
    }
    strategies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::RectModel;
    use crate::part::Part;
    use crate::plate_mode::PlateMode;
    use crate::request::RequestBuilder;
    use std::f64::consts::PI;
    use std::sync::Arc;

    fn rect_plate() -> PlateMode {
        PlateMode::Rectangle { width: 150_000.0, height: 150_000.0 }
    }

    #[test]
    fn single_sort_enumerates_one_sort_mode() {
        let text = "50000x50000.synth 1\n";
        let request = RequestBuilder::default()
            .sort_mode(RequestSortMode::SingleSort)
            .build_from_reader(text.as_bytes())
            .unwrap();
        let strategies = enumerate_strategies(&request);
        // 1 sort * 2 gravity * 2 offset * 2 direction
        assert_eq!(strategies.len(), 8);
    }

    #[test]
    fn multiple_sort_enumerates_full_product() {
        let text = "50000x50000.synth 1\n";
        let request = RequestBuilder::default()
            .sort_mode(RequestSortMode::MultipleSort)
            .random_iterations(3)
            .build_from_reader(text.as_bytes())
            .unwrap();
        let strategies = enumerate_strategies(&request);
        // (8 fixed + 3 shuffle) * 2 gravity * 2 offset * 2 direction
        assert_eq!(strategies.len(), 11 * 8);
    }

    #[test]
    fn run_finds_single_plate_for_one_small_part() {
        let text = "50000x50000.synth 1\n";
        let request = Arc::new(
            RequestBuilder::default()
                .nb_threads(2)
                .build_from_reader(text.as_bytes())
                .unwrap(),
        );
        let engine = SearchEngine::new(request);
        let result = engine.run(Arc::new(AtomicBool::new(false)));
        let solution = result.solution.unwrap();
        assert_eq!(solution.plate_count(), 1);
        assert!(!result.cancelled);
    }

    #[test]
    fn run_with_preset_cancel_returns_no_solution_guarantee() {
        let text = "50000x50000.synth 1\n";
        let request = Arc::new(
            RequestBuilder::default()
                .build_from_reader(text.as_bytes())
                .unwrap(),
        );
        let engine = SearchEngine::new(request);
        let cancel = Arc::new(AtomicBool::new(true));
        let result = engine.run(cancel);
        assert!(result.cancelled);
        // every strategy saw the flag already set, so none produce a Solution
        assert!(result.solution.is_none());
    }

    #[test]
    fn ten_small_parts_multi_sort_beats_or_matches_single_sort() {
        let model = RectModel::new(20_000.0, 20_000.0);
        let part = Arc::new(
            Part::load("p.synth", &model, 500.0, PI / 2.0, 1500.0, "bottom", rect_plate()).unwrap(),
        );

        let single = Arc::new(Request {
            plate_mode: rect_plate(),
            precision: 500.0,
            delta_theta: PI / 2.0,
            spacing: 1500.0,
            delta: 1000.0,
            nb_threads: 4,
            random_iterations: 3,
            sort_mode: RequestSortMode::SingleSort,
            parts: vec![(part.clone(), 10)],
        });
        let multi = Arc::new(Request {
            plate_mode: rect_plate(),
            precision: 500.0,
            delta_theta: PI / 2.0,
            spacing: 1500.0,
            delta: 1000.0,
            nb_threads: 4,
            random_iterations: 3,
            sort_mode: RequestSortMode::MultipleSort,
            parts: vec![(part, 10)],
        });

        let single_score = SearchEngine::new(single)
            .run(Arc::new(AtomicBool::new(false)))
            .solution
            .unwrap()
            .score();
        let multi_score = SearchEngine::new(multi)
            .run(Arc::new(AtomicBool::new(false)))
            .solution
            .unwrap()
            .score();
        assert!(multi_score <= single_score);
    }
}
