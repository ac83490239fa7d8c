//! Request parsing and defaults (§6 of the design: the textual request
//! format, plate-mode encoding, and the default constants table).

use std::f64::consts::PI;
use std::io::BufRead;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::PlaterError;
use crate::mesh;
use crate::part::Part;
use crate::plate_mode::PlateMode;

/// Which sort axis the SearchEngine explores (§4.4).
#[derive(Clone, Copy, Debug)]
pub enum SortMode {
    SingleSort,
    MultipleSort,
}

/// One `filename quantity orientation` line from a request file.
#[derive(Clone, Debug, PartialEq)]
pub struct PartSpec {
    pub filename: String,
    pub quantity: i32,
    pub orientation: String,
}

/// Immutable input to the placement core.
pub struct Request {
    pub plate_mode: PlateMode,
    pub precision: f64,
    pub delta_theta: f64,
    pub spacing: f64,
    pub delta: f64,
    pub nb_threads: usize,
    pub random_iterations: usize,
    pub sort_mode: SortMode,
    /// Loaded parts and their requested quantities, in request order.
    pub parts: Vec<(Arc<Part>, i32)>,
}

/// Default constants (§6).
pub const DEFAULT_PRECISION: f64 = 500.0;
pub const DEFAULT_SPACING: f64 = 1500.0;
pub const DEFAULT_DELTA_THETA: f64 = PI / 2.0;
pub const DEFAULT_DELTA: f64 = 1000.0;
pub const DEFAULT_PLATE_WIDTH_MM: f64 = 150.0;
pub const DEFAULT_PLATE_HEIGHT_MM: f64 = 150.0;
pub const DEFAULT_RANDOM_ITERATIONS: usize = 3;
pub const DEFAULT_NB_THREADS: usize = 1;
pub const DEFAULT_PATTERN: &str = "plate_%03d";

/// Builder-style configuration mirrored from the CLI / request-file layer.
/// `sort_mode` defaults to `MultipleSort`: the source left `Request`'s
/// sort-mode field uninitialised in its constructor, and the non-trivial
/// (multi-strategy) path is the useful default for an implementer to pick.
pub struct RequestBuilder {
    plate_mode: PlateMode,
    precision: f64,
    delta_theta: f64,
    spacing: f64,
    delta: f64,
    nb_threads: usize,
    random_iterations: usize,
    sort_mode: SortMode,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        RequestBuilder {
            plate_mode: PlateMode::Rectangle {
                width: DEFAULT_PLATE_WIDTH_MM * 1000.0,
                height: DEFAULT_PLATE_HEIGHT_MM * 1000.0,
            },
            precision: DEFAULT_PRECISION,
            delta_theta: DEFAULT_DELTA_THETA,
            spacing: DEFAULT_SPACING,
            delta: DEFAULT_DELTA,
            nb_threads: DEFAULT_NB_THREADS,
            random_iterations: DEFAULT_RANDOM_ITERATIONS,
            sort_mode: SortMode::MultipleSort,
        }
    }
}

impl RequestBuilder {
    pub fn plate_mode(mut self, plate_mode: PlateMode) -> Self {
        self.plate_mode = plate_mode;
        self
    }

    pub fn precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }

    pub fn delta_theta(mut self, delta_theta: f64) -> Self {
        self.delta_theta = delta_theta;
        self
    }

    pub fn spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    pub fn nb_threads(mut self, nb_threads: usize) -> Self {
        self.nb_threads = nb_threads;
        self
    }

    pub fn random_iterations(mut self, random_iterations: usize) -> Self {
        self.random_iterations = random_iterations;
        self
    }

    pub fn sort_mode(mut self, sort_mode: SortMode) -> Self {
        self.sort_mode = sort_mode;
        self
    }

    /// Parses a request-file reader (§6) and loads every referenced part
    /// with the synthetic mesh source, returning the first `PartInfeasible`
    /// encountered (fatal, no search is attempted) or `Io` on a read error.
    pub fn build_from_reader<R: BufRead>(self, reader: R) -> Result<Request, PlaterError> {
        let mut parts: Vec<(Arc<Part>, i32)> = Vec::new();
        // Mirrors the source's `map<string, Part*> parts`: a filename that
        // reappears replaces the earlier entry rather than duplicating it.
        let mut index_by_filename: FxHashMap<String, usize> = FxHashMap::default();

        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some(spec) = parse_line(trimmed) else { continue };
            if spec.filename.is_empty() || spec.quantity == 0 {
                continue;
            }

            log::info!(
                "- Loading {} (quantity {}, orientation {})...",
                spec.filename,
                spec.quantity,
                spec.orientation
            );

            let model = mesh::load(&spec.filename)?;
            let part = Part::load(
                &spec.filename,
                &model,
                self.precision,
                self.delta_theta,
                self.spacing,
                &spec.orientation,
                self.plate_mode,
            )?;

            let entry = (Arc::new(part), spec.quantity);
            if let Some(&idx) = index_by_filename.get(&spec.filename) {
                parts[idx] = entry;
            } else {
                index_by_filename.insert(spec.filename.clone(), parts.len());
                parts.push(entry);
            }
        }

        Ok(Request {
            plate_mode: self.plate_mode,
            precision: self.precision,
            delta_theta: self.delta_theta,
            spacing: self.spacing,
            delta: self.delta,
            nb_threads: self.nb_threads,
            random_iterations: self.random_iterations,
            sort_mode: self.sort_mode,
            parts,
        })
    }
}

/// Splits a request line into `(filename, quantity, orientation)`.
///
/// A blank line (or one with no tokens) is ignored, matching the source's
/// behaviour of quietly producing nothing useful for `n < 1`. A quoted
/// filename (`"my part.stl" 4 bottom`) is parsed exactly; otherwise falls
/// back to the fragile "rightmost numeric token" heuristic so that
/// space-containing bare filenames still work.
fn parse_line(line: &str) -> Option<PartSpec> {
    if let Some(rest) = line.strip_prefix('"') {
        let end = rest.find('"')?;
        let filename = rest[..end].to_string();
        let tail: Vec<&str> = rest[end + 1..].split_whitespace().collect();
        let quantity = tail.first().and_then(|t| t.parse().ok()).unwrap_or(1);
        let orientation = tail.get(1).map(|s| s.to_string()).unwrap_or_else(|| "bottom".to_string());
        return Some(PartSpec { filename, quantity, orientation });
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    // Rightmost numeric token marks where the filename ends; if none of the
    // tokens are numeric the whole line is the filename.
    let numeric_idx = (1..tokens.len()).rev().find(|&i| is_numeric(tokens[i]));
    let name_end = numeric_idx.unwrap_or(tokens.len());

    let filename = tokens[..name_end].join(" ");
    let quantity = tokens.get(name_end).and_then(|t| t.parse().ok()).unwrap_or(1);
    let orientation = tokens.get(name_end + 1).map(|s| s.to_string()).unwrap_or_else(|| "bottom".to_string());

    Some(PartSpec { filename, quantity, orientation })
}

fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_line_handles_plain_filename_with_quantity() {
        let spec = parse_line("50000x50000.synth 4").unwrap();
        assert_eq!(spec.filename, "50000x50000.synth");
        assert_eq!(spec.quantity, 4);
        assert_eq!(spec.orientation, "bottom");
    }

    #[test]
    fn parse_line_handles_orientation() {
        let spec = parse_line("50000x50000.synth 4 top").unwrap();
        assert_eq!(spec.quantity, 4);
        assert_eq!(spec.orientation, "top");
    }

    #[test]
    fn parse_line_defaults_quantity_to_one() {
        let spec = parse_line("50000x50000.synth").unwrap();
        assert_eq!(spec.quantity, 1);
    }

    #[test]
    fn parse_line_handles_quoted_filename_with_spaces() {
        let spec = parse_line("\"my part 50000x50000.synth\" 2 bottom").unwrap();
        assert_eq!(spec.filename, "my part 50000x50000.synth");
        assert_eq!(spec.quantity, 2);
    }

    #[test]
    fn parse_line_heuristic_splits_bare_filename_with_spaces() {
        let spec = parse_line("my part 50000x50000.synth 3").unwrap();
        assert_eq!(spec.filename, "my part 50000x50000.synth");
        assert_eq!(spec.quantity, 3);
    }

    #[test]
    fn build_from_reader_skips_comments_and_blank_lines() {
        let text = "# a comment\n\n50000x50000.synth 1\n";
        let request = RequestBuilder::default()
            .build_from_reader(text.as_bytes())
            .unwrap();
        assert_eq!(request.parts.len(), 1);
    }

    #[test]
    fn build_from_reader_reports_part_infeasible() {
        let text = "200000x200000.synth 1\n";
        let err = RequestBuilder::default()
            .build_from_reader(text.as_bytes())
            .unwrap_err();
        match err {
            PlaterError::PartInfeasible { .. } => {}
            other => panic!("expected PartInfeasible, got {other:?}"),
        }
    }
}
