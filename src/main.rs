//! CLI entry point: parses a request file, runs the search engine, and
//! writes a placement manifest plus a human-readable summary.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use plater::plate_mode::PlateMode;
use plater::request::{RequestBuilder, SortMode};

/// Packs 3D-printable parts onto as few build plates as possible.
#[derive(Parser)]
#[command(name = "plater")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the request file (one `filename [quantity [orientation]]` per line).
    request: PathBuf,

    /// Output directory for the placement manifest and summary.
    #[arg(short, long, default_value = "out")]
    output_dir: PathBuf,

    /// Plate width in millimetres (rectangular plates only).
    #[arg(long, default_value_t = plater::request::DEFAULT_PLATE_WIDTH_MM)]
    plate_width: f64,

    /// Plate height in millimetres (rectangular plates only).
    #[arg(long, default_value_t = plater::request::DEFAULT_PLATE_HEIGHT_MM)]
    plate_height: f64,

    /// Use a circular plate of this diameter in millimetres instead of a
    /// rectangle.
    #[arg(long)]
    plate_diameter: Option<f64>,

    /// Rasterisation precision, in microns per pixel.
    #[arg(long, default_value_t = plater::request::DEFAULT_PRECISION)]
    precision: f64,

    /// Spacing margin baked around every part, in microns.
    #[arg(long, default_value_t = plater::request::DEFAULT_SPACING)]
    spacing: f64,

    /// Rotation granularity in radians.
    #[arg(long, default_value_t = plater::request::DEFAULT_DELTA_THETA)]
    delta_theta: f64,

    /// Candidate-position scan step, in microns.
    #[arg(long, default_value_t = plater::request::DEFAULT_DELTA)]
    delta: f64,

    /// Number of concurrent Placer workers.
    #[arg(long, default_value_t = plater::request::DEFAULT_NB_THREADS)]
    nb_threads: usize,

    /// Number of SHUFFLE+n strategies tried per search (multi-sort only).
    #[arg(long, default_value_t = plater::request::DEFAULT_RANDOM_ITERATIONS)]
    random_iterations: usize,

    /// Try only the SURFACE_DEC sort instead of the full multi-strategy search.
    #[arg(long)]
    single_sort: bool,

    /// File-name pattern plate output would use, e.g. `plate_%03d`.
    #[arg(long, default_value_t = plater::request::DEFAULT_PATTERN.to_string())]
    pattern: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let plate_mode = match cli.plate_diameter {
        Some(diameter) => PlateMode::Circle { diameter: diameter * 1000.0 },
        None => PlateMode::Rectangle {
            width: cli.plate_width * 1000.0,
            height: cli.plate_height * 1000.0,
        },
    };
    log::info!(
        "processing request {} (plate {:?}, precision {} um)",
        cli.request.display(),
        plate_mode,
        cli.precision
    );

    let sort_mode = if cli.single_sort { SortMode::SingleSort } else { SortMode::MultipleSort };

    let file = File::open(&cli.request)
        .with_context(|| format!("opening request file {}", cli.request.display()))?;
    let request = RequestBuilder::default()
        .plate_mode(plate_mode)
        .precision(cli.precision)
        .delta_theta(cli.delta_theta)
        .spacing(cli.spacing)
        .delta(cli.delta)
        .nb_threads(cli.nb_threads)
        .random_iterations(cli.random_iterations)
        .sort_mode(sort_mode)
        .build_from_reader(BufReader::new(file))
        .context("parsing request file")?;

    let engine = plater::SearchEngine::new(Arc::new(request));
    let cancel = Arc::new(AtomicBool::new(false));
    let result = engine.run(cancel);

    let Some(solution) = result.solution else {
        log::warn!("no solution found (cancelled: {})", result.cancelled);
        println!("No solution found.");
        return Ok(());
    };

    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("creating output directory {}", cli.output_dir.display()))?;
    write_manifest(&cli.output_dir, &solution)?;
    write_summary(&cli.output_dir, &solution)?;

    for (i, _) in solution.plates().iter().enumerate() {
        let name = cli.pattern.replace("%03d", &format!("{:03}", i + 1));
        log::info!("would write plate mesh {name}.stl (mesh serialisation out of scope)");
    }

    println!(
        "Wrote {} plate(s) (score {:.3}) to {}",
        solution.plate_count(),
        solution.score(),
        cli.output_dir.display()
    );

    Ok(())
}

fn write_manifest(dir: &std::path::Path, solution: &plater::Solution) -> Result<()> {
    let path = dir.join("plates.csv");
    let mut out = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    out.write_all(render_manifest(solution).as_bytes())?;
    Ok(())
}

fn write_summary(dir: &std::path::Path, solution: &plater::Solution) -> Result<()> {
    let path = dir.join("summary.txt");
    let mut out = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    out.write_all(render_summary(solution).as_bytes())?;
    Ok(())
}

/// Renders the `plates.csv` manifest body (§6): one row per PartInstance,
/// 1-based plate index.
fn render_manifest(solution: &plater::Solution) -> String {
    let mut out = String::from("plate,part,posX(mm),posY(mm),rotation(deg)\n");
    for (plate_idx, plate) in solution.plates().iter().enumerate() {
        for instance in plate.instances() {
            let (cx, cy) = instance.center_microns();
            let degrees = instance.angle().to_degrees();
            out.push_str(&format!(
                "{},{},{:.3},{:.3},{:.3}\n",
                plate_idx + 1,
                instance.part().filename(),
                cx / 1000.0,
                cy / 1000.0,
                degrees
            ));
        }
    }
    out
}

/// Renders the human-readable plate-count/score/per-plate-count summary.
fn render_summary(solution: &plater::Solution) -> String {
    let mut out = format!(
        "plates: {}\nscore: {:.3}\n",
        solution.plate_count(),
        solution.score()
    );
    for (plate_idx, plate) in solution.plates().iter().enumerate() {
        out.push_str(&format!("plate {}: {} part(s)\n", plate_idx + 1, plate.instances().len()));
    }
    out
}
