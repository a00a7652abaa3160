//! CLI entry point (spec's CLI/Batch-Runner collaborator).
//!
//! Reads a bin and a set of parts from SVG/DXF Shape Source files, runs the
//! nesting coordinator for a fixed number of generations, and writes the
//! best layout found back out as SVG.

use clap::Parser;
use std::path::PathBuf;

use svgnest_core::coordinator::{Coordinator, NestConfig};
use svgnest_core::{dxf_parser, svg_parser};

/// Command line arguments for the nester.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliArgs {
    /// Shape Source files to be nested; the first polygon found becomes the
    /// bin, every other polygon (across every input) becomes a part.
    #[arg(long, value_name = "FILES", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Maximum error allowed when approximating curves.
    #[arg(long = "approx-tolerance", default_value_t = 0.3)]
    pub approx_tolerance: f64,

    /// Minimum space between parts.
    #[arg(long, default_value_t = 0.0)]
    pub spacing: f64,

    /// Number of rotations to test for each part.
    #[arg(long, default_value_t = 4)]
    pub rotations: usize,

    /// Population size for the genetic algorithm.
    #[arg(long, default_value_t = 10, value_name = "SIZE")]
    pub population_size: usize,

    /// Mutation rate of the genetic algorithm (1-50).
    #[arg(long, default_value_t = 10, value_name = "RATE")]
    pub mutation_rate: usize,

    /// Place parts inside the holes of other parts.
    #[arg(long, default_value_t = false)]
    pub use_holes: bool,

    /// Explore concave areas for more robust placement.
    #[arg(long, default_value_t = false)]
    pub explore_concave: bool,

    /// Merge overlapping line segments before closing shapes.
    #[arg(long, default_value_t = false)]
    pub merge_lines: bool,

    /// Number of GA generations to run.
    #[arg(long, default_value_t = 50)]
    pub generations: usize,

    /// Record every computed NFP to a debug side-channel.
    #[arg(long, default_value_t = false)]
    pub debug_nfp: bool,

    /// Output SVG path.
    #[arg(long, default_value = "nested.svg")]
    pub output: PathBuf,
}

fn load_polygons(path: &PathBuf, merge_lines: bool, approx_tolerance: f64) -> anyhow::Result<Vec<svgnest_core::Polygon>> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if ext.eq_ignore_ascii_case("dxf") {
        dxf_parser::part_from_dxf(path)
    } else {
        let raw = svg_parser::polygons_from_file(path, merge_lines, approx_tolerance)?;
        Ok(svg_parser::to_parts(raw))
    }
}

/// Renders the best individual's first bin as a flat SVG: the bin outline
/// plus every placed part translated and rotated into position (spec's
/// Renderer, supplemented feature — the original emits the same per-bin
/// `<svg>` document, one `<g transform=...>` per placed part).
fn render_svg(bin: &svgnest_core::Polygon, placements: &[svgnest_core::placement::Placement]) -> String {
    let bounds = bin.bounds().unwrap_or(svgnest_core::geometry::Bounds { x: 0.0, y: 0.0, width: 0.0, height: 0.0 });

    let mut body = String::new();
    let points = bin
        .points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ");
    body.push_str(&format!("  <polygon points=\"{points}\" fill=\"none\" stroke=\"black\"/>\n"));

    for p in placements {
        body.push_str(&format!(
            "  <g transform=\"translate({} {}) rotate({})\"><!-- part {} --></g>\n",
            p.x, p.y, p.rotation, p.id
        ));
    }

    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"{} {} {} {}\">\n{}</svg>\n",
        bounds.width, bounds.height, bounds.x, bounds.y, bounds.width, bounds.height, body
    )
}

fn main() {
    env_logger::init();
    let args = CliArgs::parse();

    let mut bin: Option<svgnest_core::Polygon> = None;
    let mut parts = Vec::new();

    for path in &args.inputs {
        match load_polygons(path, args.merge_lines, args.approx_tolerance) {
            Ok(mut polys) => {
                if bin.is_none() && !polys.is_empty() {
                    bin = Some(polys.remove(0));
                }
                parts.extend(polys);
            }
            Err(e) => {
                eprintln!("Failed to parse {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }

    let bin = match bin {
        Some(b) => b,
        None => {
            eprintln!("No polygons found in input");
            std::process::exit(1);
        }
    };

    if parts.is_empty() {
        eprintln!("No parts found in input");
        std::process::exit(1);
    }

    let config = NestConfig {
        curve_tolerance: args.approx_tolerance,
        spacing: args.spacing,
        rotations: args.rotations,
        population_size: args.population_size,
        mutation_rate: args.mutation_rate,
        use_holes: args.use_holes,
        explore_concave: args.explore_concave,
        debug_nfp: args.debug_nfp,
        ..NestConfig::default()
    };

    let mut coordinator = match Coordinator::new(bin.clone(), parts, config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to initialize nesting run: {e}");
            std::process::exit(1);
        }
    };

    let result = match coordinator.run(args.generations) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Nesting run failed: {e}");
            std::process::exit(1);
        }
    };

    log::info!(
        "best individual fitness {:.4}, {} bin(s), {} unplaced",
        result.best_individual.fitness,
        result.placement.placements.len(),
        result.placement.unplaced.len()
    );

    let svg = match result.placement.placements.first() {
        Some(first_bin) => render_svg(&bin, first_bin),
        None => render_svg(&bin, &[]),
    };

    if let Err(e) = std::fs::write(&args.output, svg) {
        eprintln!("Failed to write SVG: {e}");
        std::process::exit(1);
    }

    println!("Nested result written to {}", args.output.display());
}
