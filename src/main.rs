//! CLI for computing the radical Voronoi tessellation of balls read from XYZR.

#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::{ArgAction, Parser, ValueEnum};
use log::info;
use radtess::input::{read_groups_file, read_xyzr, read_xyzr_file};
use radtess::{
    PeriodicBox, TessellationParameters, TessellationResult, TessellationSummary,
    compute_tessellation,
};
use serde::Serialize;

/// Extended JSON output including per-ball SASA/volumes and totals
#[derive(Serialize)]
struct JsonOutput {
    #[serde(flatten)]
    result: TessellationResult,
    sas_areas: Vec<f64>,
    volumes: Vec<f64>,
    summary: TessellationSummary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Full result as pretty JSON
    Json,
    /// `key: value` totals
    Summary,
    /// One `index_a index_b area arc_length` line per contact
    Contacts,
    /// One `index sas_area volume` line per cell
    Cells,
}

#[derive(Parser)]
#[command(name = "radtess")]
#[command(about = "Compute radical Voronoi tessellation of balls")]
#[command(
    long_about = "Constructs a radical Voronoi tessellation of balls \
    constrained inside a solvent-accessible surface defined by a rolling probe. \
    Computes inter-ball contact areas, solvent accessible surface areas, and volumes.\n\n\
    Input is XYZR text (.xyzr): the last four numeric columns of each line are x y z r."
)]
struct Cli {
    /// Rolling probe radius
    #[arg(long, default_value_t = 1.4)]
    probe: f64,

    /// Input XYZR file. Reads from stdin if not specified
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file. Writes to stdout if not specified
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Periodic box corners: x1 y1 z1 x2 y2 z2
    #[arg(
        long,
        num_args = 6,
        allow_negative_numbers = true,
        value_names = ["X1", "Y1", "Z1", "X2", "Y2", "Z2"]
    )]
    periodic_box_corners: Option<Vec<f64>>,

    /// File with one integer group id per ball; only contacts between
    /// different groups are reported
    #[arg(long, value_name = "FILE")]
    groups: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Increase verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Reduce verbosity to warnings only
    #[arg(short, long)]
    quiet: bool,

    /// Maximum number of threads to use (default: all available)
    #[arg(long)]
    processors: Option<usize>,

    /// Measure and log running time
    #[arg(long)]
    measure_running_time: bool,
}

fn write_summary(out: &mut impl Write, s: &TessellationSummary) -> io::Result<()> {
    writeln!(out, "balls: {}", s.balls)?;
    writeln!(out, "contacts: {}", s.contacts)?;
    writeln!(out, "cells: {}", s.balls)?;
    writeln!(out, "included_cells: {}", s.included_cells)?;
    writeln!(out, "hidden_cells: {}", s.hidden_cells)?;
    writeln!(out, "inconsistent_cells: {}", s.inconsistent_cells)?;
    writeln!(out, "total_contact_area: {:.6}", s.total_contact_area)?;
    writeln!(out, "total_arc_length: {:.6}", s.total_arc_length)?;
    writeln!(out, "total_sas_area: {:.6}", s.total_sas_area)?;
    writeln!(out, "total_volume: {:.6}", s.total_volume)
}

fn write_result(out: &mut impl Write, format: OutputFormat, result: TessellationResult) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let output = JsonOutput {
                sas_areas: result.sas_areas(),
                volumes: result.volumes(),
                summary: result.summary(),
                result,
            };
            serde_json::to_writer_pretty(&mut *out, &output)?;
            writeln!(out)
        }
        OutputFormat::Summary => write_summary(out, &result.summary()),
        OutputFormat::Contacts => {
            for c in &result.contacts {
                writeln!(out, "{} {} {:.6} {:.6}", c.index_a, c.index_b, c.area, c.arc_length)?;
            }
            Ok(())
        }
        OutputFormat::Cells => {
            for c in &result.cells {
                writeln!(out, "{} {:.6} {:.6}", c.index, c.sas_area, c.volume)?;
            }
            Ok(())
        }
    }
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Configure thread pool if --processors specified
    if let Some(num_threads) = cli.processors {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(io::Error::other)?;
        info!("Using {num_threads} threads");
    }

    let balls = match &cli.input {
        Some(path) => read_xyzr_file(path)?,
        None => read_xyzr(io::stdin().lock())?,
    };
    info!("Read {} balls", balls.len());

    let mut params = TessellationParameters::new(cli.probe);
    if let Some(c) = cli.periodic_box_corners.as_deref()
        && let [x1, y1, z1, x2, y2, z2] = *c
    {
        params = params.with_periodic_box(PeriodicBox::from_corners((x1, y1, z1), (x2, y2, z2)));
    }

    if let Some(path) = &cli.groups {
        params = params.with_grouping(read_groups_file(path)?);
        info!("Reporting inter-group contacts only");
    }

    let start = Instant::now();
    let result = compute_tessellation(&balls, &params)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let elapsed = start.elapsed();

    info!(
        "Computed {} contacts, {} cells",
        result.contacts.len(),
        result.cells.len()
    );
    if cli.measure_running_time {
        info!("Tessellation time: {} ms", elapsed.as_millis());
    }

    if let Some(path) = &cli.output {
        let mut file = BufWriter::new(File::create(path)?);
        write_result(&mut file, cli.format, result)?;
        file.flush()
    } else {
        let mut stdout = io::stdout().lock();
        write_result(&mut stdout, cli.format, result)
    }
}
