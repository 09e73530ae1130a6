mod report;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use flate2::read::GzDecoder;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use report::Report;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use ukeire::calc::{CalcConfig, Orchestrator, SequentialExecutor, Status};
use ukeire::hand::parse_tiles;
use ukeire::tile::Tile;
use ukeire::wall::Wall;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Shanten and tile acceptance for riichi mahjong hands.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one hand of up to 14 tiles, e.g. `445m123456p789s11z`.
    Analyze {
        hand: String,
        /// Tiles visible outside the hand, removed from the wall.
        #[arg(long)]
        seen: Option<String>,
        /// Worker threads, 0 for one per core.
        #[arg(long, default_value_t = 0)]
        threads: usize,
        /// Run every unit of work on the main thread.
        #[arg(long)]
        sequential: bool,
        #[arg(long)]
        json: bool,
    },
    /// Analyze every `<HAND> [<SEEN>]` line of a file, optionally gzipped.
    Batch {
        file: PathBuf,
        #[arg(long, default_value_t = 0)]
        threads: usize,
        #[arg(long)]
        json: bool,
    },
}

/// Hand plus the wall it draws from.
fn load_position(hand: &str, seen: Option<&str>) -> Result<(Vec<Tile>, Wall)> {
    let tiles = parse_tiles(hand).with_context(|| format!("invalid hand {hand}"))?;
    let mut wall = Wall::from_hand(&tiles);
    if let Some(seen) = seen {
        let seen = parse_tiles(seen).with_context(|| format!("invalid seen tiles {seen}"))?;
        wall.witness_all(&seen)
            .with_context(|| format!("seen tiles conflict with hand {hand}"))?;
    }
    Ok((tiles, wall))
}

fn analyze(hand: &str, seen: Option<&str>, config: &CalcConfig, json: bool) -> Result<()> {
    let (tiles, wall) = load_position(hand, seen)?;
    let mut orch = Orchestrator::from_config(config)?;

    if orch.submit(&tiles, &wall)? == Status::Loading {
        let spinner = ProgressBar::new_spinner().with_message("calculating acceptance");
        spinner.enable_steady_tick(Duration::from_millis(80));
        orch.wait()?;
        spinner.finish_and_clear();
    }
    let result = orch.result().context("no result after calculation")?;
    let report = Report::new(result.clone());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.to_log_string());
    }
    Ok(())
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let inner = || -> Result<String> {
        let file = File::open(path)?;
        let raw = if path.extension().is_some_and(|ext| ext == "gz") {
            io::read_to_string(GzDecoder::new(file))?
        } else {
            io::read_to_string(file)?
        };
        Ok(raw)
    };
    let raw = inner().with_context(|| format!("error when reading {}", path.display()))?;

    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect())
}

fn analyze_line(line: &str) -> Result<Report> {
    let mut parts = line.split_whitespace();
    let (Some(hand), seen, None) = (parts.next(), parts.next(), parts.next()) else {
        bail!("expected `<HAND> [<SEEN>]`, got {line:?}");
    };
    let (tiles, wall) = load_position(hand, seen)?;

    // already on a rayon worker, so run the units in place
    let mut orch = Orchestrator::new(Box::new(SequentialExecutor::default()));
    orch.submit(&tiles, &wall)?;
    orch.wait()?;
    let result = orch.result().context("no result after calculation")?;
    Ok(Report::new(result.clone()))
}

fn batch(path: &Path, threads: usize, json: bool) -> Result<()> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .context("failed to build global thread pool")?;

    let lines = read_lines(path)?;
    log::info!("{} positions in {}", lines.len(), path.display());

    let bar = ProgressBar::new(lines.len() as u64).with_style(ProgressStyle::with_template(
        "{elapsed_precise} [{bar:40}] {pos}/{len} {per_sec}",
    )?);
    let reports = lines
        .par_iter()
        .progress_with(bar)
        .map(|line| analyze_line(line).with_context(|| format!("error when analyzing {line:?}")))
        .collect::<Result<Vec<_>>>()?;

    for report in &reports {
        if json {
            println!("{}", serde_json::to_string(report)?);
        } else {
            println!("{}\n", report.to_log_string());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match Cli::parse().command {
        Command::Analyze {
            hand,
            seen,
            threads,
            sequential,
            json,
        } => {
            let config = CalcConfig { threads, sequential };
            analyze(&hand, seen.as_deref(), &config, json)
        }
        Command::Batch { file, threads, json } => batch(&file, threads, json),
    }
}
