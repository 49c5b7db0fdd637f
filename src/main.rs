use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use otb_decode::{DecodeConfig, DecodeRun, Decoder, DirectorySink, IdMap, Observations};

/// Decode recognised board states into a move list.
#[derive(Parser)]
#[command(name = "otb-decode")]
#[command(about = "Reconstruct chess moves from per-frame board observations")]
#[command(version)]
struct Args {
    /// JSON array of frames, each with an "occupancy" or "piece_ids" 8x8 grid
    #[arg(value_name = "FRAMES")]
    frames: PathBuf,

    /// Write moves.json, confidence.json and uncertain_moves.json here instead of printing
    #[arg(short, long, value_name = "DIR")]
    outdir: Option<PathBuf>,

    /// JSON decode configuration
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Starting position (defaults to the standard start)
    #[arg(long)]
    fen: Option<String>,

    /// JSON tag table, e.g. {"5": "P"}; inferred from the first frame if omitted
    #[arg(long, value_name = "FILE")]
    id_map: Option<PathBuf>,

    /// Gap between best and runner-up below which a step is uncertain
    #[arg(long)]
    uncertain_threshold: Option<f64>,

    /// Best distance above which a step is uncertain
    #[arg(long)]
    dist_threshold: Option<f64>,

    /// Also render occupancy and diff images under OUTDIR/debug
    #[arg(long, requires = "outdir")]
    debug_artifacts: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DecodeConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DecodeConfig::default(),
    };
    if let Some(fen) = args.fen {
        config.initial_fen = Some(fen);
    }
    if let Some(threshold) = args.uncertain_threshold {
        config.uncertain_threshold = threshold;
    }
    if let Some(threshold) = args.dist_threshold {
        config.dist_threshold = threshold;
    }

    let json = fs::read_to_string(&args.frames)
        .with_context(|| format!("reading frames {}", args.frames.display()))?;
    let observations = Observations::from_json(&json)?;
    info!(
        "loaded {} {:?} frames from {}",
        observations.len(),
        observations.mode(),
        args.frames.display()
    );

    let mut decoder = Decoder::new(config)?;
    if let Some(path) = &args.id_map {
        let id_map = IdMap::from_json_file(path)
            .with_context(|| format!("loading tag table {}", path.display()))?;
        decoder = decoder.with_id_map(id_map);
    }

    let Some(outdir) = args.outdir else {
        let run = decoder.decode(&observations)?;
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    };

    fs::create_dir_all(&outdir).with_context(|| format!("creating {}", outdir.display()))?;
    if args.debug_artifacts {
        match DirectorySink::create(outdir.join("debug")) {
            Ok(sink) => decoder = decoder.with_artifacts(Box::new(sink)),
            Err(e) => warn!("debug artifacts disabled: {e}"),
        }
    }

    let run = decoder.decode(&observations)?;
    write_outputs(&outdir, &run)?;
    info!("results written to {}", outdir.display());

    Ok(())
}

/// Write `moves.json` and `confidence.json`, plus `uncertain_moves.json`
/// when any step needs review.
fn write_outputs(outdir: &Path, run: &DecodeRun) -> Result<()> {
    fs::write(
        outdir.join("moves.json"),
        serde_json::to_string_pretty(&run.san_moves())?,
    )?;
    fs::write(
        outdir.join("confidence.json"),
        serde_json::to_string_pretty(&run.steps)?,
    )?;
    if !run.uncertain.is_empty() {
        let path = outdir.join("uncertain_moves.json");
        fs::write(&path, serde_json::to_string_pretty(&run.uncertain)?)?;
        warn!(
            "{} uncertain move(s) recorded in {}",
            run.uncertain.len(),
            path.display()
        );
    }
    Ok(())
}
