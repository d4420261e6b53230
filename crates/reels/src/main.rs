//! Opening reels driver.
//!
//! Loads the opening catalogue and replays a group's feed in the terminal,
//! scrolling from slide to slide the way a viewer would.
//!
//! Usage:
//!   opening-reels groups [--catalogue PATH] [--unique]
//!   opening-reels play [GROUP] [--catalogue PATH] [--unique] [--limit N]
//!   opening-reels tree [--catalogue PATH] [--unique] [--max-ply N]
//!
//! `--unique` keeps only lines that no other line continues.

mod config;

use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context};
use chess_core::opening_tree::{build_opening_tree, TreeLine};
use chess_core::ShakmatyRules;
use openings::Catalogue;
use playback::{MoveExtractor, OpeningFeed, PlaybackEvent, RunOutcome};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ReelsConfig;

const DEFAULT_MAX_PLY: usize = 60;

#[derive(Debug)]
struct Args {
    command: String,
    group: Option<String>,
    catalogue: Option<String>,
    limit: Option<usize>,
    max_ply: usize,
    unique: bool,
}

/// Parse the value following option `name`.
fn option_value<T: FromStr>(args: &[String], i: usize, name: &str) -> anyhow::Result<T> {
    let Some(raw) = args.get(i + 1) else {
        bail!("{name} needs a value");
    };
    match raw.parse() {
        Ok(value) => Ok(value),
        Err(_) => bail!("invalid value {raw:?} for {name}"),
    }
}

fn parse_args(args: Vec<String>) -> anyhow::Result<Args> {
    let mut parsed = Args {
        command: "play".to_string(),
        group: None,
        catalogue: None,
        limit: None,
        max_ply: DEFAULT_MAX_PLY,
        unique: false,
    };

    let mut positional = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--catalogue" => {
                parsed.catalogue = Some(option_value(&args, i, "--catalogue")?);
                i += 2;
            }
            "--limit" => {
                parsed.limit = Some(option_value(&args, i, "--limit")?);
                i += 2;
            }
            "--max-ply" => {
                parsed.max_ply = option_value(&args, i, "--max-ply")?;
                i += 2;
            }
            "--unique" => {
                parsed.unique = true;
                i += 1;
            }
            other if other.starts_with("--") => bail!("unknown option {other}"),
            other => {
                positional.push(other.to_string());
                i += 1;
            }
        }
    }

    let mut positional = positional.into_iter();
    if let Some(command) = positional.next() {
        parsed.command = command;
    }
    parsed.group = positional.next();
    Ok(parsed)
}

/// Load the catalogue from a JSON export, a TSV file or a directory of TSVs.
fn load_catalogue(path: &str) -> anyhow::Result<Catalogue> {
    let p = Path::new(path);

    if p.is_dir() {
        let pattern = format!("{}/*.tsv", path.trim_end_matches('/'));
        let mut files: Vec<_> = glob::glob(&pattern)?.collect::<Result<_, _>>()?;
        files.sort();
        if files.is_empty() {
            bail!("no .tsv files in {path}");
        }

        let mut readers = Vec::with_capacity(files.len());
        for file in &files {
            let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
            readers.push(BufReader::new(f));
        }
        return Ok(Catalogue::from_lichess_tsv(readers)?);
    }

    let file = File::open(p).with_context(|| format!("opening {path}"))?;
    let catalogue = if p.extension().is_some_and(|ext| ext == "tsv") {
        Catalogue::from_lichess_tsv([BufReader::new(file)])?
    } else {
        Catalogue::from_json(BufReader::new(file))?
    };
    Ok(catalogue)
}

fn list_groups(catalogue: &Catalogue, config: &ReelsConfig) {
    for option in catalogue.group_options(config.max_group_size) {
        println!("{} ({})", option.group, option.total);
    }
}

fn print_tree(catalogue: &Catalogue, max_ply: usize) -> anyhow::Result<()> {
    let extractor = MoveExtractor::new(Arc::new(ShakmatyRules::new()));

    let mut extracted = Vec::with_capacity(catalogue.len());
    for record in catalogue.records() {
        match extractor.extract(&record.pgn) {
            Ok(seq) => extracted.push((record.name.as_str(), seq)),
            Err(e) => warn!(name = %record.name, error = %e, "Skipping opening"),
        }
    }

    let lines: Vec<TreeLine<'_>> = extracted
        .iter()
        .map(|(name, seq)| TreeLine { name: *name, moves: &seq[..] })
        .collect();
    let tree = build_opening_tree(&lines, max_ply);
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}

async fn play_group(
    catalogue: &Catalogue,
    config: &ReelsConfig,
    group: Option<String>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    // Same default as the selector: the smallest group
    let group = match group {
        Some(g) => g,
        None => catalogue
            .group_options(config.max_group_size)
            .into_iter()
            .next()
            .map(|o| o.group)
            .context("catalogue has no selectable group")?,
    };

    let mut records = catalogue.in_group(&group);
    if records.is_empty() {
        bail!("no openings in group {group:?}");
    }
    if let Some(limit) = limit {
        records.truncate(limit);
    }

    info!(group = %group, slides = records.len(), "Playing feed");
    let engine = Arc::new(ShakmatyRules::new());
    let mut feed = OpeningFeed::new(engine, records, config.playback.clone());

    for index in 0..feed.len() {
        let Some(slide) = feed.slide(index) else { break };
        println!("{}. {} - {}", index + 1, slide.record.group, slide.record.name);

        if let Some(e) = slide.extraction_error() {
            warn!(slide = %slide.key(), error = %e, "Skipping unplayable slide");
            continue;
        }

        let mut events = slide.handle().subscribe_events();
        feed.set_active(Some(index))?;

        let watched = tokio::time::timeout(config.slide_dwell, async {
            while let Ok(event) = events.recv().await {
                match event {
                    PlaybackEvent::MovePlayed { ply, san, fen, .. } => {
                        info!(ply, san = %san, fen = %fen, "Move");
                    }
                    PlaybackEvent::RunFinished { outcome, .. } => return outcome,
                    _ => {}
                }
            }
            RunOutcome::Cancelled
        })
        .await;

        match watched {
            Ok(RunOutcome::Failed(e)) => warn!(error = %e, "Run failed"),
            Ok(_) => {}
            Err(_) => info!("Dwell time elapsed, scrolling on"),
        }
    }

    feed.set_active(None)?;
    feed.shutdown().await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = parse_args(env::args().skip(1).collect())?;
    let mut config = ReelsConfig::from_env();
    if let Some(path) = args.catalogue.clone() {
        config.openings_path = path;
    }

    let mut catalogue = load_catalogue(&config.openings_path)?;
    info!(path = %config.openings_path, openings = catalogue.len(), "Catalogue loaded");
    if args.unique {
        catalogue = catalogue.unique();
        info!(openings = catalogue.len(), "Kept unique lines");
    }

    match args.command.as_str() {
        "groups" => list_groups(&catalogue, &config),
        "tree" => print_tree(&catalogue, args.max_ply)?,
        "play" => {
            tokio::select! {
                result = play_group(&catalogue, &config, args.group, args.limit) => result?,
                _ = tokio::signal::ctrl_c() => info!("Interrupted, stopping feed"),
            }
        }
        other => bail!("unknown command {other:?} (expected groups, play or tree)"),
    }

    Ok(())
}
