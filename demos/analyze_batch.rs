//! Example: fan a batch of files out across a rayon worker pool
//!
//! Usage:
//!   cargo run --release --example analyze_batch -- --jobs 4 --json a.wav b.mp3
//!
//! Each file is analyzed independently with the same default settings, so
//! the output is identical no matter how many workers run the batch. An
//! unreadable path is reported as a per-file failure and never aborts the
//! rest of the batch.

use rayon::prelude::*;
use serde::Serialize;
use std::env;
use std::time::Instant;

use cantus_dsp::{analyze, TuningSettings};

const USAGE: &str = "analyze_batch [--jobs N] [--json] FILE...\n\
                     \n\
                     --jobs N   worker threads (default: all cores but one)\n\
                     --json     emit one JSON object per file, one per line";

/// Per-file record, shaped for JSONL output.
#[derive(Serialize)]
struct ItemOut {
    path: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bpm: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn analyze_path(path: &str, settings: &TuningSettings) -> ItemOut {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            return ItemOut {
                path: path.to_string(),
                ok: false,
                fingerprint: None,
                duration_seconds: None,
                bpm: None,
                key: None,
                notes: None,
                confidence: None,
                error: Some(format!("read failed: {err}")),
            }
        }
    };
    let hint = std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");
    let profile = analyze(&bytes, hint, settings);
    ItemOut {
        path: path.to_string(),
        ok: true,
        fingerprint: Some(profile.fingerprint),
        duration_seconds: Some(profile.duration.seconds),
        bpm: Some(profile.tempo_bpm),
        key: Some(profile.key.name()),
        notes: Some(profile.melody.len()),
        confidence: Some(profile.confidence_hint),
        error: None,
    }
}

fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f32::total_cmp);
    Some(values[values.len() / 2])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut json = false;
    let mut jobs = 0usize;
    let mut paths: Vec<String> = Vec::new();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--json" {
            json = true;
        } else if arg == "--jobs" {
            let value = args.next().ok_or("--jobs needs a worker count")?;
            jobs = value.parse()?;
        } else if arg == "--help" || arg == "-h" {
            eprintln!("{USAGE}");
            return Ok(());
        } else {
            paths.push(arg);
        }
    }

    if paths.is_empty() {
        eprintln!("{USAGE}");
        std::process::exit(2);
    }

    let workers = if jobs == 0 {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        cores.saturating_sub(1).max(1)
    } else {
        jobs
    };
    eprintln!("Spreading {} file(s) across {} worker(s)", paths.len(), workers);

    let settings = TuningSettings::default();
    let started = Instant::now();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()?;
    let results: Vec<ItemOut> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| analyze_path(path, &settings))
            .collect()
    });

    if json {
        for item in &results {
            println!("{}", serde_json::to_string(item)?);
        }
    } else {
        for item in &results {
            match &item.error {
                Some(err) => println!("{:<32} !! {err}", item.path),
                None => println!(
                    "{:<32} {:>5.1} bpm  {:<9} {:>3} notes  conf {:.2}",
                    item.path,
                    item.bpm.unwrap_or(0.0),
                    item.key.as_deref().unwrap_or("-"),
                    item.notes.unwrap_or(0),
                    item.confidence.unwrap_or(0.0),
                ),
            }
        }
    }

    let failed = results.iter().filter(|item| !item.ok).count();
    let mut hints: Vec<f32> = results.iter().filter_map(|item| item.confidence).collect();
    let spread = match median(&mut hints) {
        Some(m) => format!("median confidence {m:.2}"),
        None => "no successful analyses".to_string(),
    };
    eprintln!(
        "Analyzed {} file(s) in {:.2} s ({} failed, {})",
        results.len(),
        started.elapsed().as_secs_f64(),
        failed,
        spread
    );

    Ok(())
}
