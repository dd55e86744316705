//! Example: analyze a single audio file
//!
//! Usage:
//!   cargo run --release --example analyze_file -- <path> [--json]
//!
//! Reads the file as raw bytes; no external decoder is involved. `--json`
//! prints the full serialized profile instead of the human-readable summary.

use std::env;

use cantus_dsp::{analyze, TuningSettings};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut json = false;
    let mut path: Option<String> = None;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            _ => path = Some(arg),
        }
    }
    let path = path.ok_or("usage: analyze_file [--json] <path>")?;

    let bytes = std::fs::read(&path)?;
    let hint = std::path::Path::new(&path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    let profile = analyze(&bytes, hint, &TuningSettings::default());

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    println!("{}", path);
    println!("  fingerprint: {}", profile.fingerprint);
    println!(
        "  duration:    {:.3}s via {} ({} confidence)",
        profile.duration.seconds,
        profile.duration.source.label(),
        profile.duration.tier.label()
    );
    println!("  tempo:       {:.1} BPM", profile.tempo_bpm);
    println!("  key:         {}", profile.key.name());
    println!("  notes:       {}", profile.melody.len());
    println!("  confidence:  {:.2}", profile.confidence_hint);
    println!("  reasoning:");
    for entry in &profile.reasoning {
        println!("    - {}", entry);
    }

    Ok(())
}
