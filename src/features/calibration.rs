//! Reference-instrument calibration
//!
//! An optional final pass that snaps the melody onto a reference set of
//! pitch classes, the way a player would settle onto the scale of their
//! instrument. Calibration is deliberately conservative: a melody must look
//! like a candidate (enough notes, mostly on the reference classes, sitting
//! in a plausible register) or it passes through untouched. The decision is
//! reported alongside the melody so the reasoning trace can explain it.
//!
//! # Algorithm
//! 1. Derive the reference set: the melody's own distinct pitch classes when
//!    at least 6 are present, otherwise the diatonic default
//! 2. Gate: ≥ 6 notes, ≥ 60% of notes on reference classes, mean pitch
//!    within 18 semitones of the configured register midpoint, span ≤ 48
//! 3. Apply: snap each note to the nearest reference class (ties snap
//!    downward), clamped to the configured register
//!
//! Skipped melodies are returned byte-for-byte unmodified; the whole pass is
//! a pure function of the melody and the tuning settings.

use std::collections::BTreeSet;

use log::debug;

use crate::analysis::profile::NoteEvent;
use crate::config::TuningSettings;

/// Fewest notes a calibration candidate can have
const MIN_NOTES: usize = 6;
/// Fewest distinct pitch classes needed to self-derive a reference set
const MIN_DERIVED_CLASSES: usize = 6;
/// Minimum fraction of notes already on reference classes
const MIN_OVERLAP: f32 = 0.6;
/// Maximum distance between mean pitch and the register midpoint, semitones
const MAX_CENTER_OFFSET: f32 = 18.0;
/// Maximum melody span, semitones
const MAX_SPAN: i16 = 48;

/// Diatonic fallback reference (major scale degrees from C)
const DIATONIC_REFERENCE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Outcome of the calibration gate
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationDecision {
    /// The melody was not a candidate; it passed through unmodified
    Skip {
        /// First gate that failed
        reason: String,
    },
    /// Notes were snapped onto the reference pitch classes
    Apply {
        /// Sorted distinct pitch classes the melody was snapped to
        reference: Vec<u8>,
    },
}

impl CalibrationDecision {
    /// Human-readable form for log and trace text
    pub fn describe(&self) -> String {
        match self {
            CalibrationDecision::Skip { reason } => format!("skipped ({})", reason),
            CalibrationDecision::Apply { reference } => {
                format!("applied (reference classes {:?})", reference)
            }
        }
    }
}

/// Calibrate a melody against a derived or default reference set
///
/// Returns the (possibly snapped) melody together with the decision. A
/// skipped melody is returned exactly as given.
pub fn calibrate(
    melody: &[NoteEvent],
    settings: &TuningSettings,
) -> (Vec<NoteEvent>, CalibrationDecision) {
    if melody.len() < MIN_NOTES {
        return skip(melody, format!("fewer than {} notes", MIN_NOTES));
    }

    // Step 1: reference derivation.
    let distinct: BTreeSet<u8> = melody.iter().map(|n| n.pitch_class()).collect();
    let reference: Vec<u8> = if distinct.len() >= MIN_DERIVED_CLASSES {
        distinct.iter().copied().collect()
    } else {
        DIATONIC_REFERENCE.to_vec()
    };

    // Step 2: candidate gate, first failure wins.
    let on_reference = melody
        .iter()
        .filter(|n| reference.contains(&n.pitch_class()))
        .count();
    let overlap = on_reference as f32 / melody.len() as f32;
    if overlap < MIN_OVERLAP {
        return skip(melody, "insufficient overlap with reference classes".to_string());
    }

    let mean_pitch =
        melody.iter().map(|n| f32::from(n.midi_pitch)).sum::<f32>() / melody.len() as f32;
    let midpoint = (f32::from(settings.midi_floor) + f32::from(settings.midi_ceiling)) / 2.0;
    if (mean_pitch - midpoint).abs() > MAX_CENTER_OFFSET {
        return skip(melody, "register far from configured center".to_string());
    }

    let lowest = melody.iter().map(|n| n.midi_pitch).min().unwrap_or(0);
    let highest = melody.iter().map(|n| n.midi_pitch).max().unwrap_or(0);
    if i16::from(highest) - i16::from(lowest) > MAX_SPAN {
        return skip(melody, "register span too wide".to_string());
    }

    // Step 3: snap pitches; timing and confidence stay as they were.
    let snapped: Vec<NoteEvent> = melody
        .iter()
        .map(|note| NoteEvent {
            midi_pitch: snap_pitch(
                note.midi_pitch,
                &reference,
                settings.midi_floor,
                settings.midi_ceiling,
            ),
            ..*note
        })
        .collect();

    debug!(
        "calibration: applied over {} notes, reference {:?}",
        snapped.len(),
        reference
    );
    (snapped, CalibrationDecision::Apply { reference })
}

fn skip(melody: &[NoteEvent], reason: String) -> (Vec<NoteEvent>, CalibrationDecision) {
    debug!("calibration: skipped ({})", reason);
    (melody.to_vec(), CalibrationDecision::Skip { reason })
}

/// Snap one pitch to the nearest reference class, ties downward
fn snap_pitch(pitch: u8, reference: &[u8], floor: u8, ceiling: u8) -> u8 {
    let class = i16::from(pitch % 12);

    let mut best_delta = 0i16;
    let mut best_distance = i16::MAX;
    for &target in reference {
        let up = (i16::from(target) + 12 - class) % 12;
        let down = (class + 12 - i16::from(target)) % 12;
        // Ties (up == down) move downward.
        let delta = if up < down { up } else { -down };
        let distance = delta.abs();
        if distance < best_distance || (distance == best_distance && delta < best_delta) {
            best_distance = distance;
            best_delta = delta;
        }
    }

    let snapped = i16::from(pitch) + best_delta;
    snapped.clamp(i16::from(floor), i16::from(ceiling)) as u8
}
