//! Key estimation from the derived melody
//!
//! Builds a duration-weighted pitch-class histogram over the note list and
//! correlates it against the Krumhansl-Kessler tonal profiles in all 24
//! rotations; the strongest correlation names the key. An empty melody has
//! no tonal evidence at all, so the key falls back to a value seeded from
//! the input fingerprint, keeping the result a pure function of the input.
//!
//! # Reference
//!
//! Krumhansl, C. L., & Kessler, E. J. (1982). Tracing the Dynamic Changes in
//! Perceived Tonal Organization in a Spatial Representation of Musical Keys.
//! *Psychological Review*, 89(4), 334-368.

use log::debug;

use crate::analysis::profile::{Key, NoteEvent};

/// Krumhansl-Kessler major key profile (tonic at index 0)
const MAJOR_PROFILE: [f32; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Kessler minor key profile (tonic at index 0)
const MINOR_PROFILE: [f32; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Estimate the key of a melody
///
/// Majors are scanned before minors and only a strictly better correlation
/// replaces the incumbent, so ties resolve deterministically. `fallback_seed`
/// selects the tonic of the major-key fallback when the melody is empty.
pub fn estimate_key(melody: &[NoteEvent], fallback_seed: u8) -> Key {
    if melody.is_empty() {
        let key = Key::Major(u32::from(fallback_seed % 12));
        debug!("key: empty melody, fingerprint-seeded fallback {}", key.name());
        return key;
    }

    let histogram = pitch_class_histogram(melody);

    let mut best_key = Key::Major(0);
    let mut best_correlation = f32::NEG_INFINITY;
    for tonic in 0..12u32 {
        let correlation =
            pearson_correlation(&histogram, &rotate_profile(&MAJOR_PROFILE, tonic as usize));
        if correlation > best_correlation {
            best_correlation = correlation;
            best_key = Key::Major(tonic);
        }
    }
    for tonic in 0..12u32 {
        let correlation =
            pearson_correlation(&histogram, &rotate_profile(&MINOR_PROFILE, tonic as usize));
        if correlation > best_correlation {
            best_correlation = correlation;
            best_key = Key::Minor(tonic);
        }
    }

    debug!(
        "key: {} (correlation {:.4})",
        best_key.name(),
        best_correlation
    );
    best_key
}

/// Accumulate note durations by pitch class
fn pitch_class_histogram(melody: &[NoteEvent]) -> [f32; 12] {
    let mut histogram = [0.0f32; 12];
    for note in melody {
        histogram[note.pitch_class() as usize] += note.duration_seconds as f32;
    }
    histogram
}

/// Rotate a tonal profile so its tonic lands on the given pitch class
fn rotate_profile(profile: &[f32; 12], semitones: usize) -> [f32; 12] {
    let mut rotated = [0.0f32; 12];
    for (i, &value) in profile.iter().enumerate() {
        rotated[(i + semitones) % 12] = value;
    }
    rotated
}

/// Pearson correlation coefficient between two 12-element vectors
///
/// Returns 0.0 when either vector has no variance.
fn pearson_correlation(x: &[f32; 12], y: &[f32; 12]) -> f32 {
    let n = 12.0f32;
    let mean_x: f32 = x.iter().sum::<f32>() / n;
    let mean_y: f32 = y.iter().sum::<f32>() / n;

    let mut covariance = 0.0f32;
    let mut var_x = 0.0f32;
    let mut var_y = 0.0f32;
    for i in 0..12 {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let std_x = var_x.sqrt();
    let std_y = var_y.sqrt();
    if std_x < f32::EPSILON || std_y < f32::EPSILON {
        return 0.0;
    }
    covariance / (std_x * std_y)
}
