//! Byte-activity pseudo-melody derivation
//!
//! Fallback path for inputs whose PCM cannot be decoded (compressed streams,
//! malformed containers, unsupported sample widths). The raw bytes are cut
//! into coarse windows sized so that roughly one window lands per beat, and
//! each window's byte statistics quantize into a compressed melodic register.
//! The result is a texture sketch, not a transcription, and every consumer
//! treats it as strictly weaker evidence than decoded PCM.
//!
//! # Algorithm
//! 1. Choose a window count near `duration × BPM / 60`, clamped to [8, 512]
//! 2. Derive one pitch per window from the window's mean level and mean
//!    absolute successive difference, folded into the [48, 83] MIDI register
//! 3. Flat windows (zero successive difference) become rests
//! 4. Enforce a minimum of four distinct pitches over four or more notes by
//!    deterministically perturbing repeated values

use std::collections::BTreeSet;

use log::debug;

/// Lowest MIDI pitch the byte path will emit (C3)
pub const REGISTER_FLOOR: u8 = 48;
/// Highest MIDI pitch the byte path will emit (B5)
pub const REGISTER_CEILING: u8 = 83;
/// Number of distinct pitches in the byte-path register
const REGISTER_SPAN: u32 = (REGISTER_CEILING - REGISTER_FLOOR + 1) as u32;

/// Fewest pseudo-melody windows carved from any qualifying input
const MIN_WINDOWS: usize = 8;
/// Most pseudo-melody windows carved from any input
const MAX_WINDOWS: usize = 512;
/// Smallest window (and smallest input) the quantizer will accept, in bytes
const MIN_WINDOW_BYTES: usize = 64;
/// Minimum distinct pitches once the track holds at least that many notes
const MIN_DISTINCT_PITCHES: usize = 4;

/// A pseudo-melody derived from raw bytes: one optional pitch per window
#[derive(Debug, Clone, PartialEq)]
pub struct BytePitchTrack {
    /// Per-window pitch in [`REGISTER_FLOOR`, `REGISTER_CEILING`], or a rest
    pub pitches: Vec<Option<u8>>,
    /// Nominal seconds spanned by each window
    pub window_seconds: f64,
}

impl BytePitchTrack {
    fn empty() -> Self {
        BytePitchTrack {
            pitches: Vec::new(),
            window_seconds: 0.0,
        }
    }

    /// Number of windows that resolved to a pitch rather than a rest
    pub fn note_count(&self) -> usize {
        self.pitches.iter().flatten().count()
    }
}

/// Quantize raw bytes into a pseudo-melody track
///
/// Pure function of the byte content, the duration estimate, and the tempo
/// estimate; identical inputs always yield the identical track. Inputs under
/// 64 bytes carry too little texture to sketch and produce an empty track.
pub fn derive_pitch_track(bytes: &[u8], duration_seconds: f64, bpm: f32) -> BytePitchTrack {
    if bytes.len() < MIN_WINDOW_BYTES {
        debug!(
            "byte-activity: {} bytes is below the {}-byte minimum; empty track",
            bytes.len(),
            MIN_WINDOW_BYTES
        );
        return BytePitchTrack::empty();
    }

    // Step 1: aim for one window per beat, within fixed bounds.
    let beats = (duration_seconds * f64::from(bpm) / 60.0).round();
    let target = if beats.is_finite() && beats > 0.0 {
        (beats as usize).clamp(MIN_WINDOWS, MAX_WINDOWS)
    } else {
        MIN_WINDOWS
    };
    let window_size = (bytes.len() / target).max(MIN_WINDOW_BYTES);

    // Step 2/3: one pitch (or rest) per full window, capped at the target.
    let mut pitches: Vec<Option<u8>> = bytes
        .chunks_exact(window_size)
        .take(target)
        .map(quantize_window)
        .collect();

    // Step 4: guarantee melodic variety on repetitive byte textures.
    enforce_pitch_diversity(&mut pitches);

    let window_seconds = if pitches.is_empty() {
        0.0
    } else {
        duration_seconds / pitches.len() as f64
    };

    debug!(
        "byte-activity: {} windows of {} bytes, {} notes",
        pitches.len(),
        window_size,
        pitches.iter().flatten().count()
    );

    BytePitchTrack {
        pitches,
        window_seconds,
    }
}

/// Fold one window's byte statistics into the melodic register
///
/// A perfectly flat window carries no activity and becomes a rest. Otherwise
/// the mean level locates the window coarsely and the successive-difference
/// activity (amplified so small texture changes move the pitch) selects the
/// degree within the register.
fn quantize_window(window: &[u8]) -> Option<u8> {
    let delta_sum: u32 = window
        .windows(2)
        .map(|pair| (i32::from(pair[0]) - i32::from(pair[1])).unsigned_abs())
        .sum();
    if delta_sum == 0 {
        return None;
    }

    let level_sum: u32 = window.iter().map(|&b| u32::from(b)).sum();
    let mean_level = level_sum / window.len() as u32;
    let mean_delta = delta_sum / (window.len() - 1) as u32;

    let degree = (mean_level + mean_delta * 7) % REGISTER_SPAN;
    Some(REGISTER_FLOOR + degree as u8)
}

/// Perturb repeated pitches until the track carries enough distinct values
///
/// Repetitive byte textures (padding runs, constant-bitrate filler) collapse
/// to one or two pitch values; downstream key and calibration statistics need
/// a little spread to say anything. Later repeats of an already-seen pitch
/// are nudged to the nearest unused register degree, earliest notes first,
/// stopping as soon as four distinct values exist.
fn enforce_pitch_diversity(pitches: &mut [Option<u8>]) {
    let note_count = pitches.iter().flatten().count();
    if note_count < MIN_DISTINCT_PITCHES {
        return;
    }

    let mut seen: BTreeSet<u8> = pitches.iter().flatten().copied().collect();
    if seen.len() >= MIN_DISTINCT_PITCHES {
        return;
    }

    let mut encountered: BTreeSet<u8> = BTreeSet::new();
    for slot in pitches.iter_mut() {
        if seen.len() >= MIN_DISTINCT_PITCHES {
            break;
        }
        let pitch = match *slot {
            Some(pitch) => pitch,
            None => continue,
        };
        if encountered.insert(pitch) {
            continue;
        }
        // A repeat: move it to the closest unused degree above.
        for offset in 1..REGISTER_SPAN {
            let degree = (u32::from(pitch - REGISTER_FLOOR) + offset) % REGISTER_SPAN;
            let candidate = REGISTER_FLOOR + degree as u8;
            if seen.insert(candidate) {
                *slot = Some(candidate);
                break;
            }
        }
    }
}
