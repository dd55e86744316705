//! Analysis output types
//!
//! The profile returned by [`crate::analyze`] plus its component types.
//! Everything here is serializable so downstream consumers can persist or
//! transmit results; none of it carries wall-clock or host state, so equal
//! inputs serialize to equal output.

use serde::{Deserialize, Serialize};

use crate::io::duration::DurationEstimate;

/// Musical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Major key (0 = C, 1 = C#, ..., 11 = B)
    Major(u32),
    /// Minor key (0 = C, 1 = C#, ..., 11 = B)
    Minor(u32),
}

impl Key {
    /// Get key name in musical notation (e.g., "C", "Am", "F#", "D#m")
    ///
    /// # Example
    ///
    /// ```
    /// use cantus_dsp::Key;
    ///
    /// assert_eq!(Key::Major(0).name(), "C");
    /// assert_eq!(Key::Major(6).name(), "F#");
    /// assert_eq!(Key::Minor(9).name(), "Am");
    /// ```
    pub fn name(&self) -> String {
        let note_names = [
            "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
        ];
        match self {
            Key::Major(i) => note_names[*i as usize % 12].to_string(),
            Key::Minor(i) => format!("{}m", note_names[*i as usize % 12]),
        }
    }

    /// Tonic pitch class (0 = C, ..., 11 = B)
    pub fn tonic(&self) -> u32 {
        match self {
            Key::Major(i) | Key::Minor(i) => *i % 12,
        }
    }
}

/// One note of the derived melody
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI pitch, clamped to the configured register
    pub midi_pitch: u8,
    /// Start time in seconds from the beginning of the input
    pub onset_seconds: f64,
    /// Length in seconds; consecutive notes tile the timeline exactly
    pub duration_seconds: f64,
    /// Per-note evidence strength in [0, 1]
    pub confidence: f32,
}

impl NoteEvent {
    /// Pitch class of this note (0 = C, ..., 11 = B)
    pub fn pitch_class(&self) -> u8 {
        self.midi_pitch % 12
    }

    /// End time in seconds
    pub fn end_seconds(&self) -> f64 {
        self.onset_seconds + self.duration_seconds
    }
}

/// Complete analysis profile for one input buffer
///
/// Produced for every input, including empty and malformed ones; the
/// reasoning entries say which evidence paths were taken. Identical inputs
/// produce identical profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAnalysisProfile {
    /// Hex digest identifying the input bytes
    pub fingerprint: String,

    /// Raw input length in bytes
    pub byte_count: usize,

    /// Duration estimate with its source and confidence tier
    pub duration: DurationEstimate,

    /// Tempo estimate in beats per minute, within [40, 240]
    pub tempo_bpm: f32,

    /// Estimated musical key
    pub key: Key,

    /// Monophonic melody; durations sum to the duration estimate
    pub melody: Vec<NoteEvent>,

    /// Ordered human-readable account of the evidence considered
    pub reasoning: Vec<String>,

    /// Overall confidence in [0, 1]
    pub confidence_hint: f32,
}
