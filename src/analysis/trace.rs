//! Reasoning trace builder
//!
//! Every profile carries a human-readable account of how the engine reached
//! its conclusions. The trace is an ordered list of plain strings, one per
//! pipeline stage:
//!
//! 1. Active tuning values
//! 2. Duration estimate and its source
//! 3. Tempo evidence (onset count, or a default note)
//! 4. Melodic evidence (resolved vs. rest windows, or "no melodic evidence")
//! 5. Tonal evidence (distinct pitch classes, MIDI span, key name)
//! 6. Calibration decision
//! 7. Final confidence hint
//!
//! Entries are built from the same values that land in the profile, never
//! from wall-clock or host state, so identical inputs produce identical
//! traces.

use std::collections::BTreeSet;

use crate::analysis::confidence::confidence_level;
use crate::analysis::profile::{Key, NoteEvent};
use crate::config::TuningSettings;
use crate::features::calibration::CalibrationDecision;
use crate::features::tempo::TempoEstimate;
use crate::io::duration::DurationEstimate;

/// Which extraction path produced the tempo and melodic evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidencePath {
    /// Decoded PCM samples from a parseable WAV payload.
    DecodedPcm,
    /// Byte-activity statistics over the raw stream.
    ByteActivity,
}

impl EvidencePath {
    /// Human-readable path name used inside trace entries.
    pub fn label(&self) -> &'static str {
        match self {
            EvidencePath::DecodedPcm => "decoded PCM",
            EvidencePath::ByteActivity => "byte activity",
        }
    }
}

/// Ordered collector for reasoning entries.
///
/// The engine calls the `record_*` methods in pipeline order and hands the
/// finished list to the profile via [`ReasoningTrace::into_entries`].
#[derive(Debug, Default)]
pub struct ReasoningTrace {
    entries: Vec<String>,
}

impl ReasoningTrace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record the tuning values the run was configured with.
    pub fn record_settings(&mut self, settings: &TuningSettings) {
        self.entries.push(format!(
            "tuning: gate x{:.2}, band {:.1}-{:.1} Hz, cluster tolerance {:.1} Hz, register {}-{}",
            settings.rms_gate_threshold,
            settings.min_frequency_hz,
            settings.max_frequency_hz,
            settings.cluster_tolerance_hz,
            settings.midi_floor,
            settings.midi_ceiling
        ));
    }

    /// Record that the input byte stream was empty.
    pub fn record_empty_input(&mut self) {
        self.entries
            .push("input: empty byte stream, emitting an empty profile".to_string());
    }

    /// Record the duration estimate together with its source and tier.
    pub fn record_duration(&mut self, estimate: &DurationEstimate) {
        self.entries.push(format!(
            "duration: {:.3} s via {} ({} confidence)",
            estimate.seconds,
            estimate.source.label(),
            estimate.tier.label()
        ));
    }

    /// Record the tempo evidence, noting when the default had to be used.
    pub fn record_tempo(&mut self, path: EvidencePath, tempo: &TempoEstimate) {
        let entry = if tempo.defaulted {
            format!(
                "tempo ({}): {} onsets are too few to cluster, defaulting to {:.1} BPM",
                path.label(),
                tempo.onset_count,
                tempo.bpm
            )
        } else {
            format!(
                "tempo ({}): {} onsets clustered to {:.1} BPM",
                path.label(),
                tempo.onset_count,
                tempo.bpm
            )
        };
        self.entries.push(entry);
    }

    /// Record the melodic evidence.
    ///
    /// `resolved_windows` counts windows that yielded a pitch,
    /// `rest_windows` counts the remainder. A melody with zero notes records
    /// the literal phrase "no melodic evidence".
    pub fn record_melody(
        &mut self,
        path: EvidencePath,
        note_count: usize,
        resolved_windows: usize,
        rest_windows: usize,
    ) {
        if note_count == 0 {
            self.entries.push("melody: no melodic evidence".to_string());
        } else {
            self.entries.push(format!(
                "melody ({}): {} notes from {} resolved and {} rest windows",
                path.label(),
                note_count,
                resolved_windows,
                rest_windows
            ));
        }
    }

    /// Record the tonal evidence: distinct pitch classes, MIDI span, key.
    pub fn record_tonality(&mut self, melody: &[NoteEvent], key: Key) {
        if melody.is_empty() {
            self.entries.push(format!(
                "tonality: no pitched material, falling back to {}",
                key.name()
            ));
            return;
        }

        let classes: BTreeSet<u8> = melody.iter().map(|note| note.pitch_class()).collect();
        let lowest = melody.iter().map(|note| note.midi_pitch).min().unwrap_or(0);
        let highest = melody.iter().map(|note| note.midi_pitch).max().unwrap_or(0);
        self.entries.push(format!(
            "tonality: {} distinct pitch classes spanning {} semitones, key {}",
            classes.len(),
            highest.saturating_sub(lowest),
            key.name()
        ));
    }

    /// Record whether calibration was applied or why it was skipped.
    pub fn record_calibration(&mut self, decision: &CalibrationDecision) {
        self.entries
            .push(format!("calibration: {}", decision.describe()));
    }

    /// Record the final confidence hint with its qualitative level.
    pub fn record_confidence(&mut self, hint: f32) {
        self.entries.push(format!(
            "confidence: {:.2} ({})",
            hint,
            confidence_level(hint)
        ));
    }

    /// Consume the trace, yielding the ordered entries for the profile.
    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }

    /// Borrow the entries recorded so far.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}
