//! Tuning settings for audio analysis

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

/// Tuning settings controlling onset gating, pitch search, and melody range
///
/// Settings arrive pre-validated: construct through [`TuningSettings::validated`]
/// (or take [`Default::default`]) before handing them to the engine. The
/// engine itself assumes every field is in range and does not re-check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningSettings {
    /// Multiplier applied to the running noise floor to form the onset gate
    /// (default: 1.5). Windows whose RMS stays below
    /// `rms_gate_threshold × noise_floor` are treated as silent.
    pub rms_gate_threshold: f32,

    /// Lowest frequency the pitch estimators consider, in Hz (default: 55.0,
    /// A1). Must be positive and below `max_frequency_hz`.
    pub min_frequency_hz: f32,

    /// Highest frequency the pitch estimators consider, in Hz
    /// (default: 1760.0, A6).
    pub max_frequency_hz: f32,

    /// Frequency proximity band for merging pitch candidates into one
    /// cluster, in Hz (default: 15.0).
    pub cluster_tolerance_hz: f32,

    /// Lowest MIDI pitch a note may take (default: 36, C2). Must be below
    /// `midi_ceiling`.
    pub midi_floor: u8,

    /// Highest MIDI pitch a note may take (default: 96, C7).
    pub midi_ceiling: u8,
}

impl Default for TuningSettings {
    fn default() -> Self {
        Self {
            rms_gate_threshold: 1.5,
            min_frequency_hz: 55.0,
            max_frequency_hz: 1760.0,
            cluster_tolerance_hz: 15.0,
            midi_floor: 36,
            midi_ceiling: 96,
        }
    }
}

impl TuningSettings {
    /// Validate raw settings at the loader boundary
    ///
    /// This is the only place [`AnalysisError::InvalidTuningSettings`] can
    /// arise; everything past this constructor trusts the values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTuningSettings` if any field is outside its
    /// documented range or the ordering constraints
    /// (`min_frequency_hz < max_frequency_hz`, `midi_floor < midi_ceiling`)
    /// are violated.
    ///
    /// # Example
    ///
    /// ```
    /// use cantus_dsp::TuningSettings;
    ///
    /// let settings = TuningSettings::validated(1.5, 55.0, 1760.0, 15.0, 36, 96)?;
    /// assert_eq!(settings.midi_floor, 36);
    /// # Ok::<(), cantus_dsp::AnalysisError>(())
    /// ```
    pub fn validated(
        rms_gate_threshold: f32,
        min_frequency_hz: f32,
        max_frequency_hz: f32,
        cluster_tolerance_hz: f32,
        midi_floor: u8,
        midi_ceiling: u8,
    ) -> Result<Self, AnalysisError> {
        if !rms_gate_threshold.is_finite() || rms_gate_threshold <= 0.0 {
            return Err(AnalysisError::InvalidTuningSettings(format!(
                "rms_gate_threshold must be positive and finite, got {}",
                rms_gate_threshold
            )));
        }

        if !min_frequency_hz.is_finite() || min_frequency_hz <= 0.0 {
            return Err(AnalysisError::InvalidTuningSettings(format!(
                "min_frequency_hz must be positive and finite, got {}",
                min_frequency_hz
            )));
        }

        if !max_frequency_hz.is_finite() || max_frequency_hz <= min_frequency_hz {
            return Err(AnalysisError::InvalidTuningSettings(format!(
                "max_frequency_hz must exceed min_frequency_hz ({} <= {})",
                max_frequency_hz, min_frequency_hz
            )));
        }

        if !cluster_tolerance_hz.is_finite() || cluster_tolerance_hz <= 0.0 {
            return Err(AnalysisError::InvalidTuningSettings(format!(
                "cluster_tolerance_hz must be positive and finite, got {}",
                cluster_tolerance_hz
            )));
        }

        if midi_floor >= midi_ceiling {
            return Err(AnalysisError::InvalidTuningSettings(format!(
                "midi_floor must be below midi_ceiling ({} >= {})",
                midi_floor, midi_ceiling
            )));
        }

        if midi_ceiling > 127 {
            return Err(AnalysisError::InvalidTuningSettings(format!(
                "midi_ceiling must be a valid MIDI pitch, got {}",
                midi_ceiling
            )));
        }

        Ok(Self {
            rms_gate_threshold,
            min_frequency_hz,
            max_frequency_hz,
            cluster_tolerance_hz,
            midi_floor,
            midi_ceiling,
        })
    }
}
