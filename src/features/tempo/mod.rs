//! Tempo inference from windowed activity
//!
//! Two stages: onset detection over a per-window energy/activity signal
//! (noise-floor gate with hysteresis), then inter-onset-interval clustering
//! down to a single BPM estimate.

pub mod interval;
pub mod onset;

/// BPM reported when there are too few onsets to infer a tempo
pub const DEFAULT_BPM: f32 = 120.0;

/// Lowest BPM the engine will report
pub const MIN_BPM: f32 = 40.0;

/// Highest BPM the engine will report
pub const MAX_BPM: f32 = 240.0;

/// A resolved tempo with the evidence that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct TempoEstimate {
    /// Beats per minute, clamped to [`MIN_BPM`, `MAX_BPM`]
    pub bpm: f32,

    /// Onsets that fed the estimate
    pub onset_count: usize,

    /// True when fewer than two onsets forced the low-confidence default
    pub defaulted: bool,
}

impl TempoEstimate {
    /// The fixed low-confidence estimate used when onset evidence is thin
    pub fn default_low_confidence(onset_count: usize) -> Self {
        Self {
            bpm: DEFAULT_BPM,
            onset_count,
            defaulted: true,
        }
    }
}
