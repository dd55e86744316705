//! Hybrid pitch estimation
//!
//! Three independent per-segment frequency estimators form a closed strategy
//! set behind the [`PitchEstimator`] trait: zero-crossing rate (cheap, noisy),
//! FFT-accelerated autocorrelation (robust for periodic signals), and a
//! bounded spectral peak search (sharpest for clean tones). Their candidates
//! are merged by weighted proximity clustering in [`cluster`].
//!
//! Weights order the methods by reliability: spectral > autocorrelation >
//! zero-crossing. An estimator that cannot produce a defensible frequency
//! returns `None` rather than a low-quality candidate.

pub mod autocorrelation;
pub mod cluster;
pub mod spectral;
pub mod zero_crossing;

use crate::config::TuningSettings;
use crate::features::segment::Segment;

use autocorrelation::AutocorrelationEstimator;
use spectral::SpectralPeakEstimator;
use zero_crossing::ZeroCrossingEstimator;

/// Numerical stability epsilon
pub(crate) const EPSILON: f32 = 1e-10;

/// Originating method of a pitch candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitchMethod {
    /// Zero-crossing rate over the window
    ZeroCrossing,
    /// Best normalized autocorrelation lag
    Autocorrelation,
    /// Dominant frequency-domain peak
    SpectralPeak,
}

impl PitchMethod {
    /// Clustering weight for candidates from this method
    pub fn weight(&self) -> f32 {
        match self {
            PitchMethod::ZeroCrossing => 0.75,
            PitchMethod::Autocorrelation => 1.0,
            PitchMethod::SpectralPeak => 1.25,
        }
    }

    /// Short label for diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            PitchMethod::ZeroCrossing => "zero-crossing",
            PitchMethod::Autocorrelation => "autocorrelation",
            PitchMethod::SpectralPeak => "spectral-peak",
        }
    }
}

/// A frequency estimate for one segment from one method
///
/// Invalid candidates are never constructed; if a method cannot commit to a
/// frequency inside the configured range it produces nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchCandidate {
    /// Estimated fundamental in Hz
    pub frequency_hz: f32,
    /// Method that produced the estimate
    pub method: PitchMethod,
    /// Clustering weight, fixed per method
    pub weight: f32,
}

impl PitchCandidate {
    /// Build a candidate carrying its method's weight
    pub fn new(frequency_hz: f32, method: PitchMethod) -> Self {
        Self {
            frequency_hz,
            method,
            weight: method.weight(),
        }
    }
}

/// One pitch estimation strategy
///
/// Implementations are pure: the same segment and settings always produce
/// the same candidate.
pub trait PitchEstimator {
    /// Method identifier for the produced candidates
    fn method(&self) -> PitchMethod;

    /// Estimate a fundamental frequency for the segment
    ///
    /// Returns `None` when the segment carries no usable evidence for this
    /// method or the estimate falls outside
    /// `[min_frequency_hz, max_frequency_hz]`.
    fn estimate(
        &self,
        segment: &Segment,
        sample_rate: u32,
        settings: &TuningSettings,
    ) -> Option<PitchCandidate>;
}

/// Run the full strategy set over one active segment
///
/// The set is closed: exactly these three methods, in a fixed order, so the
/// candidate list is deterministic. Callers are responsible for gating;
/// silent segments should never reach this function.
pub fn estimate_candidates(
    segment: &Segment,
    sample_rate: u32,
    settings: &TuningSettings,
) -> Vec<PitchCandidate> {
    let estimators: [&dyn PitchEstimator; 3] = [
        &ZeroCrossingEstimator,
        &AutocorrelationEstimator,
        &SpectralPeakEstimator,
    ];

    estimators
        .iter()
        .filter_map(|estimator| estimator.estimate(segment, sample_rate, settings))
        .collect()
}
