//! Zero-crossing pitch estimation
//!
//! The cheapest estimator: a periodic signal at frequency f crosses zero
//! 2f times per second, so `crossings / (2 × window_seconds)` approximates
//! the fundamental. Precise enough to vote in a cluster, never precise
//! enough to stand alone, which its low weight reflects.

use super::{PitchCandidate, PitchEstimator, PitchMethod};
use crate::config::TuningSettings;
use crate::features::segment::Segment;

/// Minimum crossings for a meaningful rate estimate
const MIN_CROSSINGS: usize = 2;

/// Zero-crossing rate strategy
pub struct ZeroCrossingEstimator;

impl PitchEstimator for ZeroCrossingEstimator {
    fn method(&self) -> PitchMethod {
        PitchMethod::ZeroCrossing
    }

    fn estimate(
        &self,
        segment: &Segment,
        _sample_rate: u32,
        settings: &TuningSettings,
    ) -> Option<PitchCandidate> {
        if segment.zero_crossings < MIN_CROSSINGS {
            return None;
        }

        let window_seconds = segment.window_seconds();
        if window_seconds <= 0.0 {
            return None;
        }

        let frequency = segment.zero_crossings as f32 / (2.0 * window_seconds);
        if frequency < settings.min_frequency_hz || frequency > settings.max_frequency_hz {
            return None;
        }

        Some(PitchCandidate::new(frequency, PitchMethod::ZeroCrossing))
    }
}
