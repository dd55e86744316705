//! Autocorrelation pitch estimation
//!
//! Finds the fundamental period of a segment via FFT-accelerated
//! autocorrelation: `ACF = IFFT(|FFT(signal)|²)`, computed in O(n log n).
//! The best lag inside the configured frequency band is accepted only when
//! its normalized correlation clears a minimum, and is refined by parabolic
//! interpolation for sub-sample period resolution.
//!
//! # Reference
//!
//! Rabiner, L. R. (1977). On the Use of Autocorrelation Analysis for Pitch
//! Detection. *IEEE Transactions on Acoustics, Speech, and Signal
//! Processing*, 25(1), 24-33.

use super::{PitchCandidate, PitchEstimator, PitchMethod, EPSILON};
use crate::config::TuningSettings;
use crate::features::segment::Segment;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Minimum normalized correlation for a lag to count as periodic evidence
const MIN_NORMALIZED_CORRELATION: f32 = 0.3;

/// Autocorrelation lag-search strategy
pub struct AutocorrelationEstimator;

impl PitchEstimator for AutocorrelationEstimator {
    fn method(&self) -> PitchMethod {
        PitchMethod::Autocorrelation
    }

    fn estimate(
        &self,
        segment: &Segment,
        sample_rate: u32,
        settings: &TuningSettings,
    ) -> Option<PitchCandidate> {
        if sample_rate == 0 || segment.samples.len() < 4 {
            return None;
        }
        let sr = sample_rate as f32;

        // Convert the frequency band to a lag band: lag = sr / f.
        let min_lag = ((sr / settings.max_frequency_hz).ceil() as usize).max(2);
        let max_lag = ((sr / settings.min_frequency_hz).floor() as usize)
            .min(segment.samples.len() - 1);
        if min_lag >= max_lag {
            return None;
        }

        let acf = compute_autocorrelation_fft(&segment.samples);

        let energy = acf[0];
        if energy <= EPSILON {
            return None;
        }

        // Best lag in band by raw ACF value.
        let mut best_lag = 0usize;
        let mut best_value = 0.0f32;
        for lag in min_lag..=max_lag {
            if acf[lag] > best_value {
                best_value = acf[lag];
                best_lag = lag;
            }
        }

        if best_lag == 0 || best_value / energy < MIN_NORMALIZED_CORRELATION {
            return None;
        }

        let refined_lag = parabolic_refine(&acf, best_lag);
        let frequency = sr / refined_lag;
        if frequency < settings.min_frequency_hz || frequency > settings.max_frequency_hz {
            return None;
        }

        Some(PitchCandidate::new(frequency, PitchMethod::Autocorrelation))
    }
}

/// Compute autocorrelation using FFT acceleration
///
/// Uses the identity `ACF = IFFT(|FFT(signal)|²)` with zero-padding to the
/// next power of two past 2n to avoid circular wrap-around.
fn compute_autocorrelation_fft(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    let fft_size = (2 * n).next_power_of_two();

    let mut buffer: Vec<Complex<f32>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    buffer.resize(fft_size, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    fft.process(&mut buffer);

    for x in &mut buffer {
        *x = *x * x.conj();
    }

    let ifft = planner.plan_fft_inverse(fft_size);
    ifft.process(&mut buffer);

    let scale = 1.0 / (fft_size as f32);
    buffer[..n]
        .iter()
        .map(|x| (x.re * scale).max(0.0))
        .collect()
}

/// Parabolic interpolation around an ACF peak for sub-sample lag resolution
///
/// Fits a parabola through the peak and its neighbors. Falls back to the
/// integer lag when the peak sits at a boundary or the curvature degenerates.
fn parabolic_refine(acf: &[f32], lag: usize) -> f32 {
    if lag == 0 || lag + 1 >= acf.len() {
        return lag as f32;
    }

    let left = acf[lag - 1];
    let center = acf[lag];
    let right = acf[lag + 1];

    let denom = left - 2.0 * center + right;
    if denom.abs() <= EPSILON {
        return lag as f32;
    }

    let delta = 0.5 * (left - right) / denom;
    if !delta.is_finite() || delta.abs() > 1.0 {
        return lag as f32;
    }

    lag as f32 + delta
}
