//! Spectral-peak pitch estimation
//!
//! The highest-weighted estimator. Fixed convention: the 2048-sample window
//! is Hann-weighted, zero-padded to a 4096-point FFT, and the magnitude
//! spectrum is searched only inside the configured frequency band. The
//! dominant bin must clear a multiple of the band's median magnitude
//! (a noise-floor test), and the final frequency is refined by parabolic
//! interpolation across the peak bin's neighbors.

use super::{PitchCandidate, PitchEstimator, PitchMethod, EPSILON};
use crate::config::TuningSettings;
use crate::features::segment::Segment;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Transform size; segment windows are zero-padded up to this
const FFT_SIZE: usize = 4096;

/// The peak must exceed this multiple of the in-band median magnitude
const PEAK_MEDIAN_MULTIPLE: f32 = 6.0;

/// Bounded frequency-domain peak search strategy
pub struct SpectralPeakEstimator;

impl PitchEstimator for SpectralPeakEstimator {
    fn method(&self) -> PitchMethod {
        PitchMethod::SpectralPeak
    }

    fn estimate(
        &self,
        segment: &Segment,
        sample_rate: u32,
        settings: &TuningSettings,
    ) -> Option<PitchCandidate> {
        if sample_rate == 0 || segment.samples.is_empty() {
            return None;
        }
        let sr = sample_rate as f32;

        let magnitudes = magnitude_spectrum(&segment.samples);

        // Band limits in bins; bin 0 (DC) is never a pitch.
        let bin_hz = sr / FFT_SIZE as f32;
        let lo = ((settings.min_frequency_hz / bin_hz).ceil() as usize).max(1);
        let hi = ((settings.max_frequency_hz / bin_hz).floor() as usize)
            .min(magnitudes.len().saturating_sub(2));
        if lo >= hi {
            return None;
        }

        let band = &magnitudes[lo..=hi];
        let median = median_magnitude(band);

        let (peak_offset, peak_value) = band
            .iter()
            .copied()
            .enumerate()
            .fold((0usize, 0.0f32), |(bi, bv), (i, v)| {
                if v > bv {
                    (i, v)
                } else {
                    (bi, bv)
                }
            });

        if peak_value <= EPSILON || peak_value <= PEAK_MEDIAN_MULTIPLE * median {
            return None;
        }

        let peak_bin = lo + peak_offset;
        let refined_bin = parabolic_refine_bin(&magnitudes, peak_bin);
        let frequency = refined_bin * bin_hz;
        if frequency < settings.min_frequency_hz || frequency > settings.max_frequency_hz {
            return None;
        }

        Some(PitchCandidate::new(frequency, PitchMethod::SpectralPeak))
    }
}

/// Hann-windowed, zero-padded magnitude spectrum (bins 0..FFT_SIZE/2)
fn magnitude_spectrum(samples: &[f32]) -> Vec<f32> {
    let window_len = samples.len().min(FFT_SIZE);

    let mut buffer: Vec<Complex<f32>> = Vec::with_capacity(FFT_SIZE);
    for (i, &sample) in samples.iter().take(window_len).enumerate() {
        // Hann window over the occupied portion of the transform.
        let hann = 0.5
            * (1.0
                - (2.0 * std::f32::consts::PI * i as f32 / (window_len.max(2) - 1) as f32).cos());
        buffer.push(Complex::new(sample * hann, 0.0));
    }
    buffer.resize(FFT_SIZE, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(FFT_SIZE);
    fft.process(&mut buffer);

    buffer[..FFT_SIZE / 2].iter().map(|c| c.norm()).collect()
}

/// Median of a magnitude band
fn median_magnitude(band: &[f32]) -> f32 {
    let mut sorted = band.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Parabolic interpolation across a spectral peak for sub-bin resolution
fn parabolic_refine_bin(magnitudes: &[f32], bin: usize) -> f32 {
    if bin == 0 || bin + 1 >= magnitudes.len() {
        return bin as f32;
    }

    let left = magnitudes[bin - 1];
    let center = magnitudes[bin];
    let right = magnitudes[bin + 1];

    let denom = left - 2.0 * center + right;
    if denom.abs() <= EPSILON {
        return bin as f32;
    }

    let delta = 0.5 * (left - right) / denom;
    if !delta.is_finite() || delta.abs() > 1.0 {
        return bin as f32;
    }

    bin as f32 + delta
}
