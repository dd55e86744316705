//! Inter-onset-interval clustering to a single BPM
//!
//! Intervals between successive onsets are grouped by proximity; the densest
//! group's median interval becomes the beat period. Sparse onset evidence
//! (fewer than two onsets) falls back to the fixed low-confidence default.

use super::{TempoEstimate, MAX_BPM, MIN_BPM};

/// An interval joins a cluster while it stays within this factor of the
/// cluster's smallest member
const CLUSTER_BAND: f64 = 1.25;

/// Estimate BPM from onset window indices
///
/// # Arguments
///
/// * `onsets` - Window indices of detected onsets, ascending
/// * `window_seconds` - Duration of one window
///
/// # Returns
///
/// A [`TempoEstimate`]; `defaulted` is set when fewer than two onsets were
/// available or every interval degenerated to zero.
pub fn estimate_bpm(onsets: &[usize], window_seconds: f64) -> TempoEstimate {
    if onsets.len() < 2 || window_seconds <= 0.0 {
        log::debug!(
            "Too few onsets for tempo inference ({}), using default",
            onsets.len()
        );
        return TempoEstimate::default_low_confidence(onsets.len());
    }

    let intervals: Vec<f64> = onsets
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) as f64 * window_seconds)
        .filter(|&ioi| ioi > 0.0)
        .collect();

    if intervals.is_empty() {
        return TempoEstimate::default_low_confidence(onsets.len());
    }

    let period = densest_cluster_median(&intervals);
    let bpm = (60.0 / period) as f32;
    let clamped = bpm.clamp(MIN_BPM, MAX_BPM);

    log::debug!(
        "IOI clustering: {} intervals, period {:.3}s -> {:.1} BPM (clamped {:.1})",
        intervals.len(),
        period,
        bpm,
        clamped
    );

    TempoEstimate {
        bpm: clamped,
        onset_count: onsets.len(),
        defaulted: false,
    }
}

/// Median interval of the most populated proximity cluster
///
/// Intervals are sorted and partitioned greedily: a new cluster opens when
/// an interval exceeds `CLUSTER_BAND ×` the current cluster's smallest
/// member. Ties between equally populated clusters go to the shorter
/// period, which favors the beat over its multiples.
fn densest_cluster_median(intervals: &[f64]) -> f64 {
    let mut sorted = intervals.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut best_start = 0usize;
    let mut best_len = 0usize;

    let mut start = 0usize;
    for i in 0..=sorted.len() {
        let closes = i == sorted.len() || sorted[i] > sorted[start] * CLUSTER_BAND;
        if closes {
            let len = i - start;
            if len > best_len {
                best_len = len;
                best_start = start;
            }
            start = i;
        }
    }

    median_of_sorted(&sorted[best_start..best_start + best_len])
}

fn median_of_sorted(values: &[f64]) -> f64 {
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}
