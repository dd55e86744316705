//! Candidate clustering and segment pitch resolution
//!
//! Per segment, candidates from the three estimators are grouped by
//! frequency proximity; each cluster is scored by the sum of its members'
//! weights, and the winning cluster's weighted-mean frequency converts to a
//! clamped MIDI pitch. A segment with no candidates, or no winning cluster,
//! resolves to a rest.

use super::PitchCandidate;
use crate::config::TuningSettings;

/// A segment's resolved pitch with its cluster-agreement evidence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPitch {
    /// MIDI pitch, clamped to the configured floor/ceiling
    pub midi: u8,
    /// Weighted-mean frequency of the winning cluster, in Hz
    pub frequency_hz: f32,
    /// Winning cluster weight over total candidate weight, in (0, 1]
    pub agreement: f32,
}

/// Resolve one segment's candidates to at most one pitch
///
/// Candidates are sorted by frequency and partitioned greedily: a candidate
/// joins the open cluster while it lies within `cluster_tolerance_hz` of the
/// cluster's first member. The cluster with the greatest summed weight wins;
/// ties go to the lower-frequency cluster. Returns `None` for an empty
/// candidate list (a rest).
pub fn resolve_segment(
    candidates: &[PitchCandidate],
    settings: &TuningSettings,
) -> Option<ResolvedPitch> {
    if candidates.is_empty() {
        return None;
    }

    let mut sorted: Vec<&PitchCandidate> = candidates.iter().collect();
    sorted.sort_by(|a, b| {
        a.frequency_hz
            .partial_cmp(&b.frequency_hz)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Greedy proximity partition anchored on each cluster's first member.
    let mut clusters: Vec<Vec<&PitchCandidate>> = Vec::new();
    for candidate in sorted {
        match clusters.last_mut() {
            Some(cluster)
                if candidate.frequency_hz - cluster[0].frequency_hz
                    <= settings.cluster_tolerance_hz =>
            {
                cluster.push(candidate);
            }
            _ => clusters.push(vec![candidate]),
        }
    }

    let total_weight: f32 = candidates.iter().map(|c| c.weight).sum();

    // Highest summed weight wins; the scan order breaks ties toward the
    // lower-frequency cluster.
    let mut winner: Option<(&[&PitchCandidate], f32)> = None;
    for cluster in &clusters {
        let score: f32 = cluster.iter().map(|c| c.weight).sum();
        if winner.map_or(true, |(_, best)| score > best) {
            winner = Some((cluster, score));
        }
    }
    let (members, score) = winner?;

    let weighted_sum: f32 = members.iter().map(|c| c.frequency_hz * c.weight).sum();
    let frequency_hz = weighted_sum / score;

    let midi = frequency_to_midi(frequency_hz, settings);
    let agreement = if total_weight > 0.0 {
        (score / total_weight).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Some(ResolvedPitch {
        midi,
        frequency_hz,
        agreement,
    })
}

/// Convert a frequency to the nearest MIDI pitch, clamped to the configured
/// register
///
/// Standard tuning: MIDI 69 = A4 = 440 Hz, twelve tones per octave.
pub fn frequency_to_midi(frequency_hz: f32, settings: &TuningSettings) -> u8 {
    let midi = 69.0 + 12.0 * (frequency_hz / 440.0).log2();
    let rounded = midi.round();
    if !rounded.is_finite() {
        return settings.midi_floor;
    }
    (rounded as i32).clamp(settings.midi_floor as i32, settings.midi_ceiling as i32) as u8
}
