//! Melody derivation, duration normalization, and outlier smoothing
//!
//! Turns a per-window pitch track (decoded PCM or byte-activity) into a
//! monophonic note list. Adjacent windows with the same pitch merge into one
//! note, isolated one-window jumps get smoothed back to their neighborhood,
//! and note durations are rescaled so they tile the duration estimate
//! exactly. Rest windows separate runs but hold no time in the final melody.
//!
//! # Algorithm
//! 1. Merge consecutive equal-pitch windows into draft notes
//! 2. Replace single-window outliers (≥ 7 semitones from both neighbors
//!    while the neighbors sit within 2 semitones of each other) with the
//!    nearer neighbor's pitch, then re-merge
//! 3. Scale durations proportionally to window counts so the melody spans
//!    the duration estimate, assigning rounding residue to the final note

use log::debug;

use crate::analysis::profile::NoteEvent;

/// Minimum distance from both neighbors for a one-window note to count as an
/// outlier, in semitones
const OUTLIER_SEMITONES: i16 = 7;
/// Maximum distance between the two neighbors for smoothing to engage, in
/// semitones
const NEIGHBOR_SPREAD_SEMITONES: i16 = 2;

/// One analysis window's resolved pitch and its evidence strength
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowPitch {
    /// Resolved MIDI pitch, or `None` for a rest window
    pub pitch: Option<u8>,
    /// Evidence strength in [0, 1]; ignored for rests
    pub confidence: f32,
}

impl WindowPitch {
    /// A pitched window
    pub fn note(pitch: u8, confidence: f32) -> Self {
        WindowPitch {
            pitch: Some(pitch),
            confidence,
        }
    }

    /// A rest window
    pub fn rest() -> Self {
        WindowPitch {
            pitch: None,
            confidence: 0.0,
        }
    }
}

/// A merged run of equal-pitch windows, before timing is assigned
#[derive(Debug, Clone, Copy)]
struct DraftNote {
    pitch: u8,
    window_count: usize,
    confidence_sum: f32,
    /// True when at least one rest window preceded this run; such runs are
    /// re-articulations and never merge backwards, even after smoothing
    follows_rest: bool,
}

/// Derive the final melody from a per-window pitch track
///
/// `target_duration_seconds` is the duration estimate the melody must span;
/// the produced note durations sum to it exactly and onsets are contiguous.
/// An all-rest or empty track produces an empty melody.
pub fn build_melody(windows: &[WindowPitch], target_duration_seconds: f64) -> Vec<NoteEvent> {
    let mut drafts = merge_windows(windows);
    smooth_outliers(&mut drafts);
    let drafts = remerge(drafts);

    let total_windows: usize = drafts.iter().map(|d| d.window_count).sum();
    if total_windows == 0 || target_duration_seconds <= 0.0 {
        debug!("melody: no pitched windows, empty melody");
        return Vec::new();
    }

    // Step 3: proportional rescale; the last note absorbs rounding residue
    // so the total always lands on the estimate.
    let mut events = Vec::with_capacity(drafts.len());
    let mut onset = 0.0f64;
    for (i, draft) in drafts.iter().enumerate() {
        let duration = if i + 1 == drafts.len() {
            (target_duration_seconds - onset).max(0.0)
        } else {
            target_duration_seconds * draft.window_count as f64 / total_windows as f64
        };
        events.push(NoteEvent {
            midi_pitch: draft.pitch,
            onset_seconds: onset,
            duration_seconds: duration,
            confidence: (draft.confidence_sum / draft.window_count as f32).clamp(0.0, 1.0),
        });
        onset += duration;
    }

    debug!(
        "melody: {} notes over {:.3} s from {} pitched windows",
        events.len(),
        target_duration_seconds,
        total_windows
    );
    events
}

/// Step 1: collapse consecutive equal pitches into runs
///
/// A rest closes the open run, so two equal pitches separated by a rest stay
/// separate notes.
fn merge_windows(windows: &[WindowPitch]) -> Vec<DraftNote> {
    let mut drafts: Vec<DraftNote> = Vec::new();
    let mut run_open = false;
    for window in windows {
        match window.pitch {
            None => run_open = false,
            Some(pitch) => {
                match drafts.last_mut() {
                    Some(last) if run_open && last.pitch == pitch => {
                        last.window_count += 1;
                        last.confidence_sum += window.confidence;
                    }
                    _ => {
                        let follows_rest = !run_open && !drafts.is_empty();
                        drafts.push(DraftNote {
                            pitch,
                            window_count: 1,
                            confidence_sum: window.confidence,
                            follows_rest,
                        });
                    }
                }
                run_open = true;
            }
        }
    }
    drafts
}

/// Step 2a: replace isolated one-window jumps with the nearer neighbor
///
/// Replacements are decided against the original pitches in a single pass so
/// two adjacent outliers cannot cascade into each other.
fn smooth_outliers(drafts: &mut [DraftNote]) {
    if drafts.len() < 3 {
        return;
    }

    let original: Vec<(u8, usize)> = drafts.iter().map(|d| (d.pitch, d.window_count)).collect();
    for i in 1..original.len() - 1 {
        let (pitch, count) = original[i];
        if count != 1 {
            continue;
        }
        let left = i16::from(original[i - 1].0);
        let right = i16::from(original[i + 1].0);
        let center = i16::from(pitch);

        let d_left = (center - left).abs();
        let d_right = (center - right).abs();
        if d_left >= OUTLIER_SEMITONES
            && d_right >= OUTLIER_SEMITONES
            && (left - right).abs() <= NEIGHBOR_SPREAD_SEMITONES
        {
            // Ties resolve to the earlier neighbor.
            let replacement = if d_right < d_left {
                original[i + 1].0
            } else {
                original[i - 1].0
            };
            debug!(
                "melody: smoothing one-window outlier {} -> {}",
                pitch, replacement
            );
            drafts[i].pitch = replacement;
        }
    }
}

/// Step 2b: merge runs that smoothing made adjacent-equal
fn remerge(drafts: Vec<DraftNote>) -> Vec<DraftNote> {
    let mut merged: Vec<DraftNote> = Vec::new();
    for draft in drafts {
        match merged.last_mut() {
            Some(last) if last.pitch == draft.pitch && !draft.follows_rest => {
                last.window_count += draft.window_count;
                last.confidence_sum += draft.confidence_sum;
            }
            _ => merged.push(draft),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes(pitches: &[Option<u8>]) -> Vec<WindowPitch> {
        pitches
            .iter()
            .map(|p| match p {
                Some(pitch) => WindowPitch::note(*pitch, 1.0),
                None => WindowPitch::rest(),
            })
            .collect()
    }

    #[test]
    fn test_adjacent_equal_windows_merge() {
        let windows = notes(&[
            Some(69),
            Some(69),
            Some(72),
            Some(72),
            Some(72),
            None,
            Some(69),
        ]);
        let melody = build_melody(&windows, 6.0);

        assert_eq!(melody.len(), 3);
        assert_eq!(melody[0].midi_pitch, 69);
        assert_eq!(melody[1].midi_pitch, 72);
        assert_eq!(melody[2].midi_pitch, 69);

        // 2, 3, and 1 windows out of 6 pitched windows over 6 seconds.
        assert!((melody[0].duration_seconds - 2.0).abs() < 1e-9);
        assert!((melody[1].duration_seconds - 3.0).abs() < 1e-9);
        assert!((melody[2].duration_seconds - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rest_breaks_a_run_into_two_notes() {
        let windows = notes(&[Some(60), Some(60), None, Some(60)]);
        let melody = build_melody(&windows, 3.0);
        assert_eq!(melody.len(), 2);
        assert_eq!(melody[0].midi_pitch, 60);
        assert_eq!(melody[1].midi_pitch, 60);
    }

    #[test]
    fn test_durations_sum_to_target() {
        let windows = notes(&[
            Some(60),
            Some(62),
            Some(62),
            None,
            Some(64),
            Some(60),
            Some(60),
        ]);
        let target = 7.37;
        let melody = build_melody(&windows, target);

        let total: f64 = melody.iter().map(|n| n.duration_seconds).sum();
        assert!((total - target).abs() < 1e-3);

        // Onsets tile the timeline with no gaps.
        for pair in melody.windows(2) {
            assert!((pair[1].onset_seconds - pair[0].end_seconds()).abs() < 1e-9);
        }
        assert!((melody[0].onset_seconds).abs() < 1e-12);
    }

    #[test]
    fn test_single_window_outlier_smoothed_to_nearer_neighbor() {
        // 74 sits 14 semitones above both neighbors; the neighbors agree.
        let windows = notes(&[Some(60), Some(60), Some(74), Some(60), Some(60)]);
        let melody = build_melody(&windows, 5.0);

        assert_eq!(melody.len(), 1);
        assert_eq!(melody[0].midi_pitch, 60);
        assert!((melody[0].duration_seconds - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_outlier_tie_resolves_to_earlier_neighbor() {
        // 74 is 14 semitones from both neighbors; the tie picks the left one
        // and the remerge collapses everything to a single note.
        let windows = notes(&[Some(60), Some(74), Some(60)]);
        let melody = build_melody(&windows, 3.0);
        assert_eq!(melody.len(), 1);
        assert_eq!(melody[0].midi_pitch, 60);
    }

    #[test]
    fn test_small_jump_not_smoothed() {
        // 5 semitones is below the outlier threshold.
        let windows = notes(&[Some(60), Some(65), Some(60)]);
        let melody = build_melody(&windows, 3.0);
        assert_eq!(melody.len(), 3);
        assert_eq!(melody[1].midi_pitch, 65);
    }

    #[test]
    fn test_disagreeing_neighbors_block_smoothing() {
        // Neighbors 60 and 64 are 4 semitones apart, over the 2-semitone
        // agreement bound.
        let windows = notes(&[Some(60), Some(75), Some(64)]);
        let melody = build_melody(&windows, 3.0);
        assert_eq!(melody.len(), 3);
        assert_eq!(melody[1].midi_pitch, 75);
    }

    #[test]
    fn test_two_window_jump_survives() {
        // Smoothing only touches one-window runs.
        let windows = notes(&[Some(60), Some(60), Some(74), Some(74), Some(60), Some(60)]);
        let melody = build_melody(&windows, 6.0);
        assert_eq!(melody.len(), 3);
        assert_eq!(melody[1].midi_pitch, 74);
    }

    #[test]
    fn test_note_confidence_is_window_mean() {
        let windows = vec![WindowPitch::note(69, 0.8), WindowPitch::note(69, 0.6)];
        let melody = build_melody(&windows, 2.0);
        assert_eq!(melody.len(), 1);
        assert!((melody[0].confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_all_rests_yield_empty_melody() {
        let windows = notes(&[None, None, None]);
        assert!(build_melody(&windows, 3.0).is_empty());
        assert!(build_melody(&[], 3.0).is_empty());
    }

    #[test]
    fn test_smoothing_then_remerge_collapses_neighbors() {
        // After 72 -> 60, three runs become one.
        let windows = notes(&[Some(60), Some(72), Some(61)]);
        // |72-60| = 12, |72-61| = 11, neighbors 1 apart -> replace with 61.
        let melody = build_melody(&windows, 3.0);
        assert_eq!(melody.len(), 2);
        assert_eq!(melody[0].midi_pitch, 60);
        assert_eq!(melody[1].midi_pitch, 61);
    }
}
