//! Onset detection over a windowed energy/activity signal
//!
//! An exponential moving average tracks the noise floor; a window whose
//! value rises above `gate_multiplier × floor` is active. Onsets are the
//! rising edges of that state, with hysteresis: after firing, the detector
//! re-arms only once the signal has dipped back below the gate. The same
//! active flags later decide which segments are eligible for pitch
//! estimation.

/// EMA coefficient for the noise floor (slow adaptation)
const FLOOR_ALPHA: f32 = 0.05;

/// Per-window gate state for one pass over a signal
#[derive(Debug, Clone)]
pub struct OnsetAnalysis {
    /// Window indices where a rising edge fired
    pub onsets: Vec<usize>,
    /// Per-window activity flags (above gate)
    pub active: Vec<bool>,
}

impl OnsetAnalysis {
    /// Number of active windows
    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|&&a| a).count()
    }
}

/// Detect onsets in a per-window signal
///
/// The floor is seeded at zero and updated after every window, so the first
/// energetic window always fires and an all-zero signal never does
/// (the comparison is strict). Deterministic for a given signal and
/// multiplier.
///
/// # Arguments
///
/// * `signal` - One non-negative value per window (RMS or byte activity)
/// * `gate_multiplier` - The configured `rms_gate_threshold`
pub fn detect_onsets(signal: &[f32], gate_multiplier: f32) -> OnsetAnalysis {
    let mut onsets = Vec::new();
    let mut active = Vec::with_capacity(signal.len());

    let mut floor = 0.0f32;
    let mut armed = true;

    for (index, &value) in signal.iter().enumerate() {
        let gate = gate_multiplier * floor;
        let is_active = value > gate;

        if is_active && armed {
            onsets.push(index);
            armed = false;
        }
        if !is_active {
            armed = true;
        }

        active.push(is_active);
        floor = FLOOR_ALPHA * value + (1.0 - FLOOR_ALPHA) * floor;
    }

    log::debug!(
        "Onset detection: {} windows, {} active, {} onsets (gate multiplier {:.2})",
        signal.len(),
        active.iter().filter(|&&a| a).count(),
        onsets.len(),
        gate_multiplier
    );

    OnsetAnalysis { onsets, active }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_fires_nothing() {
        let signal = vec![0.0f32; 50];
        let analysis = detect_onsets(&signal, 1.5);
        assert!(analysis.onsets.is_empty());
        assert!(analysis.active.iter().all(|&a| !a));
    }

    #[test]
    fn test_first_energetic_window_fires() {
        let signal = vec![0.7f32; 10];
        let analysis = detect_onsets(&signal, 1.5);
        assert_eq!(analysis.onsets, vec![0]);
        assert!(analysis.active[0]);
    }

    #[test]
    fn test_hysteresis_requires_dip() {
        // Burst, dip, burst: two onsets. Burst staying high: still one.
        let mut signal = vec![0.0f32; 4];
        signal.extend_from_slice(&[0.8, 0.8]); // first burst
        signal.extend_from_slice(&[0.0; 6]); // dip, floor decays
        signal.extend_from_slice(&[0.8, 0.8]); // second burst

        let analysis = detect_onsets(&signal, 1.5);
        assert_eq!(analysis.onsets.len(), 2);
        assert_eq!(analysis.onsets[0], 4);
        assert_eq!(analysis.onsets[1], 12);
    }

    #[test]
    fn test_sustained_level_fires_once() {
        let signal = vec![0.5f32; 60];
        let analysis = detect_onsets(&signal, 1.5);
        assert_eq!(analysis.onsets, vec![0]);
    }

    #[test]
    fn test_periodic_bursts_fire_each_time() {
        // 46 ms windows, burst every 11 windows ~ 120 BPM.
        let mut signal = Vec::new();
        for _ in 0..8 {
            signal.push(0.9);
            signal.extend_from_slice(&[0.001; 10]);
        }

        let analysis = detect_onsets(&signal, 1.5);
        assert_eq!(analysis.onsets.len(), 8);
        let intervals: Vec<usize> = analysis
            .onsets
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect();
        assert!(intervals.iter().all(|&d| d == 11));
    }

    #[test]
    fn test_active_flags_track_gate() {
        let mut signal = vec![0.9f32; 3];
        signal.extend_from_slice(&[0.0; 3]);
        let analysis = detect_onsets(&signal, 1.5);

        assert!(analysis.active[0]);
        assert!(!analysis.active[4]);
        assert_eq!(analysis.active_count(), 3);
    }

    #[test]
    fn test_determinism() {
        let signal: Vec<f32> = (0..200).map(|i| ((i * 37) % 101) as f32 / 101.0).collect();
        let a = detect_onsets(&signal, 1.5);
        let b = detect_onsets(&signal, 1.5);
        assert_eq!(a.onsets, b.onsets);
        assert_eq!(a.active, b.active);
    }
}
