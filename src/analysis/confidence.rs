//! Confidence hint derivation
//!
//! Collapses the per-stage evidence quality into a single hint in `[0.0, 1.0]`
//! that callers can use to rank or filter profiles. The hint is a weighted
//! combination of three signals:
//!
//! 1. **Resolved fraction** (45%): share of energetic windows whose pitch
//!    detectors agreed on a candidate cluster
//! 2. **Mean agreement** (35%): average winning-cluster weight across the
//!    resolved windows
//! 3. **Duration tier** (20%): how trustworthy the duration estimate is
//!    (container metadata beats a frame walk beats a byte-rate guess)
//!
//! Each weight is non-negative, so the hint is monotonic in every input:
//! better evidence can never lower the score.

use crate::io::duration::ConfidenceTier;

/// Weight applied to the fraction of energetic windows that resolved a pitch.
const RESOLVED_FRACTION_WEIGHT: f32 = 0.45;

/// Weight applied to the mean cluster agreement over resolved windows.
const MEAN_AGREEMENT_WEIGHT: f32 = 0.35;

/// Weight applied to the duration confidence tier factor.
const DURATION_TIER_WEIGHT: f32 = 0.20;

/// Combine the evidence-quality signals into a single hint in `[0.0, 1.0]`.
///
/// `resolved_fraction` and `mean_agreement` are clamped into `[0.0, 1.0]`
/// before weighting so degenerate ratios (0/0 mapped to 0.0, or a rounding
/// artifact slightly above 1.0) cannot push the hint out of range.
pub fn confidence_hint(resolved_fraction: f32, mean_agreement: f32, tier: ConfidenceTier) -> f32 {
    let resolved = resolved_fraction.clamp(0.0, 1.0);
    let agreement = mean_agreement.clamp(0.0, 1.0);

    let hint = RESOLVED_FRACTION_WEIGHT * resolved
        + MEAN_AGREEMENT_WEIGHT * agreement
        + DURATION_TIER_WEIGHT * tier.factor();

    log::debug!(
        "Confidence hint: {:.3} (resolved {:.3}, agreement {:.3}, duration tier {})",
        hint,
        resolved,
        agreement,
        tier.label()
    );

    hint.clamp(0.0, 1.0)
}

/// Qualitative bucket for a confidence hint, used in the reasoning trace.
///
/// A hint at or above 0.7 is "high", below 0.5 is "low", and anything in
/// between is "medium".
pub fn confidence_level(hint: f32) -> &'static str {
    if hint >= 0.7 {
        "high"
    } else if hint < 0.5 {
        "low"
    } else {
        "medium"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_evidence_saturates_at_one() {
        let hint = confidence_hint(1.0, 1.0, ConfidenceTier::High);
        assert!((hint - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_no_evidence_keeps_tier_contribution() {
        // 0.20 * 0.3 for a byte-rate guess with nothing resolved
        let hint = confidence_hint(0.0, 0.0, ConfidenceTier::Low);
        assert!((hint - 0.06).abs() < 1e-6);
    }

    #[test]
    fn test_known_weighted_combination() {
        // 0.45 * 0.5 + 0.35 * 0.8 + 0.20 * 0.6 = 0.225 + 0.28 + 0.12 = 0.625
        let hint = confidence_hint(0.5, 0.8, ConfidenceTier::Medium);
        assert!((hint - 0.625).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_inputs_are_clamped() {
        // Clamps to (1.0, 0.0): 0.45 + 0.0 + 0.20 = 0.65
        let hint = confidence_hint(7.0, -3.0, ConfidenceTier::High);
        assert!((hint - 0.65).abs() < 1e-6);

        let floor = confidence_hint(-1.0, -1.0, ConfidenceTier::Low);
        assert!(floor >= 0.0);
    }

    #[test]
    fn test_monotonic_in_resolved_fraction() {
        let low = confidence_hint(0.2, 0.5, ConfidenceTier::Medium);
        let high = confidence_hint(0.8, 0.5, ConfidenceTier::Medium);
        assert!(high > low);
    }

    #[test]
    fn test_monotonic_in_mean_agreement() {
        let low = confidence_hint(0.5, 0.2, ConfidenceTier::Medium);
        let high = confidence_hint(0.5, 0.9, ConfidenceTier::Medium);
        assert!(high > low);
    }

    #[test]
    fn test_monotonic_in_duration_tier() {
        let low = confidence_hint(0.5, 0.5, ConfidenceTier::Low);
        let medium = confidence_hint(0.5, 0.5, ConfidenceTier::Medium);
        let high = confidence_hint(0.5, 0.5, ConfidenceTier::High);
        assert!(low < medium);
        assert!(medium < high);
    }

    #[test]
    fn test_level_thresholds() {
        assert_eq!(confidence_level(0.85), "high");
        assert_eq!(confidence_level(0.7), "high");
        assert_eq!(confidence_level(0.69), "medium");
        assert_eq!(confidence_level(0.5), "medium");
        assert_eq!(confidence_level(0.49), "low");
        assert_eq!(confidence_level(0.0), "low");
    }
}
