//! Layered duration estimation
//!
//! Resolves a duration for any byte buffer by trying, in order: WAV header
//! fields, MP3 Xing/Info metadata, MP3 VBRI metadata, a sequential frame
//! walk, and finally byte length over an assumed byte rate. Each layer that
//! fails demotes to the next; the byte-rate fallback cannot fail, so the
//! estimator is total.

use super::mp3::{self, HeaderScan};
use super::{sniff_format, wav, AudioFormat};
use serde::{Deserialize, Serialize};

/// Floor applied to the byte-rate fallback so estimates stay positive
const MIN_FALLBACK_SECONDS: f64 = 0.1;

/// Which estimation layer produced the duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DurationSource {
    /// Container metadata: WAV header fields or an MP3 Xing/VBRI header
    Metadata,
    /// Sequential MP3 frame walk
    FrameWalk,
    /// Byte length over an assumed format byte rate
    ByteRate,
}

impl DurationSource {
    /// Short human-readable label for log and trace text
    pub fn label(&self) -> &'static str {
        match self {
            DurationSource::Metadata => "container metadata",
            DurationSource::FrameWalk => "frame walk",
            DurationSource::ByteRate => "byte-rate heuristic",
        }
    }
}

/// Confidence tier implied by the duration source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    /// Byte-rate guess
    Low,
    /// Frame walk over possibly damaged data
    Medium,
    /// Declared container metadata
    High,
}

impl ConfidenceTier {
    /// Scalar used when folding the tier into the confidence hint
    pub fn factor(&self) -> f32 {
        match self {
            ConfidenceTier::High => 1.0,
            ConfidenceTier::Medium => 0.6,
            ConfidenceTier::Low => 0.3,
        }
    }

    /// Short human-readable label for log and trace text
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

/// A resolved duration, always present and always positive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationEstimate {
    /// Estimated duration in seconds (> 0)
    pub seconds: f64,
    /// Layer that produced the estimate
    pub source: DurationSource,
    /// Confidence tier implied by the source
    pub tier: ConfidenceTier,
}

impl DurationEstimate {
    fn metadata(seconds: f64) -> Self {
        Self {
            seconds,
            source: DurationSource::Metadata,
            tier: ConfidenceTier::High,
        }
    }

    fn frame_walk(seconds: f64) -> Self {
        Self {
            seconds,
            source: DurationSource::FrameWalk,
            tier: ConfidenceTier::Medium,
        }
    }

    fn byte_rate(byte_count: usize, format: AudioFormat) -> Self {
        let seconds = (byte_count as f64 / format.assumed_byte_rate()).max(MIN_FALLBACK_SECONDS);
        Self {
            seconds,
            source: DurationSource::ByteRate,
            tier: ConfidenceTier::Low,
        }
    }
}

/// Estimate the duration of an audio buffer
///
/// Total over all inputs: malformed headers, garbage bytes, and the empty
/// buffer all resolve through the byte-rate fallback. The returned estimate
/// is tagged with the layer that produced it.
pub fn estimate(bytes: &[u8], format_hint: &str) -> DurationEstimate {
    let format = sniff_format(bytes, format_hint);
    estimate_for_format(bytes, format)
}

/// Estimate duration for an already-classified buffer
pub(crate) fn estimate_for_format(bytes: &[u8], format: AudioFormat) -> DurationEstimate {
    // Layer 1: WAV header fields
    if format == AudioFormat::Wav {
        match wav::parse_header(bytes) {
            Ok(header) => {
                let seconds = header.duration_seconds();
                if seconds > 0.0 {
                    log::debug!("Duration from WAV header: {:.3}s", seconds);
                    return DurationEstimate::metadata(seconds);
                }
                log::debug!("WAV header implies zero duration, demoting");
            }
            Err(err) => {
                log::debug!("WAV header rejected ({}), demoting", err);
            }
        }
    }

    // Layers 2-4 only apply where a frame header can be located at all.
    if let Some(first_frame) = mp3::find_first_frame(bytes) {
        if let Some(header) = mp3::parse_frame_header(&bytes[first_frame..]) {
            // Layer 2: Xing/Info
            match mp3::scan_xing(bytes, first_frame, &header) {
                HeaderScan::Found(seconds) if seconds > 0.0 => {
                    log::debug!("Duration from Xing header: {:.3}s", seconds);
                    return DurationEstimate::metadata(seconds);
                }
                HeaderScan::Found(_) | HeaderScan::Malformed => {
                    log::debug!("Xing header unusable, demoting");
                }
                HeaderScan::NotFound => {}
            }

            // Layer 3: VBRI
            match mp3::scan_vbri(bytes, first_frame, &header) {
                HeaderScan::Found(seconds) if seconds > 0.0 => {
                    log::debug!("Duration from VBRI header: {:.3}s", seconds);
                    return DurationEstimate::metadata(seconds);
                }
                HeaderScan::Found(_) | HeaderScan::Malformed => {
                    log::debug!("VBRI header unusable, demoting");
                }
                HeaderScan::NotFound => {}
            }

            // Layer 4: frame walk
            if let Some(seconds) = mp3::walk_frames(bytes, first_frame) {
                if seconds > 0.0 {
                    log::debug!("Duration from frame walk: {:.3}s", seconds);
                    return DurationEstimate::frame_walk(seconds);
                }
            }
        }
    }

    // Layer 5: absolute fallback
    let estimate = DurationEstimate::byte_rate(bytes.len(), format);
    log::debug!(
        "Duration from byte-rate fallback: {:.3}s ({} bytes as {:?})",
        estimate.seconds,
        bytes.len(),
        format
    );
    estimate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_wav_header(sample_rate: u32, channels: u16, bits: u16, data_len: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * channels as u32 * bits as u32 / 8).to_le_bytes());
        out.extend_from_slice(&(channels * bits / 8).to_le_bytes());
        out.extend_from_slice(&bits.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out.extend_from_slice(&vec![0u8; data_len as usize]);
        out
    }

    fn mp3_frame() -> Vec<u8> {
        let mut frame = vec![0u8; 417];
        frame[0] = 0xFF;
        frame[1] = 0xFB;
        frame[2] = 0x90;
        frame[3] = 0xC0;
        frame
    }

    #[test]
    fn test_wav_header_duration_exact() {
        // 2 seconds of 44.1 kHz 16-bit mono
        let wav = build_wav_header(44100, 1, 16, 44100 * 2 * 2);
        let estimate = estimate(&wav, "wav");

        assert_eq!(estimate.source, DurationSource::Metadata);
        assert_eq!(estimate.tier, ConfidenceTier::High);
        assert!((estimate.seconds - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_wav_falls_to_byte_rate() {
        let bytes = [0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A];
        let estimate = estimate(&bytes, "wav");

        assert_eq!(estimate.source, DurationSource::ByteRate);
        assert_eq!(estimate.tier, ConfidenceTier::Low);
        assert!(estimate.seconds > 0.0);
    }

    #[test]
    fn test_empty_input_floors_at_positive() {
        let estimate = estimate(&[], "");
        assert_eq!(estimate.source, DurationSource::ByteRate);
        assert!((estimate.seconds - MIN_FALLBACK_SECONDS).abs() < 1e-12);
    }

    #[test]
    fn test_xing_metadata_wins_over_walk() {
        let mut bytes = mp3_frame();
        bytes[21..25].copy_from_slice(b"Xing");
        bytes[25..29].copy_from_slice(&1u32.to_be_bytes());
        bytes[29..33].copy_from_slice(&2297u32.to_be_bytes());
        // Append walkable frames that would imply a far shorter duration.
        bytes.extend_from_slice(&mp3_frame());
        bytes.extend_from_slice(&mp3_frame());

        let estimate = estimate(&bytes, "mp3");
        assert_eq!(estimate.source, DurationSource::Metadata);
        assert!((estimate.seconds - 60.0).abs() < 0.05);
    }

    #[test]
    fn test_vbri_metadata_wins_over_walk() {
        let mut bytes = mp3_frame();
        bytes[36..40].copy_from_slice(b"VBRI");
        bytes[40..46].copy_from_slice(&[0, 1, 0, 0, 0, 0]);
        bytes[46..50].copy_from_slice(&1_000_000u32.to_be_bytes());
        bytes[50..54].copy_from_slice(&1149u32.to_be_bytes());
        bytes.extend_from_slice(&mp3_frame());

        let estimate = estimate(&bytes, "mp3");
        assert_eq!(estimate.source, DurationSource::Metadata);
        assert!((estimate.seconds - 30.0).abs() < 0.05);
    }

    #[test]
    fn test_plain_stream_uses_frame_walk() {
        let mut bytes = Vec::new();
        for _ in 0..20 {
            bytes.extend_from_slice(&mp3_frame());
        }

        let estimate = estimate(&bytes, "mp3");
        assert_eq!(estimate.source, DurationSource::FrameWalk);
        assert_eq!(estimate.tier, ConfidenceTier::Medium);
        let expected = 20.0 * 1152.0 / 44100.0;
        assert!((estimate.seconds - expected).abs() < 1e-9);
    }

    #[test]
    fn test_unsupported_wav_width_demotes() {
        let mut wav = build_wav_header(44100, 1, 16, 1000);
        wav[34] = 12; // bits-per-sample
        let estimate = estimate(&wav, "wav");
        assert_eq!(estimate.source, DurationSource::ByteRate);
    }

    #[test]
    fn test_byte_rate_scales_with_format() {
        let bytes = vec![0xA5u8; 320_000];
        let as_mp3 = DurationEstimate::byte_rate(bytes.len(), AudioFormat::Mp3);
        let as_wav = DurationEstimate::byte_rate(bytes.len(), AudioFormat::Wav);

        assert!((as_mp3.seconds - 20.0).abs() < 1e-9);
        assert!(as_wav.seconds < as_mp3.seconds);
    }

    #[test]
    fn test_tier_factor_ordering() {
        assert!(ConfidenceTier::High.factor() > ConfidenceTier::Medium.factor());
        assert!(ConfidenceTier::Medium.factor() > ConfidenceTier::Low.factor());
        assert!(ConfidenceTier::Low < ConfidenceTier::Medium);
        assert!(ConfidenceTier::Medium < ConfidenceTier::High);
    }
}
