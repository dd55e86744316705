//! Channel mixing (interleaved multi-channel to mono)

use crate::io::wav::PcmBuffer;

/// Mix an interleaved PCM buffer down to a mono amplitude series
///
/// Channels are averaged per frame, which keeps amplitudes inside [-1.0, 1.0]
/// for normalized input. Mono input is passed through
/// unchanged; a trailing partial frame is dropped.
///
/// # Arguments
///
/// * `pcm` - Decoded PCM buffer, samples interleaved by channel
///
/// # Returns
///
/// One sample per frame
pub fn mix_to_mono(pcm: &PcmBuffer) -> Vec<f32> {
    let channels = pcm.channels as usize;
    if channels <= 1 {
        return pcm.samples.clone();
    }

    log::debug!(
        "Mixing {} channels down to mono ({} frames)",
        channels,
        pcm.frames()
    );

    pcm.samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(samples: Vec<f32>, channels: u16) -> PcmBuffer {
        PcmBuffer {
            samples,
            sample_rate: 44100,
            bit_depth: 16,
            channels,
        }
    }

    #[test]
    fn test_mono_passthrough() {
        let pcm = buffer(vec![0.1, -0.2, 0.3], 1);
        assert_eq!(mix_to_mono(&pcm), vec![0.1, -0.2, 0.3]);
    }

    #[test]
    fn test_stereo_average() {
        let pcm = buffer(vec![1.0, 0.0, 0.5, -0.5, -1.0, -1.0], 2);
        let mono = mix_to_mono(&pcm);

        assert_eq!(mono.len(), 3);
        assert!((mono[0] - 0.5).abs() < 1e-6);
        assert!((mono[1] - 0.0).abs() < 1e-6);
        assert!((mono[2] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_partial_frame_dropped() {
        let pcm = buffer(vec![0.2, 0.4, 0.6], 2);
        let mono = mix_to_mono(&pcm);
        assert_eq!(mono.len(), 1);
        assert!((mono[0] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_quad_average() {
        let pcm = buffer(vec![0.4, 0.4, 0.4, 0.4, -0.8, 0.0, 0.0, 0.0], 4);
        let mono = mix_to_mono(&pcm);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.4).abs() < 1e-6);
        assert!((mono[1] + 0.2).abs() < 1e-6);
    }
}
