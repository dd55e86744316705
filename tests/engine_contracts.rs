//! Integration tests for the public analysis contracts

use std::io::Cursor;

use cantus_dsp::{analyze, estimate_duration, DurationSource, TuningSettings};

/// Render mono f32 samples into an in-memory 16-bit WAV buffer
fn wav_bytes(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("WAV writer");
        for &sample in samples {
            let value = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
            writer.write_sample(value).expect("write sample");
        }
        writer.finalize().expect("finalize WAV");
    }
    cursor.into_inner()
}

fn sine(frequency: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
    let count = (seconds * sample_rate as f32) as usize;
    (0..count)
        .map(|i| (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate as f32).sin())
        .collect()
}

/// Short tone bursts separated by silence, spaced for the given BPM
fn click_track(bpm: f32, beats: usize, sample_rate: u32) -> Vec<f32> {
    let beat_samples = (60.0 / bpm * sample_rate as f32) as usize;
    let burst_samples = sample_rate as usize / 10;
    let mut samples = vec![0.0f32; beat_samples * beats];
    for beat in 0..beats {
        let start = beat * beat_samples;
        for i in 0..burst_samples.min(samples.len() - start) {
            samples[start + i] =
                (2.0 * std::f32::consts::PI * 880.0 * i as f32 / sample_rate as f32).sin();
        }
    }
    samples
}

/// A minimal MPEG1 Layer III frame: 128 kbps, 44.1 kHz, no padding
fn mp3_frame() -> Vec<u8> {
    let mut frame = vec![0u8; 417];
    frame[0] = 0xFF;
    frame[1] = 0xFB;
    frame[2] = 0x90;
    frame[3] = 0xC0;
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_inputs_give_bit_identical_profiles() {
        let settings = TuningSettings::default();
        let wav = wav_bytes(&sine(440.0, 44100, 2.0), 44100);

        let first = analyze(&wav, "wav", &settings);
        let second = analyze(&wav, "wav", &settings);
        assert_eq!(first, second, "PCM-path profiles must be bit-identical");

        let garbage: Vec<u8> = (0..4096).map(|i| (i * 31 % 251) as u8).collect();
        let first = analyze(&garbage, "", &settings);
        let second = analyze(&garbage, "", &settings);
        assert_eq!(first, second, "byte-path profiles must be bit-identical");
    }

    #[test]
    fn test_container_metadata_outranks_weaker_sources() {
        // Well-formed WAV: header fields, high tier, exact seconds.
        let wav = wav_bytes(&sine(440.0, 44100, 2.0), 44100);
        let estimate = estimate_duration(&wav, "wav");
        assert_eq!(estimate.source, DurationSource::Metadata);
        assert!((estimate.seconds - 2.0).abs() < 1e-3);

        // Headerless MP3 frames: the frame walk takes over.
        let mut stream = Vec::new();
        for _ in 0..20 {
            stream.extend_from_slice(&mp3_frame());
        }
        let estimate = estimate_duration(&stream, "mp3");
        assert_eq!(estimate.source, DurationSource::FrameWalk);

        // A Xing header on the first frame promotes back to metadata.
        let mut tagged = mp3_frame();
        tagged[21..25].copy_from_slice(b"Xing");
        tagged[25..29].copy_from_slice(&1u32.to_be_bytes());
        tagged[29..33].copy_from_slice(&2297u32.to_be_bytes());
        for _ in 0..3 {
            tagged.extend_from_slice(&mp3_frame());
        }
        let estimate = estimate_duration(&tagged, "mp3");
        assert_eq!(estimate.source, DurationSource::Metadata);
        assert!((estimate.seconds - 60.0).abs() < 0.1);

        // Garbage: only the byte-rate guess remains.
        let estimate = estimate_duration(&[0x42u8; 500], "");
        assert_eq!(estimate.source, DurationSource::ByteRate);
    }

    #[test]
    fn test_range_invariants_hold_across_inputs() {
        let settings = TuningSettings::default();
        let inputs: Vec<Vec<u8>> = vec![
            wav_bytes(&sine(440.0, 44100, 2.0), 44100),
            wav_bytes(&click_track(120.0, 8, 44100), 44100),
            (0..20_000).map(|i| (i * 37 % 256) as u8).collect(),
            vec![0xA5; 4096],
            Vec::new(),
        ];

        for bytes in &inputs {
            let profile = analyze(bytes, "", &settings);

            assert!(
                (40.0..=240.0).contains(&profile.tempo_bpm),
                "BPM {} out of range for {} bytes",
                profile.tempo_bpm,
                bytes.len()
            );
            assert!(
                (0.0..=1.0).contains(&profile.confidence_hint),
                "confidence hint {} out of range",
                profile.confidence_hint
            );
            assert!(profile.duration.seconds > 0.0);
            for note in &profile.melody {
                assert!(
                    (settings.midi_floor..=settings.midi_ceiling).contains(&note.midi_pitch),
                    "pitch {} outside configured register",
                    note.midi_pitch
                );
                assert!((0.0..=1.0).contains(&note.confidence));
                assert!(note.duration_seconds > 0.0);
            }
        }
    }

    #[test]
    fn test_melody_span_matches_duration_estimate() {
        let settings = TuningSettings::default();
        let wav = wav_bytes(&sine(440.0, 44100, 2.0), 44100);
        let profile = analyze(&wav, "wav", &settings);

        assert!(!profile.melody.is_empty());
        let total: f64 = profile.melody.iter().map(|n| n.duration_seconds).sum();
        assert!(
            (total - profile.duration.seconds).abs() < 1e-3,
            "melody spans {:.6}s but the estimate is {:.6}s",
            total,
            profile.duration.seconds
        );

        // Onsets stay contiguous: each note starts where the last one ended.
        for pair in profile.melody.windows(2) {
            assert!((pair[1].onset_seconds - pair[0].end_seconds()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_silence_yields_empty_melody_with_trace_entry() {
        let settings = TuningSettings::default();
        let wav = wav_bytes(&vec![0.0f32; 44100 * 3], 44100);
        let profile = analyze(&wav, "wav", &settings);

        assert!(profile.melody.is_empty(), "silence must produce no notes");
        assert!(
            profile
                .reasoning
                .iter()
                .any(|entry| entry.contains("no melodic evidence")),
            "trace must state the lack of melodic evidence: {:?}",
            profile.reasoning
        );
        // The duration is still trustworthy; only the melodic terms are zero.
        assert_eq!(profile.duration.source, DurationSource::Metadata);
        assert!((profile.duration.seconds - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_sparse_melody_skips_calibration_unchanged() {
        let settings = TuningSettings::default();
        let wav = wav_bytes(&sine(440.0, 44100, 2.0), 44100);
        let profile = analyze(&wav, "wav", &settings);

        // One sustained note is far below the calibration gate.
        assert!(
            profile
                .reasoning
                .iter()
                .any(|entry| entry.starts_with("calibration: skipped")),
            "trace must record the skip: {:?}",
            profile.reasoning
        );
        // The pitch passes through untouched by the skipped stage.
        assert_eq!(profile.melody[0].midi_pitch, 69);
    }

    #[test]
    fn test_two_second_concert_a() {
        let settings = TuningSettings::default();
        let wav = wav_bytes(&sine(440.0, 44100, 2.0), 44100);
        let profile = analyze(&wav, "wav", &settings);

        assert_eq!(
            profile.melody.len(),
            1,
            "a sustained tone merges into one note: {:?}",
            profile.melody
        );
        let note = &profile.melody[0];
        assert!(
            (68..=70).contains(&note.midi_pitch),
            "expected ~MIDI 69, got {}",
            note.midi_pitch
        );
        assert!((note.duration_seconds - 2.0).abs() < 0.01);
        assert!(
            profile.confidence_hint >= 0.5,
            "clean decoded evidence should score at least 0.5, got {}",
            profile.confidence_hint
        );

        println!(
            "Concert A test: pitch={}, duration={:.3}s, hint={:.2}",
            note.midi_pitch, note.duration_seconds, profile.confidence_hint
        );
    }

    #[test]
    fn test_malformed_wav_degrades_without_raising() {
        let settings = TuningSettings::default();
        let bytes = [0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A];
        let profile = analyze(&bytes, "wav", &settings);

        assert_eq!(profile.duration.source, DurationSource::ByteRate);
        assert!(profile.melody.is_empty());
        assert!(profile.confidence_hint < 0.5);
        assert_eq!(profile.byte_count, 10);
        assert!(
            profile
                .reasoning
                .iter()
                .any(|entry| entry.contains("no melodic evidence"))
        );
    }

    #[test]
    fn test_distinct_inputs_get_distinct_fingerprints() {
        let settings = TuningSettings::default();
        let first = analyze(&[1u8; 2048], "", &settings);
        let second = analyze(&[2u8; 2048], "", &settings);

        assert_eq!(first.fingerprint.len(), 16);
        assert!(first.fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first.fingerprint, second.fingerprint);
    }

    #[test]
    fn test_distinct_tones_get_distinct_melodies() {
        let settings = TuningSettings::default();
        let a4 = analyze(&wav_bytes(&sine(440.0, 44100, 2.0), 44100), "wav", &settings);
        let c5 = analyze(
            &wav_bytes(&sine(523.25, 44100, 2.0), 44100),
            "wav",
            &settings,
        );

        assert_ne!(a4.fingerprint, c5.fingerprint);
        assert_ne!(
            a4.melody[0].midi_pitch, c5.melody[0].midi_pitch,
            "different tones must sketch different melodies"
        );
        assert_eq!(c5.melody[0].midi_pitch, 72);
    }

    #[test]
    fn test_click_track_tempo_lands_near_truth() {
        let settings = TuningSettings::default();
        let wav = wav_bytes(&click_track(120.0, 8, 44100), 44100);
        let profile = analyze(&wav, "wav", &settings);

        // Window quantization costs a couple of BPM either way.
        assert!(
            (110.0..=130.0).contains(&profile.tempo_bpm),
            "expected ~120 BPM, got {:.1}",
            profile.tempo_bpm
        );
        assert!(
            !profile
                .reasoning
                .iter()
                .any(|entry| entry.contains("defaulting")),
            "a regular click track must not fall back to the default tempo"
        );

        println!("Click track test: BPM={:.1}", profile.tempo_bpm);
    }

    #[test]
    fn test_byte_path_announces_itself() {
        let settings = TuningSettings::default();
        let mut stream = Vec::new();
        for _ in 0..40 {
            stream.extend_from_slice(&mp3_frame());
        }
        let profile = analyze(&stream, "mp3", &settings);

        assert!(
            profile
                .reasoning
                .iter()
                .any(|entry| entry.contains("byte activity")),
            "byte-path evidence must be named in the trace: {:?}",
            profile.reasoning
        );
        // Pseudo-melody notes never reach PCM-level confidence.
        for note in &profile.melody {
            assert!(note.confidence < 0.35);
        }
    }

    #[test]
    fn test_trace_opens_with_settings_and_closes_with_confidence() {
        let settings = TuningSettings::default();
        let profile = analyze(&[7u8; 1000], "", &settings);

        let first = profile.reasoning.first().expect("trace never empty");
        let last = profile.reasoning.last().expect("trace never empty");
        assert!(first.starts_with("tuning:"), "got {:?}", first);
        assert!(last.starts_with("confidence:"), "got {:?}", last);
    }

    #[test]
    fn test_empty_input_is_total_and_lowest_confidence() {
        let settings = TuningSettings::default();
        let profile = analyze(&[], "", &settings);

        assert!(profile.melody.is_empty());
        assert_eq!(profile.byte_count, 0);
        assert_eq!(profile.duration.source, DurationSource::ByteRate);
        assert!((profile.duration.seconds - 0.1).abs() < 1e-9);
        assert!(
            profile
                .reasoning
                .iter()
                .any(|entry| entry.contains("empty byte stream")),
            "empty input needs its explicit trace entry: {:?}",
            profile.reasoning
        );
        assert!(profile.confidence_hint < 0.1);

        let estimate = estimate_duration(&[], "");
        assert!((estimate.seconds - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_profile_serializes_round_trip() {
        let settings = TuningSettings::default();
        let wav = wav_bytes(&sine(440.0, 44100, 2.0), 44100);
        let profile = analyze(&wav, "wav", &settings);

        let json = serde_json::to_string(&profile).expect("profile serializes");
        let back: cantus_dsp::AudioAnalysisProfile =
            serde_json::from_str(&json).expect("profile deserializes");
        assert_eq!(profile, back);
    }
}
