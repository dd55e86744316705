//! Container handling: format sniffing, WAV/MP3 parsing, duration estimation
//!
//! The engine never hands raw bytes to a general-purpose decoder. WAV data is
//! parsed and decoded here; compressed containers are only probed for
//! duration metadata, and their payloads feed the byte-activity fallback.

pub mod duration;
pub mod mp3;
pub mod wav;

/// Container classification for an input buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// RIFF/WAVE container carrying PCM samples
    Wav,
    /// MPEG audio stream (Layer III frames, optionally behind an ID3v2 tag)
    Mp3,
    /// Anything else; only the byte-activity path applies
    Unknown,
}

impl AudioFormat {
    /// Map a caller-declared format hint to a container class
    ///
    /// Hints are matched case-insensitively on the common extension spellings;
    /// anything unrecognized maps to `Unknown`.
    pub fn from_hint(hint: &str) -> AudioFormat {
        let hint = hint.trim().trim_start_matches('.');
        if hint.eq_ignore_ascii_case("wav") || hint.eq_ignore_ascii_case("wave") {
            AudioFormat::Wav
        } else if hint.eq_ignore_ascii_case("mp3") || hint.eq_ignore_ascii_case("mpeg") {
            AudioFormat::Mp3
        } else {
            AudioFormat::Unknown
        }
    }

    /// Assumed byte rate for the absolute duration fallback, in bytes/second
    ///
    /// WAV assumes 44.1 kHz stereo 16-bit PCM; MP3 assumes a 128 kbps stream;
    /// unknown containers split the difference.
    pub fn assumed_byte_rate(&self) -> f64 {
        match self {
            AudioFormat::Wav => 176_400.0,
            AudioFormat::Mp3 => 16_000.0,
            AudioFormat::Unknown => 32_000.0,
        }
    }
}

/// Classify an input buffer by signature, falling back to the declared hint
///
/// Content wins over the hint: a RIFF/WAVE signature or an MPEG sync word
/// (possibly behind an ID3v2 tag) decides the class outright. When the bytes
/// match no known signature the declared hint breaks the tie, so a malformed
/// buffer tagged `"wav"` still routes through the WAV demotion chain.
pub fn sniff_format(bytes: &[u8], format_hint: &str) -> AudioFormat {
    if has_riff_wave_signature(bytes) {
        return AudioFormat::Wav;
    }

    if bytes.starts_with(b"ID3") || mp3::find_first_frame(bytes).is_some() {
        return AudioFormat::Mp3;
    }

    let hinted = AudioFormat::from_hint(format_hint);
    if hinted != AudioFormat::Unknown {
        log::debug!(
            "No container signature found, trusting declared hint {:?}",
            hinted
        );
    }
    hinted
}

/// Check for the 12-byte RIFF/WAVE preamble
fn has_riff_wave_signature(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}
