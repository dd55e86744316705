//! WAV container parsing and PCM decoding
//!
//! Walks the RIFF chunk list for `fmt ` and `data`, validates the sample
//! width against the supported set {8, 16, 24, 32}, and decodes integer or
//! 32-bit float PCM into a normalized f32 buffer. Parsing is strict about
//! structure but tolerant of a truncated final `data` chunk, which is common
//! in interrupted uploads.

use crate::error::AnalysisError;

/// WAVE format codes this parser decodes
const FORMAT_PCM: u16 = 1;
const FORMAT_IEEE_FLOAT: u16 = 3;
const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Parsed `fmt ` chunk plus the location of the sample data
#[derive(Debug, Clone, PartialEq)]
pub struct WavHeader {
    /// Format code from the fmt chunk (1 = integer PCM, 3 = IEEE float)
    pub format_code: u16,
    /// Channel count (>= 1)
    pub channels: u16,
    /// Sample rate in Hz (> 0)
    pub sample_rate: u32,
    /// Bits per sample, one of {8, 16, 24, 32}
    pub bits_per_sample: u16,
    /// Offset of the first sample byte within the input
    pub data_offset: usize,
    /// Usable byte length of the data chunk (clamped to the input length)
    pub data_len: usize,
}

impl WavHeader {
    /// Duration implied by the header fields, in seconds
    pub fn duration_seconds(&self) -> f64 {
        let frame_bytes = self.channels as u64 * (self.bits_per_sample as u64 / 8);
        if frame_bytes == 0 || self.sample_rate == 0 {
            return 0.0;
        }
        let frames = self.data_len as u64 / frame_bytes;
        frames as f64 / self.sample_rate as f64
    }
}

/// Decoded PCM samples, still channel-interleaved
#[derive(Debug, Clone)]
pub struct PcmBuffer {
    /// Interleaved samples normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Source bit depth
    pub bit_depth: u16,
    /// Channel count
    pub channels: u16,
}

impl PcmBuffer {
    /// Number of sample frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f64 / self.sample_rate as f64
        }
    }
}

/// Parse the RIFF structure and fmt/data chunks
///
/// # Errors
///
/// - `MalformedContainer` if the preamble, chunk list, or fmt chunk is
///   truncated or structurally invalid, or if the format code is one this
///   engine cannot decode
/// - `UnsupportedSampleWidth` if bits-per-sample is outside {8, 16, 24, 32}
pub fn parse_header(bytes: &[u8]) -> Result<WavHeader, AnalysisError> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(AnalysisError::MalformedContainer(
            "missing RIFF/WAVE preamble".to_string(),
        ));
    }

    let mut fmt: Option<(u16, u16, u32, u16)> = None;
    let mut data: Option<(usize, usize)> = None;

    // Chunk list starts after the 12-byte preamble: id(4) + size(4) + payload,
    // payloads padded to even length.
    let mut pos = 12usize;
    while pos + 8 <= bytes.len() {
        let chunk_id = &bytes[pos..pos + 4];
        let chunk_size = read_u32_le(bytes, pos + 4) as usize;
        let payload_start = pos + 8;

        match chunk_id {
            b"fmt " => {
                if chunk_size < 16 || payload_start + 16 > bytes.len() {
                    return Err(AnalysisError::MalformedContainer(
                        "truncated fmt chunk".to_string(),
                    ));
                }
                let format_code = read_u16_le(bytes, payload_start);
                let channels = read_u16_le(bytes, payload_start + 2);
                let sample_rate = read_u32_le(bytes, payload_start + 4);
                let bits_per_sample = read_u16_le(bytes, payload_start + 14);
                fmt = Some((format_code, channels, sample_rate, bits_per_sample));
            }
            b"data" => {
                // Tolerate a data chunk that claims more bytes than remain.
                let available = bytes.len().saturating_sub(payload_start);
                data = Some((payload_start, chunk_size.min(available)));
            }
            _ => {}
        }

        if fmt.is_some() && data.is_some() {
            break;
        }

        let padded = chunk_size + (chunk_size % 2);
        pos = match payload_start.checked_add(padded) {
            Some(next) if next > pos => next,
            _ => break,
        };
    }

    let (format_code, channels, sample_rate, bits_per_sample) = fmt.ok_or_else(|| {
        AnalysisError::MalformedContainer("no fmt chunk found".to_string())
    })?;
    let (data_offset, data_len) = data.ok_or_else(|| {
        AnalysisError::MalformedContainer("no data chunk found".to_string())
    })?;

    if channels == 0 {
        return Err(AnalysisError::MalformedContainer(
            "fmt chunk declares zero channels".to_string(),
        ));
    }
    if sample_rate == 0 {
        return Err(AnalysisError::MalformedContainer(
            "fmt chunk declares zero sample rate".to_string(),
        ));
    }

    if !matches!(bits_per_sample, 8 | 16 | 24 | 32) {
        return Err(AnalysisError::UnsupportedSampleWidth(bits_per_sample));
    }

    match format_code {
        FORMAT_PCM | FORMAT_EXTENSIBLE => {}
        FORMAT_IEEE_FLOAT => {
            if bits_per_sample != 32 {
                return Err(AnalysisError::MalformedContainer(format!(
                    "IEEE float WAV with {} bits per sample",
                    bits_per_sample
                )));
            }
        }
        other => {
            return Err(AnalysisError::MalformedContainer(format!(
                "unsupported WAV format code {}",
                other
            )));
        }
    }

    Ok(WavHeader {
        format_code,
        channels,
        sample_rate,
        bits_per_sample,
        data_offset,
        data_len,
    })
}

/// Parse and decode a WAV buffer into normalized interleaved f32 samples
///
/// # Errors
///
/// Propagates [`parse_header`] errors; decoding itself cannot fail once the
/// header is accepted (trailing partial frames are dropped).
pub fn decode_pcm(bytes: &[u8]) -> Result<PcmBuffer, AnalysisError> {
    let header = parse_header(bytes)?;

    let bytes_per_sample = (header.bits_per_sample / 8) as usize;
    let data = &bytes[header.data_offset..header.data_offset + header.data_len];

    // Drop any trailing partial sample.
    let usable = data.len() - (data.len() % bytes_per_sample);
    let sample_count = usable / bytes_per_sample;
    let mut samples = Vec::with_capacity(sample_count);

    match (header.format_code, header.bits_per_sample) {
        (FORMAT_IEEE_FLOAT, 32) => {
            for chunk in data[..usable].chunks_exact(4) {
                let v = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                samples.push(v.clamp(-1.0, 1.0));
            }
        }
        (_, 8) => {
            // 8-bit WAV is unsigned with a 128 midpoint.
            for &b in &data[..usable] {
                samples.push((b as f32 - 128.0) / 128.0);
            }
        }
        (_, 16) => {
            for chunk in data[..usable].chunks_exact(2) {
                let v = i16::from_le_bytes([chunk[0], chunk[1]]);
                samples.push(v as f32 / 32768.0);
            }
        }
        (_, 24) => {
            for chunk in data[..usable].chunks_exact(3) {
                // Sign-extend the 24-bit little-endian value through the top byte.
                let v = i32::from_le_bytes([0, chunk[0], chunk[1], chunk[2]]) >> 8;
                samples.push(v as f32 / 8_388_608.0);
            }
        }
        (_, 32) => {
            for chunk in data[..usable].chunks_exact(4) {
                let v = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                samples.push(v as f32 / 2_147_483_648.0);
            }
        }
        (_, other) => return Err(AnalysisError::UnsupportedSampleWidth(other)),
    }

    log::debug!(
        "Decoded WAV: {} samples, {} Hz, {}-bit, {} channel(s)",
        samples.len(),
        header.sample_rate,
        header.bits_per_sample,
        header.channels
    );

    Ok(PcmBuffer {
        samples,
        sample_rate: header.sample_rate,
        bit_depth: header.bits_per_sample,
        channels: header.channels,
    })
}

fn read_u16_le(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
