//! MPEG audio header parsing: frame headers, Xing/Info, VBRI, frame walk
//!
//! Pure structured byte decoding over Layer III streams. Nothing here
//! throws on bad input: header readers report `Found`, `NotFound`, or
//! `Malformed`, and the frame walk simply stops when it runs out of
//! parseable frames. Layers I/II and the reserved MPEG version are treated
//! as desync rather than decoded.

/// Outcome of probing a buffer for one optional header structure
///
/// `Malformed` means the header's tag was present but its payload was
/// truncated or useless (for example a Xing header without a frame count),
/// which demotes to the next estimation layer just like `NotFound` but is
/// worth distinguishing in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderScan<T> {
    /// Header parsed and produced a value
    Found(T),
    /// Header not present at its defined offset
    NotFound,
    /// Header tag present but the structure is unusable
    Malformed,
}

/// MPEG version from the frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    /// MPEG 1 (ISO/IEC 11172-3)
    V1,
    /// MPEG 2 (ISO/IEC 13818-3)
    V2,
    /// MPEG 2.5 (unofficial low-rate extension)
    V25,
}

/// Channel mode from the frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    /// Stereo, joint stereo, or dual channel
    Stereo,
    /// Single channel
    Mono,
}

/// One decoded Layer III frame header
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameHeader {
    /// MPEG version
    pub version: MpegVersion,
    /// Channel mode (collapsed to mono / not-mono)
    pub channel_mode: ChannelMode,
    /// Bitrate in bits per second
    pub bitrate_bps: u32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Padding bit set
    pub padding: bool,
    /// CRC-16 follows the header (protection bit clear)
    pub has_crc: bool,
    /// Total frame length in bytes, padding included
    pub frame_len: usize,
    /// PCM samples this frame decodes to
    pub samples_per_frame: u32,
}

impl FrameHeader {
    /// Seconds of audio this frame represents
    pub fn frame_seconds(&self) -> f64 {
        self.samples_per_frame as f64 / self.sample_rate as f64
    }

    /// Side information size in bytes (between CRC and main data)
    ///
    /// MPEG1: 17 bytes mono, 32 otherwise. MPEG2/2.5: 9 mono, 17 otherwise.
    pub fn side_info_len(&self) -> usize {
        match (self.version, self.channel_mode) {
            (MpegVersion::V1, ChannelMode::Mono) => 17,
            (MpegVersion::V1, ChannelMode::Stereo) => 32,
            (_, ChannelMode::Mono) => 9,
            (_, ChannelMode::Stereo) => 17,
        }
    }
}

/// Layer III bitrates in kbps, indexed by the header's 4-bit field
const BITRATES_V1_L3: [u32; 16] = [
    0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0,
];
const BITRATES_V2_L3: [u32; 16] = [
    0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0,
];

/// Sample rates in Hz, indexed by the header's 2-bit field
const SAMPLE_RATES_V1: [u32; 3] = [44_100, 48_000, 32_000];
const SAMPLE_RATES_V2: [u32; 3] = [22_050, 24_000, 16_000];
const SAMPLE_RATES_V25: [u32; 3] = [11_025, 12_000, 8_000];

/// Bound on resync attempts during a frame walk
const MAX_RESYNCS: usize = 64;
/// Bytes searched forward per resync attempt
const RESYNC_WINDOW: usize = 8_192;
/// Hard cap on walked frames (roughly 7 hours of MPEG1 audio)
const MAX_WALK_FRAMES: usize = 1_000_000;
/// Bytes scanned when locating the first frame of a stream
const FIRST_FRAME_SEARCH: usize = 256 * 1024;

/// Decode a Layer III frame header at the start of `bytes`
///
/// Returns `None` when the sync word is absent or any field is reserved or
/// free-form, so callers can treat every failure uniformly as desync.
pub fn parse_frame_header(bytes: &[u8]) -> Option<FrameHeader> {
    if bytes.len() < 4 {
        return None;
    }
    let (b0, b1, b2, b3) = (bytes[0], bytes[1], bytes[2], bytes[3]);

    // 11-bit sync word
    if b0 != 0xFF || (b1 & 0xE0) != 0xE0 {
        return None;
    }

    let version = match (b1 >> 3) & 0x3 {
        0b00 => MpegVersion::V25,
        0b10 => MpegVersion::V2,
        0b11 => MpegVersion::V1,
        _ => return None, // reserved
    };

    // Layer III only
    if (b1 >> 1) & 0x3 != 0b01 {
        return None;
    }

    let has_crc = (b1 & 0x1) == 0;

    let bitrate_index = ((b2 >> 4) & 0xF) as usize;
    let bitrate_kbps = match version {
        MpegVersion::V1 => BITRATES_V1_L3[bitrate_index],
        _ => BITRATES_V2_L3[bitrate_index],
    };
    if bitrate_kbps == 0 {
        return None; // free-form or invalid
    }

    let sr_index = ((b2 >> 2) & 0x3) as usize;
    if sr_index == 3 {
        return None; // reserved
    }
    let sample_rate = match version {
        MpegVersion::V1 => SAMPLE_RATES_V1[sr_index],
        MpegVersion::V2 => SAMPLE_RATES_V2[sr_index],
        MpegVersion::V25 => SAMPLE_RATES_V25[sr_index],
    };

    let padding = (b2 >> 1) & 0x1 == 1;

    let channel_mode = if (b3 >> 6) & 0x3 == 0b11 {
        ChannelMode::Mono
    } else {
        ChannelMode::Stereo
    };

    let samples_per_frame: u32 = match version {
        MpegVersion::V1 => 1152,
        _ => 576,
    };

    let bitrate_bps = bitrate_kbps * 1000;
    let frame_len = (samples_per_frame as usize / 8) * bitrate_bps as usize
        / sample_rate as usize
        + padding as usize;

    Some(FrameHeader {
        version,
        channel_mode,
        bitrate_bps,
        sample_rate,
        padding,
        has_crc,
        frame_len,
        samples_per_frame,
    })
}

/// Offset of the first byte past any leading ID3v2 tag
///
/// The tag size field is syncsafe (7 bits per byte); the footer flag adds
/// another 10 bytes. Buffers without a tag, or with a truncated tag header,
/// start at offset 0.
pub fn skip_id3v2(bytes: &[u8]) -> usize {
    if bytes.len() < 10 || &bytes[0..3] != b"ID3" {
        return 0;
    }
    let size_bytes = &bytes[6..10];
    if size_bytes.iter().any(|&b| b & 0x80 != 0) {
        // Not a syncsafe size; treat the tag as absent rather than guessing.
        return 0;
    }
    let size = ((size_bytes[0] as usize) << 21)
        | ((size_bytes[1] as usize) << 14)
        | ((size_bytes[2] as usize) << 7)
        | (size_bytes[3] as usize);
    let footer = if bytes[5] & 0x10 != 0 { 10 } else { 0 };
    (10 + size + footer).min(bytes.len())
}

/// Locate the first plausible frame header
///
/// Scans forward from the end of any ID3v2 tag, bounded to the first
/// 256 KiB of audio data. A match must either be followed by a second valid
/// header at its implied frame boundary or extend past the end of the
/// buffer (a truncated final frame), which filters out random sync bytes.
pub fn find_first_frame(bytes: &[u8]) -> Option<usize> {
    let start = skip_id3v2(bytes);
    let end = bytes.len().min(start + FIRST_FRAME_SEARCH);

    let mut pos = start;
    while pos + 4 <= end {
        if let Some(header) = parse_frame_header(&bytes[pos..]) {
            let next = pos + header.frame_len;
            if next + 4 > bytes.len() || parse_frame_header(&bytes[next..]).is_some() {
                return Some(pos);
            }
        }
        pos += 1;
    }
    None
}

/// Probe for a Xing/Info header inside the first frame
///
/// The tag sits after the 4-byte header, the optional 2-byte CRC, and the
/// version/channel-dependent side information. Returns total stream seconds
/// derived from the declared frame count.
pub fn scan_xing(bytes: &[u8], frame_offset: usize, header: &FrameHeader) -> HeaderScan<f64> {
    let crc_len = if header.has_crc { 2 } else { 0 };
    let probe = frame_offset + 4 + crc_len + header.side_info_len();

    if probe + 4 > bytes.len() {
        return HeaderScan::NotFound;
    }
    let tag = &bytes[probe..probe + 4];
    if tag != b"Xing" && tag != b"Info" {
        return HeaderScan::NotFound;
    }

    if probe + 8 > bytes.len() {
        log::debug!("Xing tag present but flags field truncated");
        return HeaderScan::Malformed;
    }
    let flags = read_u32_be(bytes, probe + 4);
    if flags & 0x1 == 0 {
        log::debug!("Xing header carries no frame count");
        return HeaderScan::Malformed;
    }
    if probe + 12 > bytes.len() {
        log::debug!("Xing frame count field truncated");
        return HeaderScan::Malformed;
    }

    let total_frames = read_u32_be(bytes, probe + 8);
    if total_frames == 0 {
        return HeaderScan::Malformed;
    }

    HeaderScan::Found(total_frames as f64 * header.frame_seconds())
}

/// Probe for a VBRI header inside the first frame
///
/// VBRI always sits 32 bytes after the frame header (offset +36 from the
/// frame start); the total frame count is 14 bytes into the structure.
pub fn scan_vbri(bytes: &[u8], frame_offset: usize, header: &FrameHeader) -> HeaderScan<f64> {
    let probe = frame_offset + 36;

    if probe + 4 > bytes.len() {
        return HeaderScan::NotFound;
    }
    if &bytes[probe..probe + 4] != b"VBRI" {
        return HeaderScan::NotFound;
    }

    if probe + 18 > bytes.len() {
        log::debug!("VBRI tag present but structure truncated");
        return HeaderScan::Malformed;
    }

    let total_frames = read_u32_be(bytes, probe + 14);
    if total_frames == 0 {
        return HeaderScan::Malformed;
    }

    HeaderScan::Found(total_frames as f64 * header.frame_seconds())
}

/// Walk frames sequentially, accumulating per-frame duration
///
/// On desync the walk searches forward a bounded window for the next sync
/// word; after `MAX_RESYNCS` failures or `MAX_WALK_FRAMES` frames it stops.
/// Returns `None` when not a single frame parses.
pub fn walk_frames(bytes: &[u8], first_frame_offset: usize) -> Option<f64> {
    let mut pos = first_frame_offset;
    let mut seconds = 0.0f64;
    let mut frames = 0usize;
    let mut resyncs = 0usize;

    while pos + 4 <= bytes.len() && frames < MAX_WALK_FRAMES {
        match parse_frame_header(&bytes[pos..]) {
            Some(header) => {
                seconds += header.frame_seconds();
                frames += 1;
                // frame_len is at least 24 bytes for any valid bitrate/rate pair
                pos += header.frame_len.max(4);
            }
            None => {
                resyncs += 1;
                if resyncs > MAX_RESYNCS {
                    log::debug!("Frame walk abandoned after {} resync attempts", resyncs);
                    break;
                }
                let window_end = bytes.len().min(pos + 1 + RESYNC_WINDOW);
                match next_sync(&bytes[pos + 1..window_end]) {
                    Some(rel) => pos = pos + 1 + rel,
                    None => break,
                }
            }
        }
    }

    if frames > 0 {
        log::debug!(
            "Frame walk parsed {} frames ({:.3}s), {} resyncs",
            frames,
            seconds,
            resyncs
        );
        Some(seconds)
    } else {
        None
    }
}

/// Find the next offset whose bytes parse as a frame header
fn next_sync(window: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i + 4 <= window.len() {
        if window[i] == 0xFF && parse_frame_header(&window[i..]).is_some() {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn read_u32_be(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
