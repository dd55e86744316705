//! Windowed segmentation of amplitude and byte-activity signals
//!
//! Fixed, non-overlapping windows keep segment timing trivially deterministic
//! and make the downstream duration normalization a pure rescale. PCM
//! segments carry their RMS, zero-crossing count, and raw samples; the byte
//! path reduces each window to a single activity value.

/// Samples per PCM analysis window
pub const SEGMENT_WINDOW: usize = 2048;

/// Bytes per activity window on the compressed fallback path
pub const BYTE_WINDOW: usize = 1024;

/// One fixed-duration analysis window over decoded PCM
#[derive(Debug, Clone)]
pub struct Segment {
    /// Window position in the segment sequence
    pub index: usize,
    /// Window start time in seconds
    pub start_seconds: f64,
    /// Window length in seconds
    pub duration_seconds: f64,
    /// Root-mean-square energy of the window
    pub rms: f32,
    /// Sign changes across consecutive samples
    pub zero_crossings: usize,
    /// The window's samples, owned so pitch estimators can transform them
    pub samples: Vec<f32>,
}

impl Segment {
    /// Window length in seconds as f32, for frequency arithmetic
    pub fn window_seconds(&self) -> f32 {
        self.duration_seconds as f32
    }
}

/// Split a mono amplitude series into fixed windows with per-window features
///
/// Only full windows are emitted; a trailing partial window is dropped.
/// Inputs shorter than one window therefore produce no segments, which
/// downstream stages treat as "no melodic evidence".
pub fn segment_pcm(samples: &[f32], sample_rate: u32) -> Vec<Segment> {
    if sample_rate == 0 || samples.len() < SEGMENT_WINDOW {
        return Vec::new();
    }

    let window_seconds = SEGMENT_WINDOW as f64 / sample_rate as f64;
    let num_windows = samples.len() / SEGMENT_WINDOW;
    let mut segments = Vec::with_capacity(num_windows);

    for index in 0..num_windows {
        let start = index * SEGMENT_WINDOW;
        let window = &samples[start..start + SEGMENT_WINDOW];

        let sum_sq: f32 = window.iter().map(|&x| x * x).sum();
        let rms = (sum_sq / SEGMENT_WINDOW as f32).sqrt();

        let zero_crossings = count_zero_crossings(window);

        segments.push(Segment {
            index,
            start_seconds: index as f64 * window_seconds,
            duration_seconds: window_seconds,
            rms,
            zero_crossings,
            samples: window.to_vec(),
        });
    }

    log::debug!(
        "Segmented {} samples into {} windows of {} ({:.1} ms each)",
        samples.len(),
        segments.len(),
        SEGMENT_WINDOW,
        window_seconds * 1000.0
    );

    segments
}

/// Count sign changes across consecutive samples
///
/// Zero is treated as non-negative so a run of exact zeros contributes no
/// crossings.
pub fn count_zero_crossings(window: &[f32]) -> usize {
    window
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count()
}

/// Reduce a raw byte buffer to a windowed activity signal
///
/// Each window's activity is the mean absolute successive byte difference,
/// scaled to [0, 1]. Structured or repetitive regions score low; noisy or
/// dense regions score high. Only full windows are emitted.
pub fn byte_activity_signal(bytes: &[u8]) -> Vec<f32> {
    if bytes.len() < BYTE_WINDOW {
        return Vec::new();
    }

    let num_windows = bytes.len() / BYTE_WINDOW;
    let mut signal = Vec::with_capacity(num_windows);

    for index in 0..num_windows {
        let start = index * BYTE_WINDOW;
        let window = &bytes[start..start + BYTE_WINDOW];

        let total: u32 = window
            .windows(2)
            .map(|pair| (pair[0] as i16 - pair[1] as i16).unsigned_abs() as u32)
            .sum();
        let mean = total as f32 / (BYTE_WINDOW - 1) as f32;
        signal.push(mean / 255.0);
    }

    signal
}
