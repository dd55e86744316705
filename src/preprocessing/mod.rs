//! Audio preprocessing modules
//!
//! Prepares decoded PCM for analysis: channel mixing (interleaved
//! multi-channel down to mono).

pub mod channel_mixer;
