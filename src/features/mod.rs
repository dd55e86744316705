//! Feature extraction modules
//!
//! This module contains the analysis stages between decoded input and the
//! assembled profile:
//! - Windowed segmentation (RMS + zero crossings)
//! - Onset detection and interval-cluster tempo estimation
//! - The three pitch strategies and candidate clustering
//! - Byte-activity pseudo-melody fallback
//! - Melody derivation, normalization, and smoothing
//! - Key estimation and reference-instrument calibration

pub mod byte_activity;
pub mod calibration;
pub mod key;
pub mod melody;
pub mod pitch;
pub mod segment;
pub mod tempo;
