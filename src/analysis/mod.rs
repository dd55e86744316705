//! Analysis and result aggregation modules
//!
//! Combines the feature extraction results into the final profile:
//! - Confidence hint derivation
//! - Profile and note event types
//! - Reasoning trace builder

pub mod confidence;
pub mod profile;
pub mod trace;
