//! Error types for the audio analysis engine

use std::fmt;

/// Errors that can occur around the analysis engine
///
/// The public entry points (`analyze`, `estimate_duration`) are total and
/// never surface these; they exist for the loader boundary
/// (`InvalidTuningSettings`) and as internal demotion signals between
/// container parsers and the fallback paths.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Container header or metadata failed to parse; the caller demotes to
    /// the next-lower-confidence method
    MalformedContainer(String),

    /// WAV bit depth outside the supported set {8, 16, 24, 32}
    UnsupportedSampleWidth(u16),

    /// Tuning settings outside their documented ranges; raised only by
    /// `TuningSettings::validated`, never inside the engine
    InvalidTuningSettings(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::MalformedContainer(msg) => write!(f, "Malformed container: {}", msg),
            AnalysisError::UnsupportedSampleWidth(bits) => {
                write!(f, "Unsupported sample width: {} bits", bits)
            }
            AnalysisError::InvalidTuningSettings(msg) => {
                write!(f, "Invalid tuning settings: {}", msg)
            }
        }
    }
}

impl std::error::Error for AnalysisError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = AnalysisError::MalformedContainer("truncated fmt chunk".to_string());
        assert_eq!(err.to_string(), "Malformed container: truncated fmt chunk");

        let err = AnalysisError::UnsupportedSampleWidth(12);
        assert_eq!(err.to_string(), "Unsupported sample width: 12 bits");

        let err = AnalysisError::InvalidTuningSettings("midi_floor >= midi_ceiling".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid tuning settings: midi_floor >= midi_ceiling"
        );
    }
}
