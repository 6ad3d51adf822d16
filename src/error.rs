//! Error types for the piano-to-MIDI decoder

use std::fmt;

/// Custom error type for curve decoding and MIDI export
#[derive(Debug, Clone)]
pub enum PianoError {
    /// E001: Curve arrays disagree on frame or class counts
    ShapeMismatch(String),
    /// E002: A required curve is absent from the curve set
    MissingCurve(String),
    /// E003: Configuration validation failed
    ConfigValidationFailed(String),
    /// E004: Invalid configuration parameter
    InvalidConfigParameter(String),
    /// E005: MIDI export error
    MidiExportError(String),
    /// E006: MIDI parse error (reference read path)
    MidiParseError(String),
    /// E007: Diagnostic trace export error
    TraceExportError(String),
    /// E008: Curve set import error
    CurveImportError(String),
}

impl fmt::Display for PianoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PianoError::ShapeMismatch(msg) => {
                write!(f, "E001: Curve shape mismatch - {}", msg)
            }
            PianoError::MissingCurve(name) => {
                write!(f, "E002: Required curve '{}' is missing", name)
            }
            PianoError::ConfigValidationFailed(msg) => {
                write!(f, "E003: Configuration validation failed - {}", msg)
            }
            PianoError::InvalidConfigParameter(msg) => {
                write!(f, "E004: Invalid configuration parameter - {}", msg)
            }
            PianoError::MidiExportError(msg) => {
                write!(f, "E005: MIDI export error - {}", msg)
            }
            PianoError::MidiParseError(msg) => {
                write!(f, "E006: MIDI parse error - {}", msg)
            }
            PianoError::TraceExportError(msg) => {
                write!(f, "E007: Trace export error - {}", msg)
            }
            PianoError::CurveImportError(msg) => {
                write!(f, "E008: Curve set import error - {}", msg)
            }
        }
    }
}

impl std::error::Error for PianoError {}

// From implementations for common error types
impl From<std::io::Error> for PianoError {
    fn from(err: std::io::Error) -> Self {
        PianoError::MidiExportError(format!("File I/O error: {}", err))
    }
}

impl From<serde_json::Error> for PianoError {
    fn from(err: serde_json::Error) -> Self {
        PianoError::CurveImportError(format!("JSON error: {}", err))
    }
}

impl From<anyhow::Error> for PianoError {
    fn from(err: anyhow::Error) -> Self {
        PianoError::MidiExportError(format!("{}", err))
    }
}

/// Result type alias for decoder operations
pub type Result<T> = std::result::Result<T, PianoError>;
