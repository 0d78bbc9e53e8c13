//! Error taxonomy shared by every pipeline stage.

use serde::Serialize;
use thiserror::Error;

use crate::footprint::UvFootprint;

/// Kind of failure, as surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Malformed source document or unresolved reference.
    Parse,
    /// UV sampling range exceeds what condensation can reproduce.
    UnsupportedFootprint,
    /// Binary container header or chunk structure is invalid.
    MalformedGlb,
    /// Pixel buffer in a format the compositor cannot process.
    ImageFormat,
    /// Filesystem failure while reading inputs or staging outputs.
    Io,
}

impl ErrorKind {
    /// Returns the taxonomy name (e.g. "ParseError").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Parse => "ParseError",
            ErrorKind::UnsupportedFootprint => "UnsupportedFootprintError",
            ErrorKind::MalformedGlb => "MalformedGlbError",
            ErrorKind::ImageFormat => "ImageFormatError",
            ErrorKind::Io => "IoError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Common trait for stage errors.
///
/// Each crate keeps its own error enum and implements this trait so the
/// orchestrator can report every failure the same way: kind, stable code,
/// message and the offending texture, group or file.
pub trait FixupError: std::error::Error {
    /// Taxonomy kind.
    fn kind(&self) -> ErrorKind;

    /// Stable code like "DAE_003" or "GLB_001".
    fn code(&self) -> &'static str;

    /// Identity of the offending texture, group or file, when known.
    fn subject(&self) -> Option<String> {
        None
    }

    /// Human-readable message.
    fn message(&self) -> String {
        self.to_string()
    }
}

/// Raised when a group's footprint leaves the condensable range.
#[derive(Debug, Clone, Error)]
#[error("UV footprint {footprint} of '{subject}' exceeds the condensable range [-1, 2]x[-1, 2]")]
pub struct UnsupportedFootprintError {
    /// Group or texture whose footprint was rejected.
    pub subject: String,
    /// The rejected footprint.
    pub footprint: UvFootprint,
}

impl FixupError for UnsupportedFootprintError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::UnsupportedFootprint
    }

    fn code(&self) -> &'static str {
        "FOOTPRINT_001"
    }

    fn subject(&self) -> Option<String> {
        Some(self.subject.clone())
    }
}

/// Type-erased stage failure carrying the reporting fields of a [`FixupError`].
#[derive(Debug)]
pub struct StageError {
    /// Taxonomy kind.
    pub kind: ErrorKind,
    /// Stable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Offending identity, when known.
    pub subject: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StageError {
    /// Wraps any [`FixupError`].
    pub fn from_fixup<E: FixupError + Send + Sync + 'static>(err: E) -> Self {
        Self {
            kind: err.kind(),
            code: err.code(),
            message: err.message(),
            subject: err.subject(),
            source: Some(Box::new(err)),
        }
    }

    /// Creates an error without an underlying source.
    pub fn new(kind: ErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
            subject: None,
            source: None,
        }
    }

    /// Attaches the offending identity.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.subject {
            Some(ref subject) => write!(
                f,
                "{} [{}] in '{}': {}",
                self.kind, self.code, subject, self.message
            ),
            None => write!(f, "{} [{}]: {}", self.kind, self.code, self.message),
        }
    }
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<UnsupportedFootprintError> for StageError {
    fn from(err: UnsupportedFootprintError) -> Self {
        StageError::from_fixup(err)
    }
}
