//! Binary container errors.

use thiserror::Error;
use wrapfix_spec::{ErrorKind, FixupError};

/// Errors from parsing, editing or writing a GLB container.
#[derive(Debug, Error)]
pub enum GlbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("container too short: {actual} bytes, at least {needed} required")]
    Truncated { needed: usize, actual: usize },

    #[error("invalid magic: expected 'glTF', got {0:?}")]
    InvalidMagic([u8; 4]),

    #[error("unsupported container version {0} (expected 2)")]
    UnsupportedVersion(u32),

    #[error("declared length {declared} does not match actual size {actual}")]
    LengthMismatch { declared: u32, actual: usize },

    #[error("invalid chunk at offset {offset}: {detail}")]
    InvalidChunk { offset: usize, detail: String },

    #[error("invalid JSON chunk: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("container would exceed 4 GiB ({0} bytes)")]
    TooLarge(usize),
}

impl FixupError for GlbError {
    fn kind(&self) -> ErrorKind {
        match self {
            GlbError::Io(_) => ErrorKind::Io,
            _ => ErrorKind::MalformedGlb,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            GlbError::Io(_) => "GLB_001",
            GlbError::Truncated { .. } => "GLB_002",
            GlbError::InvalidMagic(_) => "GLB_003",
            GlbError::UnsupportedVersion(_) => "GLB_004",
            GlbError::LengthMismatch { .. } => "GLB_005",
            GlbError::InvalidChunk { .. } => "GLB_006",
            GlbError::InvalidJson(_) => "GLB_007",
            GlbError::InvalidReference(_) => "GLB_008",
            GlbError::TooLarge(_) => "GLB_009",
        }
    }
}

/// Result alias for the container stage.
pub type GlbResult<T> = Result<T, GlbError>;
