//! Texture stage errors.

use thiserror::Error;
use wrapfix_spec::{ErrorKind, FixupError, UnsupportedFootprintError};

/// Errors from decoding, compositing or encoding textures.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG decoding error: {0}")]
    Decoding(#[from] png::DecodingError),

    #[error("PNG encoding error: {0}")]
    Encoding(#[from] png::EncodingError),

    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error(transparent)]
    Footprint(#[from] UnsupportedFootprintError),
}

impl FixupError for TextureError {
    fn kind(&self) -> ErrorKind {
        match self {
            TextureError::Io(_) => ErrorKind::Io,
            TextureError::Footprint(_) => ErrorKind::UnsupportedFootprint,
            TextureError::Decoding(_)
            | TextureError::Encoding(_)
            | TextureError::UnsupportedFormat(_)
            | TextureError::InvalidDimensions(_) => ErrorKind::ImageFormat,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            TextureError::Io(_) => "TEXTURE_001",
            TextureError::Decoding(_) => "TEXTURE_002",
            TextureError::Encoding(_) => "TEXTURE_003",
            TextureError::UnsupportedFormat(_) => "TEXTURE_004",
            TextureError::InvalidDimensions(_) => "TEXTURE_005",
            TextureError::Footprint(err) => err.code(),
        }
    }

    fn subject(&self) -> Option<String> {
        match self {
            TextureError::Footprint(err) => err.subject(),
            _ => None,
        }
    }
}

/// Result alias for the texture stage.
pub type TextureResult<T> = Result<T, TextureError>;
