//! COLLADA stage errors.

use thiserror::Error;
use wrapfix_spec::{ErrorKind, FixupError};

/// Errors from reading, interpreting or rewriting a COLLADA document.
#[derive(Debug, Error)]
pub enum DaeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not well-formed XML: {0}")]
    Xml(#[from] xmltree::ParseError),

    #[error("failed to serialize document: {0}")]
    Write(#[from] xmltree::Error),

    #[error("root element is <{0}>, expected <COLLADA>")]
    NotCollada(String),

    #[error("unresolved {kind} reference '{id}' in {context}")]
    UnresolvedReference {
        kind: &'static str,
        id: String,
        context: String,
    },

    #[error("sampler '{sampler}' has unknown wrap token '{token}'")]
    InvalidWrapToken { sampler: String, token: String },

    #[error("invalid value in {context}: {detail}")]
    InvalidValue { context: String, detail: String },

    #[error("index {index} out of range for source '{source_id}' ({len} elements)")]
    IndexOutOfRange {
        source_id: String,
        index: usize,
        len: usize,
    },

    #[error("texcoord source '{source_id}' is shared by primitives needing different transforms: {detail}")]
    ConflictingTexcoords { source_id: String, detail: String },
}

impl DaeError {
    pub(crate) fn unresolved(
        kind: &'static str,
        id: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        DaeError::UnresolvedReference {
            kind,
            id: id.into(),
            context: context.into(),
        }
    }

    pub(crate) fn invalid(context: impl Into<String>, detail: impl Into<String>) -> Self {
        DaeError::InvalidValue {
            context: context.into(),
            detail: detail.into(),
        }
    }
}

impl FixupError for DaeError {
    fn kind(&self) -> ErrorKind {
        match self {
            DaeError::Io(_) | DaeError::Write(_) => ErrorKind::Io,
            _ => ErrorKind::Parse,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            DaeError::Io(_) => "DAE_001",
            DaeError::Xml(_) => "DAE_002",
            DaeError::Write(_) => "DAE_003",
            DaeError::NotCollada(_) => "DAE_004",
            DaeError::UnresolvedReference { .. } => "DAE_005",
            DaeError::InvalidWrapToken { .. } => "DAE_006",
            DaeError::InvalidValue { .. } => "DAE_007",
            DaeError::IndexOutOfRange { .. } => "DAE_008",
            DaeError::ConflictingTexcoords { .. } => "DAE_009",
        }
    }

    fn subject(&self) -> Option<String> {
        match self {
            DaeError::UnresolvedReference { id, .. } => Some(id.clone()),
            DaeError::InvalidWrapToken { sampler, .. } => Some(sampler.clone()),
            DaeError::IndexOutOfRange { source_id, .. }
            | DaeError::ConflictingTexcoords { source_id, .. } => Some(source_id.clone()),
            _ => None,
        }
    }
}

/// Result alias for the COLLADA stage.
pub type DaeResult<T> = Result<T, DaeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_kinds() {
        let err = DaeError::unresolved("image", "img9", "effect 'Effect_Stone'");
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.code(), "DAE_005");
        assert_eq!(err.subject().as_deref(), Some("img9"));
        assert_eq!(
            err.to_string(),
            "unresolved image reference 'img9' in effect 'Effect_Stone'"
        );

        let io = DaeError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(io.kind(), ErrorKind::Io);
        assert_eq!(io.subject(), None);
    }
}
