//! JSON output types for machine-readable CLI output.
//!
//! Every command prints one [`CommandOutput`] when `--json` is given. Errors
//! carry the stable code of the stage error that aborted the run.

use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::report::{Stage, StageFailure};

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JsonError {
    /// Stable error code (e.g., "DAE_002", "GLB_001")
    pub code: String,
    /// Taxonomy kind (e.g., "ParseError")
    pub kind: String,
    /// Human-readable error message
    pub message: String,
    /// Offending texture, group or file (if known)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Stage that failed
    pub stage: Stage,
}

impl JsonError {
    /// Creates an error from an aborted run.
    pub fn from_failure(failure: &StageFailure) -> Self {
        Self {
            code: failure.error.code.to_string(),
            kind: failure.error.kind.as_str().to_string(),
            message: failure.error.message.clone(),
            subject: failure.error.subject.clone(),
            stage: failure.stage,
        }
    }
}

/// JSON envelope printed by every command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput<T> {
    /// Whether the run reached `DONE`
    pub success: bool,
    /// Final state (`done` or `failed`)
    pub stage: Stage,
    /// Errors that aborted the run
    pub errors: Vec<JsonError>,
    /// Command result (on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T: Serialize> CommandOutput<T> {
    /// Creates a successful output.
    pub fn success(result: T) -> Self {
        Self {
            success: true,
            stage: Stage::Done,
            errors: Vec::new(),
            result: Some(result),
        }
    }

    /// Creates a failed output.
    pub fn failure(failure: &StageFailure) -> Self {
        Self {
            success: false,
            stage: Stage::Failed,
            errors: vec![JsonError::from_failure(failure)],
            result: None,
        }
    }

    /// Builds the output for a run result along with the exit code to return.
    pub fn from_result(result: std::result::Result<T, StageFailure>) -> (Self, ExitCode) {
        match result {
            Ok(value) => (Self::success(value), ExitCode::SUCCESS),
            Err(failure) => (Self::failure(&failure), ExitCode::from(1)),
        }
    }

    /// Serializes as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize JSON output")
    }
}

/// Prints the JSON output for a run and returns its exit code.
pub fn print<T: Serialize>(result: std::result::Result<T, StageFailure>) -> Result<ExitCode> {
    let (output, code) = CommandOutput::from_result(result);
    println!("{}", output.to_json()?);
    Ok(code)
}
