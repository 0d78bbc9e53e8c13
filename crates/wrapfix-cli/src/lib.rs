//! wrapfix CLI library.
//!
//! The [`orchestrator`] sequences the COLLADA, texture and container stages
//! for each command; [`staging`] makes every invocation all-or-nothing at the
//! file level, and [`report`] describes what happened to each wrap group.

pub mod commands;
pub mod orchestrator;
pub mod report;
pub mod staging;

pub use orchestrator::{GlbTarget, Orchestrator};
pub use report::{FixupReport, GroupOutcome, GroupReport, Inspection, Stage, StageFailure};
