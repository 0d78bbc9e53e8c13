//! Command implementations for the wrapfix CLI.

pub mod condense;
pub mod export;
pub mod inspect;
pub mod json_output;
pub mod normalize_scale;
pub mod reporting;
