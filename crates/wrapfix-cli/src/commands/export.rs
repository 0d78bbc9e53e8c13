//! Export command implementation
//!
//! Writes the wrap modes declared in a COLLADA document into the samplers of
//! a GLB exported from it.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use wrapfix_glb::EditAction;
use wrapfix_spec::{FixupConfig, WrapMode};

use super::{json_output, reporting};
use crate::orchestrator::{GlbTarget, Orchestrator};

/// Run the export command
///
/// # Arguments
/// * `dae` - Path to the COLLADA document the container was exported from
/// * `glb` - Path to the exported container
/// * `output` - Patched container path (may equal `glb`)
/// * `base_wrap` - Wrap mode assumed where the document declares none
/// * `json` - Whether to print a machine-readable report
///
/// # Returns
/// Exit code: 0 success, 1 error
pub fn run(dae: &str, glb: &str, output: &str, base_wrap: WrapMode, json: bool) -> Result<ExitCode> {
    let orchestrator = Orchestrator::new(FixupConfig::default().with_base_wrap(base_wrap));
    let target = GlbTarget::new(glb, output);

    if json {
        return json_output::print(orchestrator.export(Path::new(dae), &target));
    }

    println!("{} {} -> {}", "Exporting:".cyan().bold(), glb, output);
    let report = orchestrator.export(Path::new(dae), &target)?;
    reporting::print_groups(&report.groups);

    if let Some(patch) = &report.patch {
        for label in &patch.unmatched {
            println!("  {} no texture uses '{}'", "!".yellow(), label);
        }
        println!(
            "{} {} created, {} updated, {} relinked, {} unchanged",
            "Samplers:".dimmed(),
            patch.count(EditAction::Created),
            patch.count(EditAction::UpdatedInPlace),
            patch.count(EditAction::Relinked),
            patch.count(EditAction::Unchanged)
        );
    }
    reporting::print_outputs(&report.outputs);

    println!("{} Exported with wrapping to: {}", "SUCCESS".green().bold(), output);
    Ok(ExitCode::SUCCESS)
}
