//! Condense command implementation
//!
//! Bakes mirrored texture variants into clamp-addressed atlases and rewrites
//! the document to sample them. Groups that cannot be condensed are patched
//! into an exported GLB when one is given.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use wrapfix_spec::{FixupConfig, WrapMode};

use super::{json_output, reporting};
use crate::orchestrator::{GlbTarget, Orchestrator};

/// Run the condense command
///
/// # Arguments
/// * `dae` - Path to the COLLADA document
/// * `base_wrap` - Wrap mode assumed where the document declares none
/// * `output` - Output document path (default: overwrite input)
/// * `glb` - Exported container and patched output path, if any
/// * `json` - Whether to print a machine-readable report
///
/// # Returns
/// Exit code: 0 success, 1 error
pub fn run(
    dae: &str,
    base_wrap: WrapMode,
    output: Option<&str>,
    glb: Option<(&str, &str)>,
    json: bool,
) -> Result<ExitCode> {
    let orchestrator = Orchestrator::new(FixupConfig::default().with_base_wrap(base_wrap));
    let output = output.unwrap_or(dae);
    let target = glb.map(|(input, output)| GlbTarget::new(input, output));

    if json {
        return json_output::print(orchestrator.condense(
            Path::new(dae),
            Path::new(output),
            target.as_ref(),
        ));
    }

    println!("{} {}", "Condensing:".cyan().bold(), dae);
    println!("{} {}", "Base wrap:".dimmed(), base_wrap);
    let report = orchestrator.condense(Path::new(dae), Path::new(output), target.as_ref())?;

    println!(
        "{} {} texture usage(s) in {} group(s)",
        "Found:".dimmed(),
        report.samplers,
        report.groups.len()
    );
    reporting::print_groups(&report.groups);
    reporting::print_outputs(&report.outputs);

    let deferred = report.count("deferred");
    if deferred > 0 {
        println!(
            "\n{} {} group(s) need the patch path; run `wrapfix export` on the exported GLB",
            "!".yellow(),
            deferred
        );
    }
    println!(
        "\n{} {} condensed, {} patched, {} untouched",
        "SUCCESS".green().bold(),
        report.count("condensed"),
        report.count("patched"),
        report.count("untouched")
    );
    Ok(ExitCode::SUCCESS)
}
