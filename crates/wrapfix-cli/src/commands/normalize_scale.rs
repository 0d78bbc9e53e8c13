//! Normalize-scale command implementation
//!
//! Multiplies every length in a COLLADA document by one factor.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use wrapfix_spec::FixupConfig;

use super::{json_output, reporting};
use crate::orchestrator::Orchestrator;

/// Run the normalize-scale command
///
/// # Arguments
/// * `dae` - Path to the COLLADA document
/// * `factor` - Scale factor (100 converts meters to centimeters)
/// * `output` - Output document path (default: overwrite input)
/// * `json` - Whether to print a machine-readable report
///
/// # Returns
/// Exit code: 0 success, 1 error
pub fn run(dae: &str, factor: f64, output: Option<&str>, json: bool) -> Result<ExitCode> {
    let orchestrator = Orchestrator::new(FixupConfig::default().with_scale_factor(factor));
    let output = output.unwrap_or(dae);

    if json {
        return json_output::print(orchestrator.normalize_scale(Path::new(dae), Path::new(output)));
    }

    println!("{} {} (x{})", "Normalizing:".cyan().bold(), dae, factor);
    let report = orchestrator.normalize_scale(Path::new(dae), Path::new(output))?;

    if let Some(scale) = report.scale {
        println!(
            "  {} position source(s), {} translate(s), {} matrix(es)",
            scale.position_sources, scale.translates, scale.matrices
        );
        if scale.bind_shapes + scale.inverse_binds > 0 {
            println!(
                "  {} bind shape(s), {} inverse bind array(s)",
                scale.bind_shapes, scale.inverse_binds
            );
        }
    }
    reporting::print_outputs(&report.outputs);

    if output == dae {
        println!("{} Scaled in place", "SUCCESS".green().bold());
    } else {
        println!("{} Scaled to: {}", "SUCCESS".green().bold(), output);
    }
    Ok(ExitCode::SUCCESS)
}
