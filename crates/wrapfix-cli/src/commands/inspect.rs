//! Inspect command implementation
//!
//! Lists texture usages, footprints, groups and chosen strategies without
//! writing anything.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use wrapfix_spec::{FixupConfig, GroupPlan, Strategy, WrapMode, WrapSource};

use super::json_output;
use crate::orchestrator::Orchestrator;

/// Run the inspect command
///
/// # Arguments
/// * `dae` - Path to the COLLADA document
/// * `base_wrap` - Wrap mode assumed where the document declares none
/// * `json` - Whether to print a machine-readable report
///
/// # Returns
/// Exit code: 0 success, 1 error
pub fn run(dae: &str, base_wrap: WrapMode, json: bool) -> Result<ExitCode> {
    let orchestrator = Orchestrator::new(FixupConfig::default().with_base_wrap(base_wrap));

    if json {
        return json_output::print(orchestrator.inspect(Path::new(dae)));
    }

    println!("{} {}", "Inspecting:".cyan().bold(), dae);
    let inspection = orchestrator.inspect(Path::new(dae))?;
    println!("{} COLLADA {}", "Schema:".dimmed(), inspection.version);

    println!("\n{} ({})", "Samplers".bold(), inspection.samplers.len());
    for sampler in &inspection.samplers {
        let source = match sampler.source {
            WrapSource::Declared => "declared".normal(),
            WrapSource::Extra => "extra".normal(),
            WrapSource::Defaulted => "default".dimmed(),
        };
        println!(
            "  {} {} {} [{}] {}",
            sampler.label().bold(),
            sampler.wrap,
            source,
            sampler.texcoord,
            sampler.image.path.dimmed()
        );
    }

    println!("\n{} ({})", "Groups".bold(), inspection.plans.len());
    for plan in &inspection.plans {
        print_plan(plan);
    }

    Ok(ExitCode::SUCCESS)
}

fn print_plan(plan: &GroupPlan) {
    let strategy = match &plan.strategy {
        Strategy::Condense(layout) if layout.is_noop() => "no correction".dimmed(),
        Strategy::Condense(layout) => format!("condense {}", layout).green(),
        Strategy::Patch(reason) => format!("patch: {}", reason).yellow(),
    };
    println!("  {} {}", plan.group.name().bold(), strategy);
    for member in &plan.group.members {
        let footprint = member
            .footprint
            .map(|f| f.to_string())
            .unwrap_or_else(|| "not sampled".to_string());
        println!(
            "    {} {} {}",
            member.sampler.label(),
            member.sampler.wrap,
            footprint.dimmed()
        );
    }
}
