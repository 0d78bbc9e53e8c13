//! Colored rendering of reports for the terminal.

use std::path::PathBuf;

use colored::{ColoredString, Colorize};

use crate::report::{GroupOutcome, GroupReport};

/// Prints one line per group: outcome, name, requested wraps, detail.
pub fn print_groups(groups: &[GroupReport]) {
    for group in groups {
        let wraps = group
            .wraps
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "  {} {} {} {}",
            marker(&group.outcome),
            group.name.bold(),
            wraps.dimmed(),
            detail(&group.outcome)
        );
    }
}

/// Prints every written file.
pub fn print_outputs(outputs: &[PathBuf]) {
    for output in outputs {
        println!("  {} {}", "wrote".dimmed(), output.display());
    }
}

fn marker(outcome: &GroupOutcome) -> ColoredString {
    let label = format!("{:<9}", outcome.label());
    match outcome {
        GroupOutcome::Condensed { .. } => label.green(),
        GroupOutcome::Patched { .. } => label.cyan(),
        GroupOutcome::Deferred { .. } => label.yellow(),
        GroupOutcome::Untouched => label.dimmed(),
    }
}

fn detail(outcome: &GroupOutcome) -> String {
    match outcome {
        GroupOutcome::Condensed {
            layout,
            atlas,
            hash,
            members,
        } => format!(
            "{} atlas for {} usage(s) -> {} [{}]",
            layout,
            members,
            atlas.display(),
            hash.get(..12).unwrap_or(hash.as_str())
        ),
        GroupOutcome::Patched {
            reason,
            matched,
            changed,
        } => {
            let counts = format!("{} of {} texture(s) changed", changed, matched);
            match reason {
                Some(reason) => format!("{} ({})", counts, reason),
                None => counts,
            }
        }
        GroupOutcome::Deferred { reason } => format!("{} (pass --glb to patch)", reason),
        GroupOutcome::Untouched => "samples correctly as exported".to_string(),
    }
}
