//! wrapfix CLI - repairs texture wrap modes in exported COLLADA assets
//!
//! This binary provides the commands for normalizing scale, condensing
//! mirrored textures into atlases, and writing wrap modes into exported GLB
//! containers.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use wrapfix_cli::commands;
use wrapfix_spec::{FixupConfig, WrapMode};

/// wrapfix - Texture wrap repair for exported COLLADA and GLB assets
#[derive(Parser)]
#[command(name = "wrapfix")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output a machine-readable JSON report (no colored output)
    #[arg(long, global = true)]
    json: bool,

    /// Log stage transitions and per-group decisions (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Multiply geometry and skeleton lengths by a uniform factor
    NormalizeScale {
        /// Path to the COLLADA document
        #[arg(short, long)]
        dae: String,

        /// Scale factor (default converts meters to centimeters)
        #[arg(short, long, default_value_t = FixupConfig::DEFAULT_SCALE_FACTOR)]
        factor: f64,

        /// Output document path (default: overwrite input)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Bake mirrored texture variants into clamp-addressed atlases
    Condense {
        /// Path to the COLLADA document
        #[arg(short, long)]
        dae: String,

        /// Wrap mode assumed where the document declares none (repeat, mirror, clamp)
        #[arg(short, long, default_value = "repeat")]
        base_wrap: WrapMode,

        /// Output document path (default: overwrite input); atlases are written beside it
        #[arg(short, long)]
        output: Option<String>,

        /// Exported GLB to patch with the groups that cannot be condensed
        #[arg(short, long, requires = "glb_output")]
        glb: Option<String>,

        /// Path for the patched GLB
        #[arg(long, requires = "glb")]
        glb_output: Option<String>,
    },

    /// Write the document's wrap modes into an exported GLB
    Export {
        /// Path to the COLLADA document the GLB was exported from
        #[arg(short, long)]
        dae: String,

        /// Path to the exported GLB
        #[arg(short, long)]
        glb: String,

        /// Path for the patched GLB (may equal --glb)
        #[arg(short, long)]
        output: String,

        /// Wrap mode assumed where the document declares none (repeat, mirror, clamp)
        #[arg(short, long, default_value = "repeat")]
        base_wrap: WrapMode,
    },

    /// List samplers, footprints, groups and strategies without writing anything
    Inspect {
        /// Path to the COLLADA document
        #[arg(short, long)]
        dae: String,

        /// Wrap mode assumed where the document declares none (repeat, mirror, clamp)
        #[arg(short, long, default_value = "repeat")]
        base_wrap: WrapMode,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let json = cli.json;
    let result = match cli.command {
        Commands::NormalizeScale {
            dae,
            factor,
            output,
        } => commands::normalize_scale::run(&dae, factor, output.as_deref(), json),
        Commands::Condense {
            dae,
            base_wrap,
            output,
            glb,
            glb_output,
        } => {
            let target = glb.as_deref().zip(glb_output.as_deref());
            commands::condense::run(&dae, base_wrap, output.as_deref(), target, json)
        }
        Commands::Export {
            dae,
            glb,
            output,
            base_wrap,
        } => commands::export::run(&dae, &glb, &output, base_wrap, json),
        Commands::Inspect { dae, base_wrap } => commands::inspect::run(&dae, base_wrap, json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
