//! # Bundlegraph CLI Module
//!
//! This module implements the CLI interface for bundlegraph.
//!
//! ## Available Commands
//!
//! - `plan` - Plan bundles and write the manifest and build list
//! - `check` - Plan bundles and print the report only
//! - `init` - Write a default packing configuration

mod commands;

use bundlegraph_core::BundleGraphError;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Bundlegraph - Asset Bundle Planner
///
/// Decides which assets ship together in which bundle, from a catalog
/// snapshot and a packing configuration.
#[derive(Parser, Debug)]
#[command(name = "bundlegraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan bundles and write manifest.json and build_list.json
    Plan {
        /// Catalog snapshot (JSON)
        #[arg(short, long)]
        catalog: PathBuf,

        /// Packing configuration (TOML); defaults apply when omitted
        #[arg(short = 'C', long)]
        config: Option<PathBuf>,

        /// Directory receiving the output files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Plan bundles without writing any file
    Check {
        /// Catalog snapshot (JSON)
        #[arg(short, long)]
        catalog: PathBuf,

        /// Packing configuration (TOML); defaults apply when omitted
        #[arg(short = 'C', long)]
        config: Option<PathBuf>,
    },

    /// Write a default packing configuration
    Init {
        /// Output file path
        #[arg(short, long, default_value = "bundlegraph.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), BundleGraphError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Plan {
            catalog,
            config,
            output_dir,
        }) => cmd_plan(&catalog, config.as_deref(), &output_dir, json_mode),
        Some(Commands::Check { catalog, config }) => {
            cmd_check(&catalog, config.as_deref(), json_mode)
        }
        Some(Commands::Init { output, force }) => cmd_init(&output, force),
        None => Cli::command()
            .print_help()
            .map_err(|e| BundleGraphError::IoError(format!("Write help: {}", e))),
    }
}
