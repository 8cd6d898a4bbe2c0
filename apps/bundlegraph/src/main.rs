//! # Bundlegraph - Asset Bundle Planner
//!
//! The main binary for the bundlegraph planner.
//!
//! This application provides:
//! - Catalog snapshot loading (JSON)
//! - Packing configuration loading (TOML)
//! - Manifest and build list output (JSON)
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │           apps/bundlegraph (THE BINARY)       │
//! │                                               │
//! │   catalog.json ──┐                            │
//! │                  ├──► CLI (clap) ──► files    │
//! │   config.toml ───┘        │                   │
//! │                           ▼                   │
//! │                 ┌──────────────────┐          │
//! │                 │ bundlegraph-core │          │
//! │                 │   (THE LOGIC)    │          │
//! │                 └──────────────────┘          │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Write a default packing configuration
//! bundlegraph init -o bundlegraph.toml
//!
//! # Plan bundles and write manifest.json + build_list.json
//! bundlegraph plan -c catalog.json -C bundlegraph.toml -o out/
//!
//! # Dry run: report only
//! bundlegraph check -c catalog.json
//! ```

use bundlegraph::cli;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // BUNDLEGRAPH_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("BUNDLEGRAPH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "bundlegraph=debug,bundlegraph_core=debug"
    } else {
        "bundlegraph=info,bundlegraph_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!("bundlegraph v{} - asset bundle planner", env!("CARGO_PKG_VERSION"));
    println!();
}
