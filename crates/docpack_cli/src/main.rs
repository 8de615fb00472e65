//! DocPack CLI
//!
//! Command-line tools for DocPack documents.
//!
//! # Commands
//!
//! - `import` - Build a document file from JSON
//! - `export` - Print a document as JSON
//! - `inspect` - Display document statistics and layout
//! - `get` - Print one field
//! - `update` - Apply an update document and commit
//! - `verify` - Verify document integrity

mod commands;
mod convert;

use clap::{Parser, Subcommand};
use docpack_core::DEFAULT_MAX_DEPTH;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// DocPack command-line document tools.
#[derive(Parser)]
#[command(name = "docpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a document file from a JSON file
    Import {
        /// JSON input file
        input: PathBuf,

        /// Document output file
        output: PathBuf,

        /// Maximum container nesting
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },

    /// Print a document as JSON
    Export {
        /// Document file
        doc: PathBuf,

        /// Pretty-print the JSON
        #[arg(short, long)]
        pretty: bool,
    },

    /// Display document statistics and layout
    Inspect {
        /// Document file
        doc: PathBuf,

        /// List every leaf with its buffer location
        #[arg(short, long)]
        tree: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print one field as JSON
    Get {
        /// Document file
        doc: PathBuf,

        /// Field path, e.g. `address.city` or `tags.0`
        field: String,

        /// Pretty-print the JSON
        #[arg(short, long)]
        pretty: bool,
    },

    /// Apply an update document, commit, and save
    Update {
        /// Document file
        doc: PathBuf,

        /// Update document as JSON, or `@file`
        update: String,

        /// Apply every field instead of stopping after the first change
        #[arg(short, long)]
        all_fields: bool,

        /// Write the result here instead of in place
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify document integrity
    Verify {
        /// Document file
        doc: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Import {
            input,
            output,
            max_depth,
        } => {
            commands::import::run(&input, &output, max_depth)?;
        }
        Commands::Export { doc, pretty } => {
            commands::export::run(&doc, pretty)?;
        }
        Commands::Inspect { doc, tree, format } => {
            commands::inspect::run(&doc, tree, &format)?;
        }
        Commands::Get { doc, field, pretty } => {
            commands::get::run(&doc, &field, pretty)?;
        }
        Commands::Update {
            doc,
            update,
            all_fields,
            output,
        } => {
            commands::update::run(&doc, &update, all_fields, output.as_deref())?;
        }
        Commands::Verify { doc } => {
            commands::verify::run(&doc)?;
        }
        Commands::Version => {
            println!("DocPack CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("DocPack Core v{}", docpack_core::VERSION);
        }
    }

    Ok(())
}
