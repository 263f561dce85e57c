//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Scolaris: validation and correction replay for school-administration imports
#[derive(Parser)]
#[command(name = "scolaris")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate an import file against a rule registry
    Check {
        /// Path to the import file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Path to the rule registry JSON
        #[arg(short, long, value_name = "RULES")]
        rules: PathBuf,

        /// Import-type name (keys the correction memory and change log)
        #[arg(short, long, default_value = "default")]
        import_type: String,
    },

    /// Validate and detect systematic, bulk-fixable error patterns
    Analyze {
        /// Path to the import file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Path to the rule registry JSON
        #[arg(short, long, value_name = "RULES")]
        rules: PathBuf,

        /// Import-type name
        #[arg(short, long, default_value = "default")]
        import_type: String,
    },

    /// Replay correction memory and auto-fixes, then export cleaned data
    Apply {
        /// Path to the import file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Path to the rule registry JSON
        #[arg(short, long, value_name = "RULES")]
        rules: PathBuf,

        /// Path to an exported correction-rule file (JSON)
        #[arg(short, long, value_name = "MEMORY")]
        memory: Option<PathBuf>,

        /// Output path for cleaned data (default: <file>_cleaned.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output path for the change-log export
        #[arg(long, value_name = "LOG")]
        log: Option<PathBuf>,

        /// Export only rows without remaining violations
        #[arg(long)]
        clean_only: bool,

        /// Column whose value labels records in the change log
        #[arg(long)]
        label_column: Option<String>,

        /// Import-type name
        #[arg(short, long, default_value = "default")]
        import_type: String,
    },

    /// Show (or clear) the locally stored correction rules
    Status {
        /// Path to the local rule store (JSON)
        #[arg(value_name = "STORE")]
        store: PathBuf,

        /// Import-type name
        #[arg(short, long, default_value = "default")]
        import_type: String,

        /// Delete all stored rules for the import-type (non-reversible)
        #[arg(long)]
        clear: bool,

        /// Confirm the destructive clear
        #[arg(long)]
        yes: bool,
    },
}
