//! Scolaris CLI - import validation and correction replay.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            file,
            rules,
            import_type,
        } => commands::check::run(file, rules, import_type, cli.verbose),

        Commands::Analyze {
            file,
            rules,
            import_type,
        } => commands::analyze::run(file, rules, import_type, cli.verbose),

        Commands::Apply {
            file,
            rules,
            memory,
            output,
            log,
            clean_only,
            label_column,
            import_type,
        } => commands::apply::run(
            file,
            rules,
            memory,
            output,
            log,
            clean_only,
            label_column,
            import_type,
            cli.verbose,
        ),

        Commands::Status {
            store,
            import_type,
            clear,
            yes,
        } => commands::status::run(store, import_type, clear, yes, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
