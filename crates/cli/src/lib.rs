pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::commands::{quote::QuoteArgs, select::SelectArgs};

#[derive(Debug, Parser)]
#[command(
    name = "packquote",
    about = "Packaging pouch quote CLI",
    long_about = "Price pouch configurations, browse the catalog and check option rules.",
    after_help = "Examples:\n  packquote quote --bag-type stand-up --size md --material pet-pe --quantity 1000 --colors 4\n  packquote select --bag-type stand-up --material pet-pe --add spout-corner\n  packquote doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Price a configuration and print unit price, tiers, MOQ and delivery window")]
    Quote(QuoteArgs),
    #[command(about = "List bag types, sizes, materials, processes and quantity tiers")]
    Catalog {
        #[arg(long, help = "Emit the catalog as JSON")]
        json: bool,
    },
    #[command(about = "Apply one configurator change and print the resulting selection")]
    Select(SelectArgs),
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, catalog loading and a reference quote")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Quote(args) => commands::quote::run(&args),
        Command::Catalog { json } => commands::catalog::run(json),
        Command::Select(args) => commands::select::run(&args),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
