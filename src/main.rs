mod common;
mod completions;
mod report;
mod ui;

use clap::{CommandFactory, Parser, Subcommand};

use crate::completions::SupportedShell;
use crate::report::ReportCommands;
use crate::ui::prelude::*;

pub const BIN_NAME: &str = "steps-narrator";

/// Turns Windows Steps Recorder reports into narrated, subtitled walkthroughs
#[derive(Parser, Debug)]
#[command(name = BIN_NAME, author, version, about, long_about = None)]
struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format for status messages and structured command output
    #[arg(long, value_enum, default_value = "text", global = true)]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Report(ReportCommands),

    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: SupportedShell,
    },
}

pub fn cli_command() -> clap::Command {
    Cli::command()
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    ui::set_debug_mode(cli.debug);
    ui::init(cli.output, !cli.no_color);

    let result = match cli.command {
        Commands::Report(command) => report::handle_report_command(command).await,
        Commands::Completions { shell } => {
            completions::generate(shell).map(|script| print!("{script}"))
        }
    };

    if let Err(err) = result {
        emit(Level::Error, "cli.error", &format!("Error: {err:#}"), None);
        std::process::exit(1);
    }
}
