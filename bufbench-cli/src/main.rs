mod commands;
mod error;

use bufbench::{CancelToken, cancel_on_signals};
use clap::{Parser, Subcommand};

use crate::commands::{GenerateCommand, PlotCommand, RunCommand, UpdateResultsCommand};
use crate::commands::{
    generate::GenerateArgs, plot::PlotArgs, run::RunArgs, update::UpdateArgs,
};

#[derive(Parser)]
#[command(name = "bufbench", version, about = "Sweep benchmark for a buffer-insertion tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure every length in the sweep, write the table and plot it
    Run(RunArgs),
    /// Render the plots from an existing result table
    Plot(PlotArgs),
    /// Write the generated net for one length
    Generate(GenerateArgs),
    /// Re-run the tool over every test*.json to refresh reference outputs
    UpdateResults(UpdateArgs),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Ctrl-C stops the tool processes before the harness exits
    let cancel = CancelToken::new();
    if let Err(e) = cancel_on_signals(&cancel) {
        log::warn!("interrupts will not stop running tools: {e}");
    }

    let result = match &cli.command {
        Commands::Run(args) => RunCommand::execute(args, &cancel),
        Commands::Plot(args) => PlotCommand::execute(args),
        Commands::Generate(args) => GenerateCommand::execute(args),
        Commands::UpdateResults(args) => UpdateResultsCommand::execute(args, &cancel),
    };

    if let Err(e) = result {
        log::error!("{e}");
        std::process::exit(1);
    }
}
