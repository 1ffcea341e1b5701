use std::path::PathBuf;

use bufbench::{plot, store};
use clap::Args;

use crate::commands::load_suite;
use crate::error::{CliError, Result};

#[derive(Args, Debug, Default)]
pub struct PlotArgs {
    #[arg(long, help = "Suite YAML to take the table and plot paths from")]
    pub suite: Option<PathBuf>,
    #[arg(long, help = "Result table to read")]
    pub table: Option<PathBuf>,
    #[arg(long, help = "RAT plot path")]
    pub rat_plot: Option<PathBuf>,
    #[arg(long, help = "Time plot path")]
    pub time_plot: Option<PathBuf>,
}

pub struct PlotCommand;

impl PlotCommand {
    pub fn execute(args: &PlotArgs) -> Result<()> {
        let config = load_suite(args.suite.as_deref())?;
        let table = args.table.clone().unwrap_or(config.table);
        let rat_plot = args.rat_plot.clone().unwrap_or(config.rat_plot);
        let time_plot = args.time_plot.clone().unwrap_or(config.time_plot);

        if !table.exists() {
            return Err(CliError::FileNotFound(table.display().to_string()));
        }
        let rows = store::read_table(&table)?;
        plot::render_plots(&rows, &rat_plot, &time_plot)?;
        Ok(())
    }
}
