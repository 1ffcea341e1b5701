use std::path::PathBuf;

use bufbench::{
    CancelToken, ExternalTool, HarnessConfig, SweepReport, plot, run_sweep, store,
};
use clap::Args;

use crate::commands::load_suite;
use crate::error::{CliError, Result};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    #[arg(long, help = "Path to the suite YAML (defaults are used for missing keys)")]
    pub suite: Option<PathBuf>,
    #[arg(long, help = "Tool under test")]
    pub program: Option<PathBuf>,
    #[arg(long, help = "Technology file passed as the first argument")]
    pub tech: Option<PathBuf>,
    #[arg(long, help = "Directory for generated nets and captured output")]
    pub scratch_dir: Option<PathBuf>,
    #[arg(long, help = "Working directory for the tool (defaults to the scratch dir)")]
    pub workdir: Option<PathBuf>,
    #[arg(long, help = "First wire length")]
    pub start: Option<u64>,
    #[arg(long, help = "Wire length to stop before")]
    pub end: Option<u64>,
    #[arg(long, help = "Distance between consecutive lengths")]
    pub step: Option<u64>,
    #[arg(long, help = "Trials averaged per length")]
    pub samples: Option<usize>,
    #[arg(long, help = "Lengths measured in parallel")]
    pub workers: Option<usize>,
    #[arg(long, help = "Per-invocation timeout in milliseconds")]
    pub timeout_ms: Option<u64>,
    #[arg(long, help = "Result table path")]
    pub table: Option<PathBuf>,
    #[arg(long, help = "RAT plot path")]
    pub rat_plot: Option<PathBuf>,
    #[arg(long, help = "Time plot path")]
    pub time_plot: Option<PathBuf>,
    #[arg(long, default_value_t = false, help = "Write rows in completion order")]
    pub unsorted: bool,
    #[arg(long, default_value_t = false, help = "Skip rendering the plots")]
    pub no_plot: bool,
}

impl RunArgs {
    /// Suite file first, then command-line overrides.
    pub fn resolve(&self) -> Result<HarnessConfig> {
        let mut config = load_suite(self.suite.as_deref())?;
        if let Some(program) = &self.program {
            config.program.clone_from(program);
        }
        if let Some(tech) = &self.tech {
            config.tech_file.clone_from(tech);
        }
        if let Some(scratch_dir) = &self.scratch_dir {
            config.scratch_dir.clone_from(scratch_dir);
        }
        if self.workdir.is_some() {
            config.workdir.clone_from(&self.workdir);
        }
        if let Some(start) = self.start {
            config.sweep.start = start;
        }
        if let Some(end) = self.end {
            config.sweep.end = end;
        }
        if let Some(step) = self.step {
            config.sweep.step = step;
        }
        if let Some(samples) = self.samples {
            config.samples = samples;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if let Some(table) = &self.table {
            config.table.clone_from(table);
        }
        if let Some(rat_plot) = &self.rat_plot {
            config.rat_plot.clone_from(rat_plot);
        }
        if let Some(time_plot) = &self.time_plot {
            config.time_plot.clone_from(time_plot);
        }
        if self.unsorted {
            config.sort_results = false;
        }
        config.validate()?;
        Ok(config)
    }
}

pub struct RunCommand;

impl RunCommand {
    /// Cancelling `cancel` stops the sweep; nothing is written in that case.
    pub fn execute(args: &RunArgs, cancel: &CancelToken) -> Result<()> {
        let config = args.resolve()?;
        let tool = ExternalTool::new(&config, cancel.clone())?;

        let lengths = config.sweep.lengths();
        let report = run_sweep(&tool, &lengths, config.samples, config.workers, cancel)?;
        if cancel.is_cancelled() {
            return Err(CliError::Interrupted(format!(
                "{} of {} lengths finished",
                report.results.len(),
                lengths.len()
            )));
        }
        persist(&config, report)?;

        if args.no_plot {
            return Ok(());
        }
        let rows = store::read_table(&config.table)?;
        plot::render_plots(&rows, &config.rat_plot, &config.time_plot)?;
        Ok(())
    }
}

/// Writes the successful rows, in length order unless the suite asks for
/// completion order.
fn persist(config: &HarnessConfig, mut report: SweepReport) -> Result<()> {
    if report.results.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "none of the {} lengths produced a result",
            report.failures.len()
        )));
    }
    if config.sort_results {
        report.results.sort_by_key(|r| r.length);
    }
    store::write_table(&config.table, &report.results)?;

    for failure in &report.failures {
        log::warn!("length {} missing from {}", failure.length, config.table.display());
    }
    Ok(())
}
