use std::{
    fs,
    path::{Path, PathBuf},
};

use bufbench::{CancelToken, ExternalTool};
use clap::Args;

use crate::commands::load_suite;
use crate::error::{CliError, Result};

#[derive(Args, Debug, Default)]
pub struct UpdateArgs {
    #[arg(long, help = "Suite YAML to take the program and technology file from")]
    pub suite: Option<PathBuf>,
    #[arg(long, default_value = "tests", help = "Directory holding test*.json inputs")]
    pub tests_dir: PathBuf,
    #[arg(
        long,
        default_value = "results",
        help = "Working directory the tool writes its outputs into"
    )]
    pub results_dir: PathBuf,
    #[arg(long, help = "Directory for captured tool output (defaults to the suite's)")]
    pub scratch_dir: Option<PathBuf>,
    #[arg(long, help = "Tool under test")]
    pub program: Option<PathBuf>,
    #[arg(long, help = "Technology file passed as the first argument")]
    pub tech: Option<PathBuf>,
}

pub struct UpdateResultsCommand;

impl UpdateResultsCommand {
    /// Runs the tool once per test input with the results directory as its
    /// working directory. Only the tool's own outputs land there; the
    /// `<stem>.log` captures go to the scratch directory. A test that fails is
    /// logged and skipped; a tool that cannot be launched stops the command.
    pub fn execute(args: &UpdateArgs, cancel: &CancelToken) -> Result<()> {
        let mut config = load_suite(args.suite.as_deref())?;
        if let Some(program) = &args.program {
            config.program.clone_from(program);
        }
        if let Some(tech) = &args.tech {
            config.tech_file.clone_from(tech);
        }
        if let Some(scratch_dir) = &args.scratch_dir {
            config.scratch_dir.clone_from(scratch_dir);
        }
        config.workdir = Some(args.results_dir.clone());
        config.validate()?;

        let tests = find_tests(&args.tests_dir)?;
        log::info!(
            "updating {} results in {}",
            tests.len(),
            args.results_dir.display()
        );

        let tool = ExternalTool::new(&config, cancel.clone())?;
        let mut failed = 0usize;
        for (done, test) in tests.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(interrupted(done, tests.len()));
            }
            let stem = test.file_stem().and_then(|s| s.to_str()).unwrap_or("test");
            let capture = tool.scratch_dir().join(format!("{stem}.log"));
            match tool.run_case(test, &capture) {
                Ok(output) if output.status.success() => {
                    log::info!("{}: ok", test.display());
                }
                Ok(output) => {
                    failed += 1;
                    log::error!(
                        "{}: exited with {}, see {}",
                        test.display(),
                        output.status,
                        capture.display()
                    );
                }
                Err(bufbench::BenchError::Cancelled { .. }) => {
                    return Err(interrupted(done, tests.len()));
                }
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    failed += 1;
                    log::error!("{}: {e}", test.display());
                }
            }
        }

        if failed > 0 {
            log::warn!("{failed} of {} tests failed", tests.len());
        }
        Ok(())
    }
}

fn interrupted(done: usize, total: usize) -> CliError {
    CliError::Interrupted(format!("{done} of {total} tests updated"))
}

/// `test*.json` files directly inside `dir`, sorted by name.
fn find_tests(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(CliError::FileNotFound(dir.display().to_string()));
    }
    let mut tests = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_test = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("test") && n.ends_with(".json"));
        if is_test && entry.file_type()?.is_file() {
            tests.push(path);
        }
    }
    tests.sort();
    Ok(tests)
}
