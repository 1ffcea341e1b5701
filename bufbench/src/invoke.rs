//! Launching the tool under test.
//!
//! The tool is started as `<program> <tech-file> <test-file>` from a fixed
//! working directory, which it uses to resolve its own relative output paths.
//! Stdout and stderr share one capture file that is read back once the
//! process exits.

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

#[cfg(unix)]
use nix::sys::signal::{Signal, killpg};
#[cfg(unix)]
use nix::unistd::Pid;
#[cfg(unix)]
use std::os::unix::process::CommandExt;

use crate::{
    aggregate::{MeasurementSample, TrialRunner},
    config::HarnessConfig,
    error::{BenchError, Result},
    output::parse_report,
    sweep::CancelToken,
    testcase::{testcase_path, write_testcase},
};

const POLL_INTERVAL: Duration = Duration::from_millis(5);
const TERMINATE_GRACE: Duration = Duration::from_secs(2);

/// Text captured from one finished run.
#[derive(Debug, Clone)]
pub struct RawOutput {
    pub text: String,
    pub status: ExitStatus,
}

/// The tool under test together with everything that stays fixed for a run.
#[derive(Debug, Clone)]
pub struct ExternalTool {
    program: PathBuf,
    tech_file: PathBuf,
    scratch_dir: PathBuf,
    workdir: PathBuf,
    timeout: Duration,
    cancel: CancelToken,
}

impl ExternalTool {
    /// Resolves every path up front so the tool's working directory cannot
    /// change what they point at. A program that does not exist is reported
    /// as a launch failure.
    pub fn new(config: &HarnessConfig, cancel: CancelToken) -> Result<Self> {
        let program = resolve_program(&config.program)?;
        let tech_file = config.tech_file.canonicalize().map_err(|e| {
            BenchError::InvalidConfig(format!(
                "technology file {}: {e}",
                config.tech_file.display()
            ))
        })?;
        fs::create_dir_all(&config.scratch_dir)?;
        let scratch_dir = config.scratch_dir.canonicalize()?;
        fs::create_dir_all(config.workdir())?;
        let workdir = config.workdir().canonicalize()?;

        Ok(Self {
            program,
            tech_file,
            scratch_dir,
            workdir,
            timeout: config.timeout(),
            cancel,
        })
    }

    #[must_use]
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Exact command as it is executed, for diagnostics.
    #[must_use]
    pub fn command_line(&self, test_file: &Path) -> String {
        format!(
            "{} {} {} (cwd: {})",
            self.program.display(),
            self.tech_file.display(),
            test_file.display(),
            self.workdir.display()
        )
    }

    /// Runs the tool once on an existing scenario file, capturing its
    /// combined output in `capture`.
    pub fn run_case(&self, test_file: &Path, capture: &Path) -> Result<RawOutput> {
        self.invoke(&test_file.canonicalize()?, capture)
    }

    fn invoke(&self, test_file: &Path, capture: &Path) -> Result<RawOutput> {
        let command_line = self.command_line(test_file);
        if self.cancel.is_cancelled() {
            return Err(BenchError::Cancelled {
                command: command_line,
            });
        }

        let log_file = File::create(capture)?;
        let log_clone = log_file.try_clone()?;

        let mut command = Command::new(&self.program);
        command
            .arg(&self.tech_file)
            .arg(test_file)
            .current_dir(&self.workdir)
            .stdin(Stdio::null());

        // Own process group so a timeout takes down anything the tool forked
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(log_clone))
            .spawn()
            .map_err(|source| BenchError::ProcessLaunch {
                command: command_line.clone(),
                source,
            })?;

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }

            if self.cancel.is_cancelled() {
                log::debug!("cancelling `{command_line}`");
                kill_process_tree(&mut child);
                return Err(BenchError::Cancelled {
                    command: command_line,
                });
            }

            if Instant::now() >= deadline {
                log::warn!("`{command_line}` exceeded {:?}, terminating", self.timeout);
                kill_process_tree(&mut child);
                return Err(BenchError::Timeout {
                    command: command_line,
                    timeout: self.timeout,
                    output: read_capture(capture).unwrap_or_default(),
                });
            }

            thread::sleep(POLL_INTERVAL);
        };

        log::debug!("`{command_line}` exited with {status}");
        Ok(RawOutput {
            text: read_capture(capture)?,
            status,
        })
    }
}

impl TrialRunner for ExternalTool {
    fn prepare(&self, length: u64) -> Result<()> {
        write_testcase(&self.scratch_dir, length).map(|_| ())
    }

    fn run_trial(&self, length: u64) -> Result<MeasurementSample> {
        let test_file = testcase_path(&self.scratch_dir, length);
        let output = self.invoke(&test_file, &test_file.with_extension("log"))?;
        if !output.status.success() {
            log::warn!("length {length}: tool exited with {}", output.status);
        }
        let report = parse_report(&output.text, &self.command_line(&test_file))?;
        Ok(MeasurementSample {
            length,
            elapsed_time: report.algo_time,
            quality: report.rat,
        })
    }
}

/// Bare names are left for `PATH` lookup, anything with a directory part
/// must exist.
fn resolve_program(program: &Path) -> Result<PathBuf> {
    if program.components().count() > 1 || program.is_absolute() {
        program
            .canonicalize()
            .map_err(|source| BenchError::ProcessLaunch {
                command: program.display().to_string(),
                source,
            })
    } else {
        Ok(program.to_path_buf())
    }
}

fn read_capture(path: &Path) -> Result<String> {
    Ok(String::from_utf8_lossy(&fs::read(path)?).into_owned())
}

fn wait_with_grace(child: &mut Child, grace: Duration) -> bool {
    let deadline = Instant::now() + grace;
    while Instant::now() < deadline {
        if child.try_wait().ok().flatten().is_some() {
            return true;
        }
        thread::sleep(POLL_INTERVAL);
    }
    false
}

/// Terminate the child and everything in its process group.
///
/// Sends SIGTERM first, waits up to the grace period, then SIGKILL.
#[cfg(unix)]
fn kill_process_tree(child: &mut Child) {
    let Ok(raw) = i32::try_from(child.id()) else {
        let _ = child.kill();
        let _ = child.wait();
        return;
    };
    // process_group(0) made the child its own group leader
    let pgid = Pid::from_raw(raw);

    let _ = killpg(pgid, Signal::SIGTERM);
    if !wait_with_grace(child, TERMINATE_GRACE) {
        let _ = killpg(pgid, Signal::SIGKILL);
    }
    let _ = child.wait();
}

#[cfg(not(unix))]
fn kill_process_tree(child: &mut Child) {
    let _ = child.kill();
    let _ = wait_with_grace(child, TERMINATE_GRACE);
    let _ = child.wait();
}
