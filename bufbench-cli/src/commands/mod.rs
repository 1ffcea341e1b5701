pub mod generate;
pub mod plot;
pub mod run;
pub mod update;

pub use generate::GenerateCommand;
pub use plot::PlotCommand;
pub use run::RunCommand;
pub use update::UpdateResultsCommand;

use std::{fs, path::Path};

use bufbench::HarnessConfig;

use crate::error::{CliError, Result};

/// Reads a suite file, or returns the defaults when none is given. Keys
/// missing from the file keep their default value.
pub fn load_suite(suite: Option<&Path>) -> Result<HarnessConfig> {
    let Some(path) = suite else {
        return Ok(HarnessConfig::default());
    };
    if !path.exists() {
        return Err(CliError::FileNotFound(path.display().to_string()));
    }
    let buf = fs::read(path)?;
    let config: HarnessConfig = serde_yaml::from_slice(&buf)?;
    log::debug!("loaded suite {}: {config:?}", path.display());
    Ok(config)
}
