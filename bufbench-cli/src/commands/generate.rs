use std::{fs, path::PathBuf};

use bufbench::testcase::write_testcase;
use clap::Args;

use crate::error::{CliError, Result};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[arg(long, help = "Wire length of the generated net")]
    pub length: u64,
    #[arg(long, default_value = "build", help = "Directory to write test<length>.json into")]
    pub out: PathBuf,
}

pub struct GenerateCommand;

impl GenerateCommand {
    pub fn execute(args: &GenerateArgs) -> Result<()> {
        let GenerateArgs { length, out } = args;
        let length = *length;
        if length == 0 {
            return Err(CliError::InvalidInput(
                "length must be greater than zero".to_string(),
            ));
        }
        fs::create_dir_all(out)?;
        let path = write_testcase(out, length)?;
        println!("{}", path.display());
        Ok(())
    }
}
