use std::{fs, path::PathBuf};

use anyhow::Result;
use instance_parser::{structs::InstanceFile, write_instance};
use log::info;

use super::read_instance;

pub fn normalize(path: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let instance = read_instance(&path)?;
    let normalized = rcpsp_mm::normalize::normalize(&instance)?;
    info!("time divisor: {}", normalized.divisor);

    let contents = write_instance(&InstanceFile::from(&normalized.instance), true)?;

    match output {
        Some(output) => {
            fs::write(&output, contents)?;
            info!("Wrote normalized instance to: {:?}", output);
        }
        None => println!("{contents}"),
    }

    Ok(())
}
