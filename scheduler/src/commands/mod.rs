mod bounds;
mod compare;
mod normalize;

use std::{fs, path::Path};

use anyhow::{Context, Result};
use log::trace;
use rcpsp_mm::Instance;

pub use bounds::bounds;
pub use compare::compare;
pub use normalize::normalize;

fn read_instance(path: &Path) -> Result<Instance> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    trace!("input file contents: {contents}");

    Instance::parse(&contents).with_context(|| format!("failed to load {}", path.display()))
}
