use std::time::Duration;

use anyhow::Result;
use log::{error, info};
use rcpsp_mm::report::{records, render_json, render_latex, render_table};
use rcpsp_mm::{Encoding, MicroLpSolver, SolveOptions};

use crate::{Compare, ReportFormat};

use super::read_instance;

pub fn compare(compare: Compare, verbose: bool) -> Result<()> {
    let instance = read_instance(&compare.path)?;

    let encodings = if compare.encodings.is_empty() {
        Encoding::ALL.to_vec()
    } else {
        compare.encodings
    };

    let options = SolveOptions::default()
        .with_time_limit(Duration::from_secs(compare.time_limit))
        .with_mip_gap(compare.mip_gap)
        .with_parallel(compare.parallel)
        .with_verbose(verbose);
    info!("comparing {encodings:?} with {options:?}");

    let results = rcpsp_mm::compare(&instance, &encodings, &MicroLpSolver, &options);
    for (encoding, result) in &results {
        if let Err(err) = result {
            error!("{encoding} failed: {err}");
        }
    }
    let records = records(&results);

    let rendered = match compare.format {
        ReportFormat::Table => render_table(&records),
        ReportFormat::Latex => render_latex(&records),
        ReportFormat::Json => render_json(&records)?,
    };
    println!("{rendered}");

    Ok(())
}
