//! Pipeline from an instance to a solved and verified schedule: normalize the
//! time data, estimate start windows, build one encoding and hand it to a
//! solver, then convert everything back to the original time units.

use std::time::Duration;

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::dag::{Bounds, PrecedenceGraph};
use crate::error::Result;
use crate::formulations::Encoding;
use crate::instance::Instance;
use crate::model::{AbstractModel, TOLERANCE};
use crate::normalize::{normalize, Normalized};
use crate::schedule::Schedule;
use crate::solver::{SolveOptions, SolverAdapter, SolverStatus};

/// A compiled model together with the normalized instance it was built for.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub encoding: Encoding,
    pub normalized: Normalized,
    pub bounds: Bounds,
    pub model: AbstractModel,
}

#[derive(Debug, Clone, Serialize)]
pub struct SolveResult {
    pub encoding: Encoding,
    pub model_name: String,
    pub status: SolverStatus,
    /// Makespan in original time units
    pub objective: Option<f64>,
    pub gap: Option<f64>,
    pub runtime: Duration,
    pub variables: usize,
    pub constraints: usize,
    pub divisor: u32,
    /// Decoded schedule in original time units
    pub schedule: Option<Schedule>,
}

pub fn prepare(instance: &Instance, encoding: Encoding) -> Result<Prepared> {
    let normalized = normalize(instance)?;
    let divisor = normalized.divisor;

    let graph = PrecedenceGraph::new(&normalized.instance)?;
    let bounds = graph.compute_bounds();

    let lower_bound = graph.compute_lower_bound() as u64 * divisor as u64;
    let upper_bound = graph.compute_upper_bound() * divisor as u64;
    info!("{encoding}: makespan between {lower_bound} and {upper_bound}");
    if (instance.horizon() as u64) < lower_bound {
        warn!(
            "horizon {} is shorter than the critical path {lower_bound}",
            instance.horizon()
        );
    }

    let model = encoding.formulation().build(&normalized.instance, &bounds)?;
    debug!("{encoding}: built families {:?}", model.family_counts());

    Ok(Prepared {
        encoding,
        normalized,
        bounds,
        model,
    })
}

/// Makespans are integral on the normalized grid, drop the solver's noise
fn snap_to_grid(value: f64) -> f64 {
    let rounded = value.round();
    if (value - rounded).abs() <= TOLERANCE {
        rounded
    } else {
        value
    }
}

pub fn solve(
    instance: &Instance,
    encoding: Encoding,
    solver: &dyn SolverAdapter,
    options: &SolveOptions,
) -> Result<SolveResult> {
    let prepared = prepare(instance, encoding)?;
    let divisor = prepared.normalized.divisor;

    let outcome = solver.solve(&prepared.model, options)?;
    info!(
        "{encoding}: {} after {:?} with {}",
        outcome.status,
        outcome.runtime,
        solver.name()
    );

    let schedule = outcome.assignment.as_ref().and_then(|assignment| {
        let decoded = encoding
            .formulation()
            .decode(&prepared.normalized.instance, assignment);
        if decoded.is_none() {
            warn!("{encoding}: solved values do not describe a schedule");
        }
        decoded.map(|schedule| schedule.rescale(divisor))
    });

    if let Some(schedule) = &schedule {
        if let Err(violation) = schedule.verify(instance) {
            warn!("{encoding}: decoded schedule is not feasible: {violation}");
        }
    }

    Ok(SolveResult {
        encoding,
        model_name: prepared.model.name().to_string(),
        status: outcome.status,
        objective: outcome
            .objective
            .map(|value| prepared.normalized.restore(snap_to_grid(value))),
        gap: outcome.gap,
        runtime: outcome.runtime,
        variables: prepared.model.num_variables(),
        constraints: prepared.model.num_constraints(),
        divisor,
        schedule,
    })
}

/// Run one independent pipeline per encoding, results in the given order.
pub fn compare(
    instance: &Instance,
    encodings: &[Encoding],
    solver: &dyn SolverAdapter,
    options: &SolveOptions,
) -> Vec<(Encoding, Result<SolveResult>)> {
    let run = |&encoding: &Encoding| (encoding, solve(instance, encoding, solver, options));

    if options.parallel {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(num_cpus::get())
            .build()
        {
            Ok(pool) => pool.install(|| encodings.par_iter().map(run).collect()),
            Err(err) => {
                warn!("falling back to the global thread pool: {err}");
                encodings.par_iter().map(run).collect()
            }
        }
    } else {
        encodings.iter().map(run).collect()
    }
}
