//! Boundary between compiled models and MILP engines.
//!
//! Any engine that can take an [`AbstractModel`] and hand back values for its
//! variables can be plugged in through [`SolverAdapter`].

mod lp;

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::model::{AbstractModel, Assignment};

pub use self::lp::MicroLpSolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
    Optimal,
    /// Incumbent within the requested relative gap, not proven optimal
    Feasible,
    Infeasible,
    /// The limit elapsed, with or without an incumbent
    TimeLimit,
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            SolverStatus::Optimal => "optimal",
            SolverStatus::Feasible => "feasible",
            SolverStatus::Infeasible => "infeasible",
            SolverStatus::TimeLimit => "time-limit",
        };
        f.pad(status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    #[error("model is unbounded")]
    Unbounded,
    #[error("solver failed: {0}")]
    Internal(String),
    #[error("solver worker stopped without reporting a result")]
    Panicked,
}

#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolverStatus,
    pub assignment: Option<Assignment>,
    pub objective: Option<f64>,
    /// Relative optimality gap, zero for proven optima
    pub gap: Option<f64>,
    pub runtime: Duration,
}

impl SolveOutcome {
    /// Whether the outcome carries an incumbent
    pub fn has_solution(&self) -> bool {
        self.assignment.is_some()
    }

    /// Outcome without an incumbent
    pub fn without_solution(status: SolverStatus, runtime: Duration) -> Self {
        Self {
            status,
            assignment: None,
            objective: None,
            gap: None,
            runtime,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveOptions {
    pub time_limit: Duration,
    /// Relative gap at which an incumbent is accepted, `0` asks for a proof
    pub mip_gap: f64,
    pub verbose: bool,
    /// Run independent pipelines of a comparison on several threads
    pub parallel: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(60),
            mip_gap: 0.0,
            verbose: false,
            parallel: false,
        }
    }
}

impl SolveOptions {
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_mip_gap(mut self, mip_gap: f64) -> Self {
        self.mip_gap = mip_gap;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

pub trait SolverAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Minimize the model objective. Infeasibility and an elapsed time limit
    /// are reported through the outcome status.
    fn solve(
        &self,
        model: &AbstractModel,
        options: &SolveOptions,
    ) -> Result<SolveOutcome, SolverError>;
}
