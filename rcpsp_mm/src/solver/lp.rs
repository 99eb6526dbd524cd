use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};
use microlp::{ComparisonOp, OptimizationDirection, Problem, Solution, Variable};

use crate::model::{AbstractModel, Assignment, Sense};

use super::{SolveOptions, SolveOutcome, SolverAdapter, SolverError, SolverStatus};

/// Distance from an integer below which a binary counts as fixed
const INTEGRALITY: f64 = 1e-6;

/// Adapter for the pure Rust `microlp` simplex engine.
///
/// microlp solves the linear relaxations. Binaries are branched on here, one
/// fixed variable per node, so the search can stop at the time limit and
/// still report its incumbent and the remaining gap.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpSolver;

/// Linear relaxation of a model, binaries relaxed to `[0, 1]`
struct Relaxation {
    problem: Problem,
    variables: Vec<Variable>,
    binaries: Vec<Variable>,
    /// Objective constant, microlp has no place for it
    offset: f64,
}

/// `None` when a constraint without terms can never hold
fn translate(model: &AbstractModel) -> Option<Relaxation> {
    let mut objective = vec![0.0; model.num_variables()];
    for (var, coefficient) in model.objective().merged() {
        objective[var.index()] += coefficient;
    }

    let mut problem = Problem::new(OptimizationDirection::Minimize);
    let mut binaries = Vec::with_capacity(model.num_binaries());
    let variables: Vec<Variable> = model
        .variables()
        .iter()
        .zip(objective)
        .map(|(variable, coefficient)| {
            let var = problem.add_var(coefficient, variable.bounds());
            if variable.is_binary() {
                binaries.push(var);
            }
            var
        })
        .collect();

    for constraint in model.constraints() {
        let terms: Vec<(Variable, f64)> = constraint
            .expr
            .merged()
            .into_iter()
            .map(|(var, coefficient)| (variables[var.index()], coefficient))
            .collect();

        if terms.is_empty() {
            if !constraint.is_satisfied(&[]) {
                warn!("constraint {} can never hold", constraint.name);
                return None;
            }
            continue;
        }

        let op = match constraint.sense {
            Sense::Le => ComparisonOp::Le,
            Sense::Ge => ComparisonOp::Ge,
            Sense::Eq => ComparisonOp::Eq,
        };
        problem.add_constraint(terms, op, constraint.rhs);
    }

    Some(Relaxation {
        problem,
        variables,
        binaries,
        offset: model.objective().constant_value(),
    })
}

fn relative_gap(objective: f64, bound: f64) -> f64 {
    (objective - bound).max(0.0) / objective.abs().max(f64::EPSILON)
}

/// Open subproblem: `var` fixed to `value` on top of the parent relaxation
struct Node {
    parent: Rc<Solution>,
    var: Variable,
    value: f64,
    /// Objective of the parent relaxation
    bound: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct Incumbent {
    /// Without the objective constant
    objective: f64,
    values: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Exhausted,
    GapReached,
    TimeLimit,
}

/// What is left of a search once it stops
#[derive(Debug, Clone, PartialEq)]
struct SearchReport {
    stop: Stop,
    incumbent: Option<Incumbent>,
    /// Lowest bound over the incumbent and all open nodes
    bound: Option<f64>,
    nodes: usize,
}

/// Depth first branch and bound over the binaries of a relaxation
struct Search<'a> {
    relaxation: &'a Relaxation,
    open: Vec<Node>,
    incumbent: Option<Incumbent>,
    nodes: usize,
}

impl<'a> Search<'a> {
    fn new(relaxation: &'a Relaxation) -> Self {
        Self {
            relaxation,
            open: Vec::new(),
            incumbent: None,
            nodes: 0,
        }
    }

    fn improves(&self, bound: f64) -> bool {
        self.incumbent
            .as_ref()
            .map_or(true, |incumbent| bound < incumbent.objective - INTEGRALITY)
    }

    fn bound(&self) -> Option<f64> {
        let incumbent = self.incumbent.as_ref().map(|incumbent| incumbent.objective);
        self.open
            .iter()
            .map(|node| node.bound)
            .chain(incumbent)
            .reduce(f64::min)
    }

    fn gap(&self) -> Option<f64> {
        let objective = self.incumbent.as_ref()?.objective + self.relaxation.offset;
        let bound = self.bound()? + self.relaxation.offset;
        Some(relative_gap(objective, bound))
    }

    /// Most fractional binary of a relaxed solution
    fn branching_variable(&self, solution: &Solution) -> Option<Variable> {
        self.relaxation
            .binaries
            .iter()
            .map(|&var| (var, (solution[var] - solution[var].round()).abs()))
            .filter(|&(_, fraction)| fraction > INTEGRALITY)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(var, _)| var)
    }

    fn visit(&mut self, solution: Solution) {
        self.nodes += 1;
        let objective = solution.objective();
        if !self.improves(objective) {
            return;
        }

        match self.branching_variable(&solution) {
            Some(var) => {
                let parent = Rc::new(solution);
                // the upper branch is popped first
                self.open.push(Node {
                    parent: Rc::clone(&parent),
                    var,
                    value: 0.0,
                    bound: objective,
                });
                self.open.push(Node {
                    parent,
                    var,
                    value: 1.0,
                    bound: objective,
                });
            }
            None => {
                trace!("incumbent {objective} after {} nodes", self.nodes);
                let values = self
                    .relaxation
                    .variables
                    .iter()
                    .map(|&var| solution[var])
                    .collect();
                self.incumbent = Some(Incumbent { objective, values });
            }
        }
    }

    fn run(&mut self, deadline: Instant, mip_gap: f64) -> Result<Stop, microlp::Error> {
        match self.relaxation.problem.solve() {
            Ok(root) => self.visit(root),
            Err(microlp::Error::Infeasible) => return Ok(Stop::Exhausted),
            Err(err) => return Err(err),
        }

        loop {
            if self.open.is_empty() {
                return Ok(Stop::Exhausted);
            }
            if self.gap().is_some_and(|gap| gap <= mip_gap) {
                return Ok(Stop::GapReached);
            }
            if Instant::now() >= deadline {
                return Ok(Stop::TimeLimit);
            }

            let Some(node) = self.open.pop() else {
                return Ok(Stop::Exhausted);
            };
            if !self.improves(node.bound) {
                continue;
            }

            let parent = Rc::try_unwrap(node.parent).unwrap_or_else(|shared| (*shared).clone());
            match parent.fix_var(node.var, node.value) {
                Ok(solution) => self.visit(solution),
                Err(microlp::Error::Infeasible) => {}
                Err(err) => return Err(err),
            }
        }
    }

    fn into_report(self, stop: Stop) -> SearchReport {
        SearchReport {
            stop,
            bound: self.bound(),
            incumbent: self.incumbent,
            nodes: self.nodes,
        }
    }
}

fn search(
    relaxation: &Relaxation,
    deadline: Instant,
    mip_gap: f64,
) -> Result<SearchReport, microlp::Error> {
    let mut search = Search::new(relaxation);
    let stop = search.run(deadline, mip_gap)?;
    Ok(search.into_report(stop))
}

fn into_outcome(report: SearchReport, offset: f64, runtime: Duration) -> SolveOutcome {
    let SearchReport {
        stop,
        incumbent,
        bound,
        ..
    } = report;

    let Some(incumbent) = incumbent else {
        let status = match stop {
            Stop::TimeLimit => SolverStatus::TimeLimit,
            Stop::Exhausted | Stop::GapReached => SolverStatus::Infeasible,
        };
        return SolveOutcome::without_solution(status, runtime);
    };

    let objective = incumbent.objective + offset;
    let gap = match stop {
        Stop::Exhausted => 0.0,
        Stop::GapReached | Stop::TimeLimit => {
            relative_gap(objective, bound.unwrap_or(incumbent.objective) + offset)
        }
    };
    let status = match stop {
        Stop::TimeLimit => SolverStatus::TimeLimit,
        Stop::Exhausted | Stop::GapReached if gap <= 0.0 => SolverStatus::Optimal,
        Stop::Exhausted | Stop::GapReached => SolverStatus::Feasible,
    };

    SolveOutcome {
        status,
        objective: Some(objective),
        assignment: Some(Assignment::from_values(incumbent.values)),
        gap: Some(gap),
        runtime,
    }
}

impl SolverAdapter for MicroLpSolver {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(
        &self,
        model: &AbstractModel,
        options: &SolveOptions,
    ) -> Result<SolveOutcome, SolverError> {
        let start_time = Instant::now();
        let deadline = start_time + options.time_limit;

        let Some(relaxation) = translate(model) else {
            return Ok(SolveOutcome::without_solution(
                SolverStatus::Infeasible,
                start_time.elapsed(),
            ));
        };

        if options.verbose {
            info!(
                "solving {} with {} variables ({} binary) and {} constraints",
                model.name(),
                model.num_variables(),
                model.num_binaries(),
                model.num_constraints()
            );
        }

        let joined = thread::scope(|scope| {
            scope
                .spawn(|| search(&relaxation, deadline, options.mip_gap))
                .join()
        });
        let runtime = start_time.elapsed();

        let report = match joined {
            Ok(Ok(report)) => report,
            Ok(Err(microlp::Error::Infeasible)) => {
                return Ok(SolveOutcome::without_solution(
                    SolverStatus::Infeasible,
                    runtime,
                ))
            }
            Ok(Err(microlp::Error::Unbounded)) => return Err(SolverError::Unbounded),
            Ok(Err(microlp::Error::InternalError(message))) => {
                return Err(SolverError::Internal(message))
            }
            Err(_) => return Err(SolverError::Panicked),
        };
        debug!(
            "{} stopped ({:?}) after {} nodes and {runtime:?}",
            model.name(),
            report.stop,
            report.nodes
        );
        if report.stop == Stop::TimeLimit {
            warn!(
                "{} hit the time limit of {:?}",
                model.name(),
                options.time_limit
            );
        }

        Ok(into_outcome(report, relaxation.offset, runtime))
    }
}
