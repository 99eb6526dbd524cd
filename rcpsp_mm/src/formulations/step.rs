use log::debug;

use crate::dag::Bounds;
use crate::error::Result;
use crate::instance::Instance;
use crate::model::{AbstractModel, Assignment, LinearExpr, Sense};
use crate::schedule::Schedule;

use super::grid::{self, TimeGrid};
use super::{Formulation, Precedence};

/// Time indexed model on monotone indicators `z[i,m,t]`, set once the
/// activity has started in mode `m` at or before `t`.
#[derive(Debug, Clone, Copy)]
pub struct StepFormulation {
    precedence: Precedence,
}

impl StepFormulation {
    pub fn new(precedence: Precedence) -> Self {
        Self { precedence }
    }
}

/// `z[t] - z[t-1]`, the start pulse at `t`
fn pulse(steps: &TimeGrid, activity: usize, mode: usize, t: usize) -> LinearExpr {
    let mut expr = LinearExpr::from(steps.at(activity, mode, t));
    if t > 0 {
        expr.add_term(steps.at(activity, mode, t - 1), -1.0);
    }
    expr
}

/// `z[t] - z[t-p]`, whether slot `t` is occupied
fn occupancy(steps: &TimeGrid, activity: usize, mode: usize, duration: usize, t: usize) -> LinearExpr {
    if duration == 0 {
        return LinearExpr::new();
    }

    let mut expr = LinearExpr::from(steps.at(activity, mode, t));
    if let Some(before) = t.checked_sub(duration) {
        expr.add_term(steps.at(activity, mode, before), -1.0);
    }
    expr
}

impl Formulation for StepFormulation {
    fn name(&self) -> &'static str {
        match self.precedence {
            Precedence::Aggregated => "SDT",
            Precedence::Disaggregated => "SDDT",
        }
    }

    fn build(&self, instance: &Instance, bounds: &Bounds) -> Result<AbstractModel> {
        let mut model = AbstractModel::new(self.name());

        let steps = TimeGrid::new(instance, 0);
        steps.declare(&mut model, "step");
        let horizon = steps.horizon();

        let sink = instance.sink();
        let mut objective = LinearExpr::new();
        for m in 0..instance.modes() {
            for t in 0..=horizon {
                objective += pulse(&steps, sink, m, t) * t as f64;
            }
        }
        model.set_objective(objective);

        for i in 0..instance.activities() {
            let started: LinearExpr = (0..instance.modes())
                .map(|m| (steps.at(i, m, horizon), 1.0))
                .collect();
            model.add_constraint("schedule", format!("schedule[{i}]"), started, Sense::Eq, 1.0);
        }

        for i in 0..instance.activities() {
            for m in 0..instance.modes() {
                for t in 1..=horizon {
                    model.add_constraint(
                        "started_same_mode",
                        format!("started_same_mode[{i},{m},{t}]"),
                        LinearExpr::from(steps.at(i, m, t - 1))
                            - LinearExpr::from(steps.at(i, m, t)),
                        Sense::Le,
                        0.0,
                    );
                }
            }
        }

        for &(i, j) in instance.precedences() {
            match self.precedence {
                Precedence::Aggregated => {
                    let mut expr = LinearExpr::new();
                    for m in 0..instance.modes() {
                        let duration = instance.duration(i, m) as usize;
                        for t in 0..=horizon {
                            expr += pulse(&steps, i, m, t) * (t + duration) as f64;
                            expr += pulse(&steps, j, m, t) * -(t as f64);
                        }
                    }
                    model.add_constraint(
                        "precedence",
                        format!("precedence[{i},{j}]"),
                        expr,
                        Sense::Le,
                        0.0,
                    );
                }
                Precedence::Disaggregated => {
                    for t in 0..=horizon {
                        let mut expr = LinearExpr::new();
                        for m in 0..instance.modes() {
                            let duration = instance.duration(i, m) as usize;
                            if let Some(completed) = t.checked_sub(duration) {
                                expr.add_term(steps.at(i, m, completed), 1.0);
                            }
                            expr.add_term(steps.at(j, m, t), -1.0);
                        }
                        model.add_constraint(
                            "precedence",
                            format!("precedence[{i},{j},{t}]"),
                            expr,
                            Sense::Ge,
                            0.0,
                        );
                    }
                }
            }
        }

        grid::limit_resources(&mut model, instance, |i, m, t| {
            occupancy(&steps, i, m, instance.duration(i, m) as usize, t)
        });

        for &(i, j) in instance.linked() {
            for m in 0..instance.modes() {
                model.add_constraint(
                    "linked",
                    format!("linked[{i},{j},{m}]"),
                    LinearExpr::from(steps.at(i, m, horizon))
                        - LinearExpr::from(steps.at(j, m, horizon)),
                    Sense::Eq,
                    0.0,
                );
            }
        }

        grid::fix_before_earliest_start(&mut model, &steps, instance, bounds);

        // no start after T - p
        for i in 0..instance.activities() {
            for m in 0..instance.modes() {
                let duration = instance.duration(i, m) as usize;
                if duration == 0 {
                    continue;
                }

                let mut expr = LinearExpr::from(steps.at(i, m, horizon));
                if let Some(latest) = horizon.checked_sub(duration) {
                    expr.add_term(steps.at(i, m, latest), -1.0);
                }
                model.add_constraint(
                    "horizon",
                    format!("horizon[{i},{m}]"),
                    expr,
                    Sense::Le,
                    0.0,
                );
            }
        }

        debug!(
            "{}: {} variables, {} constraints",
            self.name(),
            model.num_variables(),
            model.num_constraints()
        );

        Ok(model)
    }

    fn decode(&self, instance: &Instance, assignment: &Assignment) -> Option<Schedule> {
        grid::decode_pulses(&TimeGrid::new(instance, 0), instance, assignment)
    }

    fn encode(&self, instance: &Instance, schedule: &Schedule) -> Assignment {
        let steps = TimeGrid::new(instance, 0);

        let mut assignment = Assignment::zeros(steps.end());
        for i in 0..instance.activities() {
            for t in schedule.start(i) as usize..=steps.horizon() {
                assignment.set(steps.at(i, schedule.mode(i), t), 1.0);
            }
        }
        assignment
    }
}
