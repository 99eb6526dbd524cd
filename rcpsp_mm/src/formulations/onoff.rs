use log::debug;

use crate::dag::Bounds;
use crate::error::{RcpspError, Result};
use crate::instance::Instance;
use crate::model::{AbstractModel, Assignment, LinearExpr, Sense};
use crate::schedule::Schedule;

use super::grid::{self, TimeGrid};
use super::Formulation;

/// Time indexed model on on-off indicators `y[i,m,t]`, set while the activity
/// occupies slot `t` in mode `m`.
///
/// Source and sink have no duration, their indicator marks the instant at
/// which they happen. Any other activity needs a positive duration in every
/// mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnOffFormulation;

impl OnOffFormulation {
    fn check_durations(&self, instance: &Instance) -> Result<()> {
        for activity in 0..instance.activities() {
            if instance.is_dummy(activity) {
                continue;
            }
            if let Some(mode) =
                (0..instance.modes()).find(|&mode| instance.duration(activity, mode) == 0)
            {
                return Err(RcpspError::UnsupportedZeroDurationActivity {
                    activity,
                    mode,
                    encoding: self.name(),
                });
            }
        }
        Ok(())
    }
}

/// Weight of one indicator in the "one full window" count
fn window_weight(instance: &Instance, activity: usize, mode: usize) -> f64 {
    1.0 / instance.duration(activity, mode).max(1) as f64
}

impl Formulation for OnOffFormulation {
    fn name(&self) -> &'static str {
        "OODDT"
    }

    fn build(&self, instance: &Instance, bounds: &Bounds) -> Result<AbstractModel> {
        self.check_durations(instance)?;

        let mut model = AbstractModel::new(self.name());

        let onoff = TimeGrid::new(instance, 0);
        onoff.declare(&mut model, "onoff");
        let horizon = onoff.horizon();

        model.set_objective(grid::sink_start(&onoff, instance));

        for i in 0..instance.activities() {
            let mut expr = LinearExpr::new();
            for m in 0..instance.modes() {
                expr += onoff.mass(i, m, window_weight(instance, i, m));
            }
            model.add_constraint("schedule", format!("schedule[{i}]"), expr, Sense::Eq, 1.0);
        }

        // an active window ending at t spans the p - 1 slots before it
        for i in 0..instance.activities() {
            if instance.is_dummy(i) {
                continue;
            }
            for m in 0..instance.modes() {
                let duration = instance.duration(i, m) as usize;
                for t in 0..horizon {
                    let mut expr = (LinearExpr::from(onoff.at(i, m, t))
                        - LinearExpr::from(onoff.at(i, m, t + 1)))
                        * duration as f64;
                    for tau in (t + 1).saturating_sub(duration)..t {
                        expr.add_term(onoff.at(i, m, tau), -1.0);
                    }
                    model.add_constraint(
                        "started_same_mode",
                        format!("started_same_mode[{i},{m},{t}]"),
                        expr,
                        Sense::Le,
                        1.0,
                    );
                }
            }
        }

        // the completed share of i before t covers every activity of j at t
        for &(i, j) in instance.precedences() {
            for t in 0..=horizon {
                let mut expr = LinearExpr::new();
                for m in 0..instance.modes() {
                    let duration = instance.duration(i, m) as usize;
                    let weight = window_weight(instance, i, m);
                    if let Some(last) = t.checked_sub(duration.min(1)) {
                        for tau in 0..=last {
                            expr.add_term(onoff.at(i, m, tau), weight);
                        }
                    }
                    expr.add_term(onoff.at(j, m, t), -1.0);
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

        grid::limit_resources(&mut model, instance, |i, m, t| {
            if instance.duration(i, m) > 0 {
                LinearExpr::from(onoff.at(i, m, t))
            } else {
                LinearExpr::new()
            }
        });

        for &(i, j) in instance.linked() {
            for m in 0..instance.modes() {
                model.add_constraint(
                    "linked",
                    format!("linked[{i},{j},{m}]"),
                    onoff.mass(i, m, window_weight(instance, i, m))
                        - onoff.mass(j, m, window_weight(instance, j, m)),
                    Sense::Eq,
                    0.0,
                );
            }
        }

        grid::fix_before_earliest_start(&mut model, &onoff, instance, bounds);

        // instant T is past the last slot
        for i in 0..instance.activities() {
            if instance.is_dummy(i) {
                continue;
            }
            for m in 0..instance.modes() {
                model.add_constraint(
                    "horizon",
                    format!("horizon[{i},{m}]"),
                    onoff.at(i, m, horizon).into(),
                    Sense::Eq,
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
        let onoff = TimeGrid::new(instance, 0);

        let mut assignment = Assignment::zeros(onoff.end());
        for i in 0..instance.activities() {
            let mode = schedule.mode(i);
            let start = schedule.start(i);
            let finish = schedule.finish(instance, i).max(start + 1);
            for t in start..finish {
                assignment.set(onoff.at(i, mode, t as usize), 1.0);
            }
        }
        assignment
    }
}

#[cfg(test)]
mod tests {
    use crate::dag::estimate_bounds;
    use crate::error::RcpspError;
    use crate::formulations::tests::{assert_accepts, assert_rejects};
    use crate::formulations::Formulation;
    use crate::model::Assignment;
    use crate::schedule::{fastest_serial_schedule, Schedule};
    use crate::testing::{
        chain_instance, linked_instance, random_instance, unlinked_instance, zero_duration_instance,
    };

    use super::OnOffFormulation;

    #[test]
    fn accepts_feasible_schedules() {
        let formulation = OnOffFormulation;

        assert_accepts(
            &formulation,
            &chain_instance(),
            &Schedule::new(vec![0, 2, 5], vec![0; 3]),
        );
        assert_accepts(
            &formulation,
            &linked_instance(),
            &Schedule::new(vec![0, 0, 2, 4], vec![0; 4]),
        );
        assert_accepts(
            &formulation,
            &unlinked_instance(),
            &Schedule::new(vec![1, 1, 2, 5], vec![0, 0, 1, 0]),
        );
    }

    #[test]
    fn rejects_infeasible_schedules() {
        let formulation = OnOffFormulation;

        assert_rejects(
            &formulation,
            &linked_instance(),
            &Schedule::new(vec![0, 1, 0, 3], vec![0; 4]),
        );
        assert_rejects(
            &formulation,
            &linked_instance(),
            &Schedule::new(vec![0, 0, 1, 2], vec![1; 4]),
        );
    }

    #[test]
    fn gaps_in_the_active_window_are_rejected() {
        let instance = chain_instance();
        let bounds = estimate_bounds(&instance).unwrap();
        let model = OnOffFormulation.build(&instance, &bounds).unwrap();

        let witness = OnOffFormulation.encode(&instance, &Schedule::new(vec![0, 0, 3], vec![0; 3]));
        let mut values = witness.values().to_vec();
        // activity 1 runs in slots 0, 2 and 3 instead of 0, 1 and 2
        values[7 + 1] = 0.0;
        values[7 + 3] = 1.0;

        let families: Vec<&str> = model
            .violations(&Assignment::from_values(values))
            .into_iter()
            .map(|constraint| constraint.family)
            .collect();
        assert!(families.contains(&"started_same_mode"));
    }

    #[test]
    fn zero_duration_real_activity_is_unsupported() {
        let instance = zero_duration_instance();
        let bounds = estimate_bounds(&instance).unwrap();

        match OnOffFormulation.build(&instance, &bounds) {
            Err(RcpspError::UnsupportedZeroDurationActivity {
                activity: 1,
                mode: 1,
                encoding,
            }) => assert_eq!(encoding, "OODDT"),
            other => panic!("expected an unsupported activity, got {other:?}"),
        }
    }

    #[test]
    fn random_serial_schedules_are_accepted() {
        for seed in 30..40 {
            let instance = random_instance(seed, 7, 2, 2);
            let schedule = fastest_serial_schedule(&instance).unwrap().unwrap();

            assert_accepts(&OnOffFormulation, &instance, &schedule);
        }
    }
}
