use log::debug;

use crate::dag::Bounds;
use crate::error::Result;
use crate::instance::Instance;
use crate::model::{AbstractModel, Assignment, LinearExpr, Sense, VarId};
use crate::schedule::Schedule;

use super::Formulation;

/// Continuous time model: real start times, mode selection, and sequencing
/// indicators for every non-ordered pair of activities.
///
/// Resources are checked at the start of every activity: everything that
/// started no later and has not completed yet is counted against the
/// capacity.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContinuousFormulation;

/// Variable ids, declared in this order:
/// `S[i]`, `x[i,m]`, `y[i,j]`, `z[i,j]`, `u[i,j,k]`
struct Layout {
    activities: usize,
    modes: usize,
    resources: usize,
    pairs: Vec<(usize, usize)>,
}

impl Layout {
    fn new(instance: &Instance) -> Self {
        Self {
            activities: instance.activities(),
            modes: instance.modes(),
            resources: instance.resources(),
            pairs: instance.non_ordered_pairs(),
        }
    }

    fn start(&self, activity: usize) -> VarId {
        VarId(activity)
    }

    fn mode(&self, activity: usize, mode: usize) -> VarId {
        VarId(self.activities + activity * self.modes + mode)
    }

    fn pairs_offset(&self) -> usize {
        self.activities * (1 + self.modes)
    }

    /// `y[i,j] = 1`: `j` starts after `i` completes
    fn completion_start(&self, pair: usize) -> VarId {
        VarId(self.pairs_offset() + pair)
    }

    /// `z[i,j] = 1`: `j` starts no earlier than `i`
    fn start_start(&self, pair: usize) -> VarId {
        VarId(self.pairs_offset() + self.pairs.len() + pair)
    }

    /// Amount of resource `k` used by `i` while `j` starts
    fn overlap(&self, pair: usize, resource: usize) -> VarId {
        VarId(self.pairs_offset() + 2 * self.pairs.len() + pair * self.resources + resource)
    }

    fn len(&self) -> usize {
        self.pairs_offset() + self.pairs.len() * (2 + self.resources)
    }

    fn declare(&self, model: &mut AbstractModel, instance: &Instance) {
        let horizon = instance.horizon() as f64;

        for i in 0..self.activities {
            model.add_continuous(format!("start[{i}]"), 0.0, horizon);
        }
        for i in 0..self.activities {
            for m in 0..self.modes {
                model.add_binary(format!("mode[{i},{m}]"));
            }
        }
        for &(i, j) in &self.pairs {
            model.add_binary(format!("completion_start[{i},{j}]"));
        }
        for &(i, j) in &self.pairs {
            model.add_binary(format!("start_start[{i},{j}]"));
        }
        for &(i, j) in &self.pairs {
            for k in 0..self.resources {
                model.add_continuous(
                    format!("overlap[{i},{j},{k}]"),
                    0.0,
                    instance.max_requirement(i, k) as f64,
                );
            }
        }

        debug_assert_eq!(model.num_variables(), self.len());
    }

    /// Chosen duration of an activity
    fn duration(&self, instance: &Instance, activity: usize) -> LinearExpr {
        (0..self.modes)
            .map(|m| (self.mode(activity, m), instance.duration(activity, m) as f64))
            .collect()
    }

    /// Chosen requirement of an activity, zero in modes without duration
    fn requirement(&self, instance: &Instance, activity: usize, resource: usize) -> LinearExpr {
        (0..self.modes)
            .filter(|&m| instance.duration(activity, m) > 0)
            .map(|m| {
                (
                    self.mode(activity, m),
                    instance.requirement(activity, m, resource) as f64,
                )
            })
            .collect()
    }
}

impl Formulation for ContinuousFormulation {
    fn name(&self) -> &'static str {
        "MSEQCT"
    }

    fn build(&self, instance: &Instance, bounds: &Bounds) -> Result<AbstractModel> {
        let mut model = AbstractModel::new(self.name());

        let layout = Layout::new(instance);
        layout.declare(&mut model, instance);

        let horizon = instance.horizon() as f64;

        model.set_objective(layout.start(instance.sink()).into());

        for i in 0..instance.activities() {
            model.add_constraint(
                "earliest_start",
                format!("earliest_start[{i}]"),
                layout.start(i).into(),
                Sense::Ge,
                bounds.earliest_start(i) as f64,
            );
        }

        for i in 0..instance.activities() {
            let modes: LinearExpr = (0..instance.modes())
                .map(|m| (layout.mode(i, m), 1.0))
                .collect();
            model.add_constraint("execute", format!("execute[{i}]"), modes, Sense::Eq, 1.0);
        }

        for &(i, j) in instance.precedences() {
            model.add_constraint(
                "precedence",
                format!("precedence[{i},{j}]"),
                LinearExpr::from(layout.start(i)) + layout.duration(instance, i)
                    - LinearExpr::from(layout.start(j)),
                Sense::Le,
                0.0,
            );
        }

        for i in 0..instance.activities() {
            model.add_constraint(
                "horizon",
                format!("horizon[{i}]"),
                LinearExpr::from(layout.start(i)) + layout.duration(instance, i),
                Sense::Le,
                horizon,
            );
        }

        for (pair, &(i, j)) in layout.pairs.iter().enumerate() {
            // S_i + p_i <= S_j unless y[i,j] = 0
            model.add_constraint(
                "completion_start",
                format!("completion_start[{i},{j}]"),
                LinearExpr::from(layout.start(i)) + layout.duration(instance, i)
                    - LinearExpr::from(layout.start(j))
                    + LinearExpr::term(layout.completion_start(pair), horizon),
                Sense::Le,
                horizon,
            );

            // S_j <= S_i - 1 unless z[i,j] = 1
            model.add_constraint(
                "start_start",
                format!("start_start[{i},{j}]"),
                LinearExpr::from(layout.start(j))
                    - LinearExpr::from(layout.start(i))
                    - LinearExpr::term(layout.start_start(pair), horizon + 1.0),
                Sense::Le,
                -1.0,
            );
        }

        // u[j,i,k] >= r_j when j started no later than i and is still running
        for (pair, &(j, i)) in layout.pairs.iter().enumerate() {
            for k in 0..instance.resources() {
                let largest = instance.max_requirement(j, k) as f64;
                if largest == 0.0 {
                    continue;
                }

                model.add_constraint(
                    "resource_overlap",
                    format!("resource_overlap[{j},{i},{k}]"),
                    layout.requirement(instance, j, k)
                        + LinearExpr::term(layout.start_start(pair), largest)
                        - LinearExpr::term(layout.completion_start(pair), largest)
                        - LinearExpr::from(layout.overlap(pair, k)),
                    Sense::Le,
                    largest,
                );
            }
        }

        for i in 0..instance.activities() {
            for k in 0..instance.resources() {
                let mut expr = layout.requirement(instance, i, k);
                for (pair, _) in layout.pairs.iter().enumerate().filter(|(_, pair)| pair.1 == i) {
                    expr.add_term(layout.overlap(pair, k), 1.0);
                }

                if !expr.is_empty() {
                    model.add_constraint(
                        "resource",
                        format!("resource[{i},{k}]"),
                        expr,
                        Sense::Le,
                        instance.capacity(k) as f64,
                    );
                }
            }
        }

        for &(i, j) in instance.linked() {
            for m in 0..instance.modes() {
                model.add_constraint(
                    "linked",
                    format!("linked[{i},{j},{m}]"),
                    LinearExpr::from(layout.mode(i, m)) - LinearExpr::from(layout.mode(j, m)),
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

    /// Start times are rounded down, which keeps every precedence and never
    /// creates overlaps that the solved model did not have.
    fn decode(&self, instance: &Instance, assignment: &Assignment) -> Option<Schedule> {
        let layout = Layout::new(instance);

        let mut starts = Vec::with_capacity(instance.activities());
        let mut modes = Vec::with_capacity(instance.activities());

        for i in 0..instance.activities() {
            let start = (assignment.value(layout.start(i)) + 1e-6).floor().max(0.0);
            let mode = (0..instance.modes()).find(|&m| assignment.is_set(layout.mode(i, m)))?;

            starts.push(start as u32);
            modes.push(mode);
        }

        Some(Schedule::new(starts, modes))
    }

    fn encode(&self, instance: &Instance, schedule: &Schedule) -> Assignment {
        let layout = Layout::new(instance);
        let mut assignment = Assignment::zeros(layout.len());

        for i in 0..instance.activities() {
            assignment.set(layout.start(i), schedule.start(i) as f64);
            assignment.set(layout.mode(i, schedule.mode(i)), 1.0);
        }

        for (pair, &(i, j)) in layout.pairs.iter().enumerate() {
            let completes_before = schedule.finish(instance, i) <= schedule.start(j);
            let starts_no_later = schedule.start(j) >= schedule.start(i);

            assignment.set(layout.completion_start(pair), f64::from(u8::from(completes_before)));
            assignment.set(layout.start_start(pair), f64::from(u8::from(starts_no_later)));
        }

        // (i, j) is the pair of i running while j starts
        for (pair, &(i, j)) in layout.pairs.iter().enumerate() {
            let running = schedule.start(i) <= schedule.start(j)
                && schedule.finish(instance, i) > schedule.start(j);
            if !running {
                continue;
            }
            for k in 0..instance.resources() {
                let demand = instance.requirement(i, schedule.mode(i), k);
                assignment.set(layout.overlap(pair, k), demand as f64);
            }
        }

        assignment
    }
}

#[cfg(test)]
mod tests {
    use crate::dag::estimate_bounds;
    use crate::formulations::tests::{assert_accepts, assert_rejects};
    use crate::formulations::Formulation;
    use crate::model::Assignment;
    use crate::schedule::{fastest_serial_schedule, Schedule};
    use crate::testing::{chain_instance, linked_instance, random_instance, unlinked_instance};

    use super::{ContinuousFormulation, Layout};

    #[test]
    fn layout_matches_declaration() {
        let instance = linked_instance();
        let bounds = estimate_bounds(&instance).unwrap();
        let model = ContinuousFormulation.build(&instance, &bounds).unwrap();

        let layout = Layout::new(&instance);
        // 4 starts, 8 modes, 4 pairs with y and z, 4 overlaps on one resource
        assert_eq!(layout.len(), 4 + 8 + 4 * 2 + 4);
        assert_eq!(model.num_variables(), layout.len());
        assert_eq!(model.variable(layout.mode(2, 1)).name, "mode[2,1]");
        assert_eq!(model.variable(layout.start_start(1)).name, "start_start[1,2]");
        assert_eq!(model.variable(layout.overlap(2, 0)).name, "overlap[2,1,0]");
        assert_eq!(model.variable(layout.overlap(2, 0)).bounds(), (0.0, 2.0));
    }

    #[test]
    fn accepts_feasible_schedules() {
        let formulation = ContinuousFormulation;

        assert_accepts(
            &formulation,
            &chain_instance(),
            &Schedule::new(vec![0, 0, 3], vec![0; 3]),
        );
        assert_accepts(
            &formulation,
            &linked_instance(),
            &Schedule::new(vec![0, 0, 2, 4], vec![0; 4]),
        );
        assert_accepts(
            &formulation,
            &linked_instance(),
            &Schedule::new(vec![0, 3, 0, 4], vec![1; 4]),
        );
        assert_accepts(
            &formulation,
            &unlinked_instance(),
            &Schedule::new(vec![0, 0, 0, 3], vec![0, 0, 1, 0]),
        );
    }

    #[test]
    fn rejects_infeasible_schedules() {
        let formulation = ContinuousFormulation;

        assert_rejects(
            &formulation,
            &linked_instance(),
            &Schedule::new(vec![0, 0, 1, 4], vec![0; 4]),
        );
        assert_rejects(
            &formulation,
            &linked_instance(),
            &Schedule::new(vec![0, 0, 2, 5], vec![0, 0, 1, 0]),
        );
        assert_rejects(
            &formulation,
            &chain_instance(),
            &Schedule::new(vec![0, 4, 6], vec![0; 3]),
        );
    }

    #[test]
    fn fractional_starts_are_rounded_down() {
        let instance = linked_instance();
        let layout = Layout::new(&instance);

        let schedule = Schedule::new(vec![0, 0, 2, 4], vec![0; 4]);
        let mut values = ContinuousFormulation.encode(&instance, &schedule).values().to_vec();
        values[layout.start(2).index()] = 2.4;
        values[layout.start(3).index()] = 4.0 - 1e-9;

        let decoded = ContinuousFormulation
            .decode(&instance, &Assignment::from_values(values))
            .unwrap();
        assert_eq!(decoded, schedule);
    }

    #[test]
    fn random_serial_schedules_are_accepted() {
        for seed in 40..50 {
            let instance = random_instance(seed, 6, 2, 2);
            let schedule = fastest_serial_schedule(&instance).unwrap().unwrap();

            assert_accepts(&ContinuousFormulation, &instance, &schedule);
        }
    }
}
