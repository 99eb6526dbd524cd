use log::debug;

use crate::dag::Bounds;
use crate::error::Result;
use crate::instance::Instance;
use crate::model::{AbstractModel, Assignment, LinearExpr, Sense};
use crate::schedule::Schedule;

use super::grid::{self, TimeGrid};
use super::{Formulation, Precedence};

/// Start pulses `x[i,m,t]` together with on-off indicators `y[i,m,t]`
/// connected to them. Resources are checked on `y`, everything else on `x`.
#[derive(Debug, Clone, Copy)]
pub struct OnOffPulseFormulation {
    precedence: Precedence,
}

impl OnOffPulseFormulation {
    pub fn new(precedence: Precedence) -> Self {
        Self { precedence }
    }

    fn grids(instance: &Instance) -> (TimeGrid, TimeGrid) {
        let pulses = TimeGrid::new(instance, 0);
        let onoff = TimeGrid::new(instance, pulses.end());
        (pulses, onoff)
    }
}

impl Formulation for OnOffPulseFormulation {
    fn name(&self) -> &'static str {
        match self.precedence {
            Precedence::Aggregated => "OOPDT",
            Precedence::Disaggregated => "OOPDDT",
        }
    }

    fn build(&self, instance: &Instance, bounds: &Bounds) -> Result<AbstractModel> {
        let mut model = AbstractModel::new(self.name());

        let (pulses, onoff) = Self::grids(instance);
        pulses.declare(&mut model, "pulse");
        onoff.declare(&mut model, "onoff");

        model.set_objective(grid::sink_start(&pulses, instance));

        grid::schedule_pulses_once(&mut model, &pulses, instance);

        for i in 0..instance.activities() {
            for m in 0..instance.modes() {
                let duration = instance.duration(i, m) as usize;

                for t in 0..=onoff.horizon() {
                    model.add_constraint(
                        "connect",
                        format!("connect[{i},{m},{t}]"),
                        LinearExpr::from(onoff.at(i, m, t))
                            - grid::occupancy(&pulses, i, m, duration, t),
                        Sense::Eq,
                        0.0,
                    );
                }

                model.add_constraint(
                    "connect_duration",
                    format!("connect_duration[{i},{m}]"),
                    onoff.mass(i, m, 1.0) - pulses.mass(i, m, duration as f64),
                    Sense::Eq,
                    0.0,
                );
            }
        }

        grid::pulse_precedence(&mut model, &pulses, instance, self.precedence);
        grid::limit_resources(&mut model, instance, |i, m, t| {
            LinearExpr::from(onoff.at(i, m, t))
        });
        grid::link_pulse_modes(&mut model, &pulses, instance);
        grid::fix_before_earliest_start(&mut model, &pulses, instance, bounds);
        grid::forbid_late_starts(&mut model, &pulses, instance);

        debug!(
            "{}: {} variables, {} constraints",
            self.name(),
            model.num_variables(),
            model.num_constraints()
        );

        Ok(model)
    }

    fn decode(&self, instance: &Instance, assignment: &Assignment) -> Option<Schedule> {
        let (pulses, _) = Self::grids(instance);
        grid::decode_pulses(&pulses, instance, assignment)
    }

    fn encode(&self, instance: &Instance, schedule: &Schedule) -> Assignment {
        let (pulses, onoff) = Self::grids(instance);

        let mut assignment = Assignment::zeros(onoff.end());
        grid::encode_pulses(&pulses, instance, schedule, &mut assignment);

        for i in 0..instance.activities() {
            let mode = schedule.mode(i);
            for t in schedule.start(i)..schedule.finish(instance, i) {
                assignment.set(onoff.at(i, mode, t as usize), 1.0);
            }
        }

        assignment
    }
}
