use log::debug;

use crate::dag::Bounds;
use crate::error::Result;
use crate::instance::Instance;
use crate::model::{AbstractModel, Assignment};
use crate::schedule::Schedule;

use super::grid::{self, TimeGrid};
use super::{Formulation, Precedence};

/// Time indexed model on start pulses `x[i,m,t]`.
#[derive(Debug, Clone, Copy)]
pub struct PulseFormulation {
    precedence: Precedence,
}

impl PulseFormulation {
    pub fn new(precedence: Precedence) -> Self {
        Self { precedence }
    }
}

impl Formulation for PulseFormulation {
    fn name(&self) -> &'static str {
        match self.precedence {
            Precedence::Aggregated => "PDT",
            Precedence::Disaggregated => "PDDT",
        }
    }

    fn build(&self, instance: &Instance, bounds: &Bounds) -> Result<AbstractModel> {
        let mut model = AbstractModel::new(self.name());

        let pulses = TimeGrid::new(instance, 0);
        pulses.declare(&mut model, "pulse");

        model.set_objective(grid::sink_start(&pulses, instance));

        grid::schedule_pulses_once(&mut model, &pulses, instance);
        grid::pulse_precedence(&mut model, &pulses, instance, self.precedence);
        grid::limit_resources(&mut model, instance, |i, m, t| {
            grid::occupancy(&pulses, i, m, instance.duration(i, m) as usize, t)
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
        grid::decode_pulses(&TimeGrid::new(instance, 0), instance, assignment)
    }

    fn encode(&self, instance: &Instance, schedule: &Schedule) -> Assignment {
        let pulses = TimeGrid::new(instance, 0);

        let mut assignment = Assignment::zeros(pulses.end());
        grid::encode_pulses(&pulses, instance, schedule, &mut assignment);
        assignment
    }
}
