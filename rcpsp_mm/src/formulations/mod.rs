//! MILP encodings of a multi-mode project.
//!
//! Every encoding declares its variables in a fixed order, so the variable
//! layout can be recomputed from the instance alone. This is what lets
//! `decode` and `encode` work on a plain `Assignment`.

pub mod continuous;
mod grid;
pub mod onoff;
pub mod onoff_pulse;
pub mod pulse;
pub mod step;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::dag::Bounds;
use crate::error::Result;
use crate::instance::Instance;
use crate::model::{AbstractModel, Assignment};
use crate::schedule::Schedule;

pub use continuous::ContinuousFormulation;
pub use onoff::OnOffFormulation;
pub use onoff_pulse::OnOffPulseFormulation;
pub use pulse::PulseFormulation;
pub use step::StepFormulation;

/// How precedence relations are written in time indexed encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precedence {
    /// One inequality per edge comparing weighted start instants
    Aggregated,
    /// One inequality per edge and instant comparing cumulative starts
    Disaggregated,
}

pub trait Formulation: Send + Sync {
    /// Short model name used in reports
    fn name(&self) -> &'static str;

    /// Compile an instance into a model. The instance is expected to be
    /// normalized and `bounds` computed for it.
    fn build(&self, instance: &Instance, bounds: &Bounds) -> Result<AbstractModel>;

    /// Read a schedule back from solved variable values
    fn decode(&self, instance: &Instance, assignment: &Assignment) -> Option<Schedule>;

    /// Values of all model variables that represent `schedule`
    fn encode(&self, instance: &Instance, schedule: &Schedule) -> Assignment;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Encoding {
    Continuous,
    OnOff,
    PulseAggregated,
    PulseDisaggregated,
    StepAggregated,
    StepDisaggregated,
    OnOffPulseAggregated,
    OnOffPulseDisaggregated,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown encoding `{0}`")]
pub struct UnknownEncoding(pub String);

impl Encoding {
    pub const ALL: [Encoding; 8] = [
        Encoding::PulseAggregated,
        Encoding::PulseDisaggregated,
        Encoding::StepAggregated,
        Encoding::StepDisaggregated,
        Encoding::OnOff,
        Encoding::OnOffPulseAggregated,
        Encoding::OnOffPulseDisaggregated,
        Encoding::Continuous,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Encoding::Continuous => "MSEQCT",
            Encoding::OnOff => "OODDT",
            Encoding::PulseAggregated => "PDT",
            Encoding::PulseDisaggregated => "PDDT",
            Encoding::StepAggregated => "SDT",
            Encoding::StepDisaggregated => "SDDT",
            Encoding::OnOffPulseAggregated => "OOPDT",
            Encoding::OnOffPulseDisaggregated => "OOPDDT",
        }
    }

    pub fn formulation(self) -> Box<dyn Formulation> {
        match self {
            Encoding::Continuous => Box::new(ContinuousFormulation),
            Encoding::OnOff => Box::new(OnOffFormulation),
            Encoding::PulseAggregated => Box::new(PulseFormulation::new(Precedence::Aggregated)),
            Encoding::PulseDisaggregated => {
                Box::new(PulseFormulation::new(Precedence::Disaggregated))
            }
            Encoding::StepAggregated => Box::new(StepFormulation::new(Precedence::Aggregated)),
            Encoding::StepDisaggregated => {
                Box::new(StepFormulation::new(Precedence::Disaggregated))
            }
            Encoding::OnOffPulseAggregated => {
                Box::new(OnOffPulseFormulation::new(Precedence::Aggregated))
            }
            Encoding::OnOffPulseDisaggregated => {
                Box::new(OnOffPulseFormulation::new(Precedence::Disaggregated))
            }
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = UnknownEncoding;

    /// Accepts the short model names as well as descriptive ones such as
    /// `pulse-disaggregated`, case insensitive.
    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");

        let encoding = match normalized.as_str() {
            "mseqct" | "continuous" => Encoding::Continuous,
            "ooddt" | "onoff" | "on-off" => Encoding::OnOff,
            "pdt" | "pulse" | "pulse-aggregated" => Encoding::PulseAggregated,
            "pddt" | "pulse-disaggregated" => Encoding::PulseDisaggregated,
            "sdt" | "step" | "step-aggregated" => Encoding::StepAggregated,
            "sddt" | "step-disaggregated" => Encoding::StepDisaggregated,
            "oopdt" | "onoff-pulse" | "on-off-pulse" | "onoff-pulse-aggregated"
            | "on-off-pulse-aggregated" => Encoding::OnOffPulseAggregated,
            "oopddt" | "onoff-pulse-disaggregated" | "on-off-pulse-disaggregated" => {
                Encoding::OnOffPulseDisaggregated
            }
            _ => return Err(UnknownEncoding(value.to_string())),
        };

        Ok(encoding)
    }
}
