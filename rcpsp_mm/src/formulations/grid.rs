use crate::dag::Bounds;
use crate::instance::Instance;
use crate::model::{AbstractModel, Assignment, LinearExpr, Sense, VarId};
use crate::schedule::Schedule;

use super::Precedence;

/// Binary variables indexed by activity, mode and instant `t ∈ 0..=T`.
///
/// Ids are contiguous starting at `offset`, instants vary fastest.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TimeGrid {
    offset: usize,
    activities: usize,
    modes: usize,
    instants: usize,
}

impl TimeGrid {
    pub fn new(instance: &Instance, offset: usize) -> Self {
        Self {
            offset,
            activities: instance.activities(),
            modes: instance.modes(),
            instants: instance.horizon() as usize + 1,
        }
    }

    pub fn at(&self, activity: usize, mode: usize, t: usize) -> VarId {
        VarId(self.offset + (activity * self.modes + mode) * self.instants + t)
    }

    pub fn len(&self) -> usize {
        self.activities * self.modes * self.instants
    }

    pub fn end(&self) -> usize {
        self.offset + self.len()
    }

    pub fn horizon(&self) -> usize {
        self.instants - 1
    }

    pub fn declare(&self, model: &mut AbstractModel, label: &str) {
        for i in 0..self.activities {
            for m in 0..self.modes {
                for t in 0..self.instants {
                    let id = model.add_binary(format!("{label}[{i},{m},{t}]"));
                    debug_assert_eq!(id, self.at(i, m, t));
                }
            }
        }
    }

    /// Earliest instant with a set variable of an activity, and its mode
    pub fn first_set(&self, activity: usize, assignment: &Assignment) -> Option<(usize, usize)> {
        (0..self.instants).find_map(|t| {
            (0..self.modes)
                .find(|&m| assignment.is_set(self.at(activity, m, t)))
                .map(|m| (m, t))
        })
    }

    /// Sum of all variables of an activity in one mode
    pub fn mass(&self, activity: usize, mode: usize, weight: f64) -> LinearExpr {
        (0..self.instants)
            .map(|t| (self.at(activity, mode, t), weight))
            .collect()
    }
}

/// Indicators before the earliest start of every activity are fixed to zero
pub(crate) fn fix_before_earliest_start(
    model: &mut AbstractModel,
    grid: &TimeGrid,
    instance: &Instance,
    bounds: &Bounds,
) {
    for i in 0..instance.activities() {
        let earliest = (bounds.earliest_start(i) as usize).min(grid.horizon() + 1);
        for m in 0..instance.modes() {
            for t in 0..earliest {
                model.add_constraint(
                    "earliest_start",
                    format!("earliest_start[{i},{m},{t}]"),
                    grid.at(i, m, t).into(),
                    Sense::Eq,
                    0.0,
                );
            }
        }
    }
}

/// Starts that would end after the horizon are forbidden
pub(crate) fn forbid_late_starts(model: &mut AbstractModel, pulses: &TimeGrid, instance: &Instance) {
    let horizon = pulses.horizon();
    for i in 0..instance.activities() {
        for m in 0..instance.modes() {
            let duration = instance.duration(i, m) as usize;
            let first_late = horizon.saturating_sub(duration) + usize::from(duration <= horizon);
            for t in first_late..=horizon {
                model.add_constraint(
                    "horizon",
                    format!("horizon[{i},{m},{t}]"),
                    pulses.at(i, m, t).into(),
                    Sense::Eq,
                    0.0,
                );
            }
        }
    }
}

/// Every activity starts exactly once over all modes and instants
pub(crate) fn schedule_pulses_once(model: &mut AbstractModel, pulses: &TimeGrid, instance: &Instance) {
    for i in 0..instance.activities() {
        let mut expr = LinearExpr::new();
        for m in 0..instance.modes() {
            expr += pulses.mass(i, m, 1.0);
        }
        model.add_constraint("schedule", format!("schedule[{i}]"), expr, Sense::Eq, 1.0);
    }
}

/// Precedence between start pulses of predecessor and successor
pub(crate) fn pulse_precedence(
    model: &mut AbstractModel,
    pulses: &TimeGrid,
    instance: &Instance,
    precedence: Precedence,
) {
    let horizon = pulses.horizon();

    for &(i, j) in instance.precedences() {
        match precedence {
            Precedence::Aggregated => {
                let mut expr = LinearExpr::new();
                for m in 0..instance.modes() {
                    let duration = instance.duration(i, m) as usize;
                    for t in 0..=horizon {
                        expr.add_term(pulses.at(i, m, t), (t + duration) as f64);
                        expr.add_term(pulses.at(j, m, t), -(t as f64));
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
                        if let Some(last) = t.checked_sub(duration) {
                            for tau in 0..=last {
                                expr.add_term(pulses.at(i, m, tau), 1.0);
                            }
                        }
                        for tau in 0..=t {
                            expr.add_term(pulses.at(j, m, tau), -1.0);
                        }
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
}

/// Linked activities put their start in the same mode
pub(crate) fn link_pulse_modes(model: &mut AbstractModel, pulses: &TimeGrid, instance: &Instance) {
    for &(i, j) in instance.linked() {
        for m in 0..instance.modes() {
            model.add_constraint(
                "linked",
                format!("linked[{i},{j},{m}]"),
                pulses.mass(i, m, 1.0) - pulses.mass(j, m, 1.0),
                Sense::Eq,
                0.0,
            );
        }
    }
}

/// Start instant of the sink
pub(crate) fn sink_start(pulses: &TimeGrid, instance: &Instance) -> LinearExpr {
    let sink = instance.sink();
    (0..instance.modes())
        .flat_map(|m| (0..=pulses.horizon()).map(move |t| (pulses.at(sink, m, t), t as f64)))
        .collect()
}

/// Pulses of the last `duration` instants up to `t`, i.e. whether the activity
/// occupies slot `t` in that mode
pub(crate) fn occupancy(
    pulses: &TimeGrid,
    activity: usize,
    mode: usize,
    duration: usize,
    t: usize,
) -> LinearExpr {
    ((t + 1).saturating_sub(duration)..=t)
        .map(|tau| (pulses.at(activity, mode, tau), 1.0))
        .collect()
}

/// Capacity of every resource in every slot `0..T`, with `usage` giving the
/// occupancy of an activity in a mode and slot
pub(crate) fn limit_resources<F>(model: &mut AbstractModel, instance: &Instance, usage: F)
where
    F: Fn(usize, usize, usize) -> LinearExpr,
{
    for t in 0..instance.horizon() as usize {
        for k in 0..instance.resources() {
            let mut expr = LinearExpr::new();
            for i in 0..instance.activities() {
                for m in 0..instance.modes() {
                    let requirement = instance.requirement(i, m, k);
                    if requirement > 0 {
                        expr += usage(i, m, t) * requirement as f64;
                    }
                }
            }

            if !expr.is_empty() {
                model.add_constraint(
                    "resource",
                    format!("resource[{t},{k}]"),
                    expr,
                    Sense::Le,
                    instance.capacity(k) as f64,
                );
            }
        }
    }
}

pub(crate) fn decode_pulses(
    pulses: &TimeGrid,
    instance: &Instance,
    assignment: &Assignment,
) -> Option<Schedule> {
    let mut starts = Vec::with_capacity(instance.activities());
    let mut modes = Vec::with_capacity(instance.activities());

    for i in 0..instance.activities() {
        let (mode, start) = pulses.first_set(i, assignment)?;
        starts.push(start as u32);
        modes.push(mode);
    }

    Some(Schedule::new(starts, modes))
}

pub(crate) fn encode_pulses(
    pulses: &TimeGrid,
    instance: &Instance,
    schedule: &Schedule,
    assignment: &mut Assignment,
) {
    for i in 0..instance.activities() {
        assignment.set(
            pulses.at(i, schedule.mode(i), schedule.start(i) as usize),
            1.0,
        );
    }
}
