use log::{debug, trace};
use serde::Serialize;
use thiserror::Error;

use crate::dag::PrecedenceGraph;
use crate::error::Result;
use crate::instance::Instance;
use crate::sources_load::ResourceProfile;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleViolation {
    #[error("schedule covers {found} activities, the instance has {expected}")]
    Shape { expected: usize, found: usize },
    #[error("activity {activity} runs in unknown mode {mode}")]
    UnknownMode { activity: usize, mode: usize },
    #[error("activity {activity} finishes at {finish}, after the horizon {horizon}")]
    Horizon {
        activity: usize,
        finish: u32,
        horizon: u32,
    },
    #[error("activity {successor} starts before its predecessor {predecessor} completes")]
    Precedence { predecessor: usize, successor: usize },
    #[error("linked activities {first} and {second} run in different modes")]
    LinkedModes { first: usize, second: usize },
    #[error("resource {resource} is overloaded by {excess} in slot {slot}")]
    Capacity {
        resource: usize,
        slot: usize,
        excess: u32,
    },
}

/// Start time and mode of every activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    starts: Vec<u32>,
    modes: Vec<usize>,
}

impl Schedule {
    pub fn new(starts: Vec<u32>, modes: Vec<usize>) -> Self {
        Self { starts, modes }
    }

    pub fn start(&self, activity: usize) -> u32 {
        self.starts[activity]
    }

    pub fn mode(&self, activity: usize) -> usize {
        self.modes[activity]
    }

    pub fn starts(&self) -> &[u32] {
        &self.starts
    }

    pub fn modes(&self) -> &[usize] {
        &self.modes
    }

    pub fn finish(&self, instance: &Instance, activity: usize) -> u32 {
        self.starts[activity] + instance.duration(activity, self.modes[activity])
    }

    /// Start of the sink activity
    pub fn makespan(&self, instance: &Instance) -> u32 {
        self.starts[instance.sink()]
    }

    /// Same schedule on a grid `factor` times finer
    pub fn rescale(&self, factor: u32) -> Schedule {
        Schedule {
            starts: self.starts.iter().map(|start| start * factor).collect(),
            modes: self.modes.clone(),
        }
    }

    pub fn verify(&self, instance: &Instance) -> std::result::Result<(), ScheduleViolation> {
        let n = instance.activities();
        if self.starts.len() != n || self.modes.len() != n {
            return Err(ScheduleViolation::Shape {
                expected: n,
                found: self.starts.len().min(self.modes.len()),
            });
        }

        for activity in 0..n {
            let mode = self.modes[activity];
            if mode >= instance.modes() {
                return Err(ScheduleViolation::UnknownMode { activity, mode });
            }

            let finish = self.finish(instance, activity);
            if finish > instance.horizon() {
                return Err(ScheduleViolation::Horizon {
                    activity,
                    finish,
                    horizon: instance.horizon(),
                });
            }
        }

        for &(predecessor, successor) in instance.precedences() {
            if self.finish(instance, predecessor) > self.starts[successor] {
                return Err(ScheduleViolation::Precedence {
                    predecessor,
                    successor,
                });
            }
        }

        for &(first, second) in instance.linked() {
            if self.modes[first] != self.modes[second] {
                return Err(ScheduleViolation::LinkedModes { first, second });
            }
        }

        let mut profile = ResourceProfile::new(instance.capacities(), instance.horizon() as usize);
        for activity in 0..n {
            profile.add_activity(
                self.starts[activity] as usize,
                self.finish(instance, activity) as usize,
                &self.requirements(instance, activity),
            );
        }

        match profile.first_overload() {
            Some((resource, slot, remaining)) => Err(ScheduleViolation::Capacity {
                resource,
                slot,
                excess: remaining.unsigned_abs() as u32,
            }),
            None => Ok(()),
        }
    }

    fn requirements(&self, instance: &Instance, activity: usize) -> Vec<u32> {
        (0..instance.resources())
            .map(|k| instance.requirement(activity, self.modes[activity], k))
            .collect()
    }
}

/// Serial schedule generation: activities are taken in topological order and
/// started as early as precedences and the remaining capacity allow.
///
/// Returns `None` when some activity does not fit before the horizon.
pub fn serial_schedule(instance: &Instance, modes: Vec<usize>) -> Result<Option<Schedule>> {
    let graph = PrecedenceGraph::new(instance)?;

    let mut starts = vec![0_u32; instance.activities()];
    let mut profile = ResourceProfile::new(instance.capacities(), instance.horizon() as usize);

    for activity in graph.topological_order() {
        let mode = modes[activity];
        let duration = instance.duration(activity, mode);

        let earliest_precedence_start_time = instance
            .predecessors(activity)
            .map(|predecessor| starts[predecessor] + instance.duration(predecessor, modes[predecessor]))
            .max()
            .unwrap_or(0);

        let requirements: Vec<u32> = (0..instance.resources())
            .map(|k| instance.requirement(activity, mode, k))
            .collect();

        let Some(start) = profile.get_earliest_start_time(
            &requirements,
            earliest_precedence_start_time as usize,
            duration as usize,
        ) else {
            debug!("activity {activity} does not fit before the horizon");
            return Ok(None);
        };

        trace!("activity {activity} in mode {mode} starts at {start}");
        profile.add_activity(start, start + duration as usize, &requirements);
        starts[activity] = start as u32;
    }

    Ok(Some(Schedule::new(starts, modes)))
}

/// Serial schedule with every activity in its fastest mode, or in the first
/// mode whenever linked activities are involved.
pub fn fastest_serial_schedule(instance: &Instance) -> Result<Option<Schedule>> {
    let modes = if instance.linked().is_empty() {
        (0..instance.activities())
            .map(|activity| {
                (0..instance.modes())
                    .min_by_key(|&mode| instance.duration(activity, mode))
                    .unwrap_or(0)
            })
            .collect()
    } else {
        vec![0; instance.activities()]
    };

    serial_schedule(instance, modes)
}

#[cfg(test)]
mod tests {
    use crate::testing::{chain_instance, linked_instance, random_instance, unlinked_instance};

    use super::{fastest_serial_schedule, serial_schedule, Schedule, ScheduleViolation};

    #[test]
    fn serial_schedule_delays_competing_activity() {
        let instance = linked_instance();

        let schedule = serial_schedule(&instance, vec![0; 4]).unwrap().unwrap();
        assert_eq!(schedule.makespan(&instance), 4);
        assert!(schedule.start(1) == 2 || schedule.start(2) == 2);
        assert_eq!(schedule.verify(&instance), Ok(()));
    }

    #[test]
    fn fastest_modes_are_chosen_without_linking() {
        let instance = unlinked_instance();

        let schedule = fastest_serial_schedule(&instance).unwrap().unwrap();
        assert_eq!(schedule.modes(), &[0, 1, 0, 0]);
        assert_eq!(schedule.makespan(&instance), 3);
        assert_eq!(schedule.verify(&instance), Ok(()));
    }

    #[test]
    fn serial_schedule_reports_horizon_overflow() {
        let instance = crate::testing::build(
            3,
            &[1],
            &[(0, 1), (0, 2), (1, 3), (2, 3)],
            &[&[0], &[2], &[2], &[0]],
            &[],
            &[&[&[0]], &[&[1]], &[&[1]], &[&[0]]],
        );

        assert_eq!(serial_schedule(&instance, vec![0; 4]).unwrap(), None);
    }

    #[test]
    fn overload_is_detected() {
        let instance = linked_instance();

        let schedule = Schedule::new(vec![0, 0, 0, 2], vec![0; 4]);
        assert_eq!(
            schedule.verify(&instance),
            Err(ScheduleViolation::Capacity {
                resource: 0,
                slot: 0,
                excess: 1
            })
        );
    }

    #[test]
    fn violations_are_detected() {
        let instance = linked_instance();

        let early_sink = Schedule::new(vec![0, 0, 2, 3], vec![0; 4]);
        assert_eq!(
            early_sink.verify(&instance),
            Err(ScheduleViolation::Precedence {
                predecessor: 2,
                successor: 3
            })
        );

        let unlinked_modes = Schedule::new(vec![0, 0, 2, 5], vec![0, 0, 1, 0]);
        assert_eq!(
            unlinked_modes.verify(&instance),
            Err(ScheduleViolation::LinkedModes {
                first: 1,
                second: 2
            })
        );

        let late = Schedule::new(vec![0, 0, 5, 7], vec![0, 0, 0, 0]);
        assert_eq!(
            late.verify(&instance),
            Err(ScheduleViolation::Horizon {
                activity: 2,
                finish: 7,
                horizon: 6
            })
        );

        let unknown_mode = Schedule::new(vec![0, 0, 2, 4], vec![0, 0, 0, 2]);
        assert_eq!(
            unknown_mode.verify(&instance),
            Err(ScheduleViolation::UnknownMode {
                activity: 3,
                mode: 2
            })
        );

        let short = Schedule::new(vec![0, 0], vec![0, 0]);
        assert!(matches!(
            short.verify(&instance),
            Err(ScheduleViolation::Shape { expected: 4, .. })
        ));
    }

    #[test]
    fn rescale_multiplies_starts() {
        let instance = chain_instance();
        let schedule = Schedule::new(vec![0, 0, 1], vec![0; 3]);

        let rescaled = schedule.rescale(3);
        assert_eq!(rescaled.starts(), &[0, 0, 3]);
        assert_eq!(rescaled.verify(&instance), Ok(()));
    }

    #[test]
    fn random_serial_schedules_verify() {
        for seed in 0..30 {
            let instance = random_instance(seed, 8, 2, 2);

            let schedule = fastest_serial_schedule(&instance).unwrap().unwrap();
            assert_eq!(schedule.verify(&instance), Ok(()), "seed {seed}");
        }
    }
}
