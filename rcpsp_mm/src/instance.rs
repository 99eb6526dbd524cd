use hashbrown::HashSet;
use instance_parser::{parse_instance, structs::InstanceFile};
use log::trace;

use crate::error::{RcpspError, Result};

/// A validated multi-mode project.
///
/// Activity `source()` is the dummy start and `sink()` the dummy end of the
/// project, both without duration or resource use in every mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    activities: usize,
    horizon: u32,
    modes: usize,
    capacities: Vec<u32>,
    precedences: Vec<(usize, usize)>,
    durations: Vec<Vec<u32>>,
    linked: Vec<(usize, usize)>,
    requirements: Vec<Vec<Vec<u32>>>,
    source: usize,
    sink: usize,
}

impl Instance {
    pub fn parse(content: &str) -> Result<Self> {
        Instance::try_from(parse_instance(content)?)
    }

    pub fn activities(&self) -> usize {
        self.activities
    }

    pub fn horizon(&self) -> u32 {
        self.horizon
    }

    pub fn modes(&self) -> usize {
        self.modes
    }

    pub fn resources(&self) -> usize {
        self.capacities.len()
    }

    pub fn capacity(&self, resource: usize) -> u32 {
        self.capacities[resource]
    }

    pub fn capacities(&self) -> &[u32] {
        &self.capacities
    }

    pub fn precedences(&self) -> &[(usize, usize)] {
        &self.precedences
    }

    pub fn linked(&self) -> &[(usize, usize)] {
        &self.linked
    }

    pub fn source(&self) -> usize {
        self.source
    }

    pub fn sink(&self) -> usize {
        self.sink
    }

    pub fn is_dummy(&self, activity: usize) -> bool {
        activity == self.source || activity == self.sink
    }

    pub fn duration(&self, activity: usize, mode: usize) -> u32 {
        self.durations[activity][mode]
    }

    pub fn durations(&self, activity: usize) -> &[u32] {
        &self.durations[activity]
    }

    /// Fastest mode of an activity
    pub fn min_duration(&self, activity: usize) -> u32 {
        self.durations[activity].iter().copied().min().unwrap_or(0)
    }

    /// Slowest mode of an activity
    pub fn max_duration(&self, activity: usize) -> u32 {
        self.durations[activity].iter().copied().max().unwrap_or(0)
    }

    pub fn requirement(&self, activity: usize, mode: usize, resource: usize) -> u32 {
        self.requirements[activity][mode][resource]
    }

    /// Largest demand of an activity on a resource over all of its modes
    pub fn max_requirement(&self, activity: usize, resource: usize) -> u32 {
        self.requirements[activity]
            .iter()
            .map(|mode| mode[resource])
            .max()
            .unwrap_or(0)
    }

    pub fn predecessors(&self, activity: usize) -> impl Iterator<Item = usize> + '_ {
        self.precedences
            .iter()
            .filter(move |(_, j)| *j == activity)
            .map(|(i, _)| *i)
    }

    pub fn successors(&self, activity: usize) -> impl Iterator<Item = usize> + '_ {
        self.precedences
            .iter()
            .filter(move |(i, _)| *i == activity)
            .map(|(_, j)| *j)
    }

    /// Ordered pairs of distinct activities without a precedence relation in
    /// either direction. Both orientations of every such pair are returned.
    pub fn non_ordered_pairs(&self) -> Vec<(usize, usize)> {
        let related: HashSet<(usize, usize)> = self
            .precedences
            .iter()
            .flat_map(|&(i, j)| [(i, j), (j, i)])
            .collect();

        (0..self.activities)
            .flat_map(|i| (0..self.activities).map(move |j| (i, j)))
            .filter(|&(i, j)| i != j && !related.contains(&(i, j)))
            .collect()
    }

    /// Copy of the instance with other time data, used by the time normalizer.
    pub(crate) fn with_time_data(&self, durations: Vec<Vec<u32>>, horizon: u32) -> Instance {
        Instance {
            durations,
            horizon,
            ..self.clone()
        }
    }
}

impl TryFrom<InstanceFile> for Instance {
    type Error = RcpspError;

    fn try_from(file: InstanceFile) -> Result<Self> {
        let activities = to_index("n", file.n)?;
        if activities < 2 {
            return Err(RcpspError::invalid(
                "an instance needs at least a source and a sink activity",
            ));
        }

        let horizon = to_amount("horizon T", file.horizon)?;

        let modes = to_index("M", file.modes)?;
        if modes == 0 {
            return Err(RcpspError::invalid("at least one mode is required"));
        }

        let capacities = file
            .capacities
            .iter()
            .enumerate()
            .map(|(k, &capacity)| to_amount(&format!("R[{k}]"), capacity))
            .collect::<Result<Vec<u32>>>()?;

        if file.durations.len() != activities {
            return Err(RcpspError::invalid(format!(
                "p has {} rows but there are {activities} activities",
                file.durations.len()
            )));
        }
        let mut durations = Vec::with_capacity(activities);
        for (i, row) in file.durations.iter().enumerate() {
            if row.len() != modes {
                return Err(RcpspError::invalid(format!(
                    "p[{i}] has {} modes, expected {modes}",
                    row.len()
                )));
            }
            durations.push(
                row.iter()
                    .enumerate()
                    .map(|(m, &duration)| to_amount(&format!("p[{i}][{m}]"), duration))
                    .collect::<Result<Vec<u32>>>()?,
            );
        }

        if file.requirements.len() != activities {
            return Err(RcpspError::invalid(format!(
                "r has {} rows but there are {activities} activities",
                file.requirements.len()
            )));
        }
        let mut requirements = Vec::with_capacity(activities);
        for (i, activity_modes) in file.requirements.iter().enumerate() {
            if activity_modes.len() != modes {
                return Err(RcpspError::invalid(format!(
                    "r[{i}] has {} modes, expected {modes}",
                    activity_modes.len()
                )));
            }

            let mut per_mode = Vec::with_capacity(modes);
            for (m, demands) in activity_modes.iter().enumerate() {
                if demands.len() != capacities.len() {
                    return Err(RcpspError::invalid(format!(
                        "r[{i}][{m}] has {} entries but there are {} resources",
                        demands.len(),
                        capacities.len()
                    )));
                }
                per_mode.push(
                    demands
                        .iter()
                        .enumerate()
                        .map(|(k, &demand)| to_amount(&format!("r[{i}][{m}][{k}]"), demand))
                        .collect::<Result<Vec<u32>>>()?,
                );
            }
            requirements.push(per_mode);
        }

        let mut seen = HashSet::new();
        let mut precedences = Vec::with_capacity(file.precedences.len());
        for pair in &file.precedences {
            let (i, j) = to_pair("E", pair, activities)?;
            if i == j {
                return Err(RcpspError::invalid(format!(
                    "activity {i} cannot precede itself"
                )));
            }
            if seen.insert((i, j)) {
                precedences.push((i, j));
            }
        }

        let linked = file
            .linked
            .iter()
            .map(|pair| to_pair("L", pair, activities))
            .collect::<Result<Vec<(usize, usize)>>>()?;

        let instance = Instance {
            activities,
            horizon,
            modes,
            capacities,
            precedences,
            durations,
            linked,
            requirements,
            source: 0,
            sink: activities - 1,
        };

        for dummy in [instance.source, instance.sink] {
            if instance.max_duration(dummy) > 0 {
                return Err(RcpspError::invalid(format!(
                    "dummy activity {dummy} must have zero duration in every mode"
                )));
            }
            if (0..instance.resources()).any(|k| instance.max_requirement(dummy, k) > 0) {
                return Err(RcpspError::invalid(format!(
                    "dummy activity {dummy} must not use any resource"
                )));
            }
        }

        for activity in 0..activities {
            if activity != instance.source && instance.predecessors(activity).next().is_none() {
                return Err(RcpspError::invalid(format!(
                    "activity {activity} has no predecessor, the project must be rooted at activity {}",
                    instance.source
                )));
            }
            if activity != instance.sink && instance.successors(activity).next().is_none() {
                return Err(RcpspError::invalid(format!(
                    "activity {activity} has no successor, the project must converge at activity {}",
                    instance.sink
                )));
            }
        }

        trace!("validated instance: {instance:?}");

        Ok(instance)
    }
}

impl From<&Instance> for InstanceFile {
    fn from(instance: &Instance) -> Self {
        let pair = |&(i, j): &(usize, usize)| [i as i64, j as i64];

        InstanceFile {
            n: instance.activities as i64,
            horizon: instance.horizon as i64,
            modes: instance.modes as i64,
            capacities: instance.capacities.iter().map(|&c| c as i64).collect(),
            precedences: instance.precedences.iter().map(pair).collect(),
            durations: instance
                .durations
                .iter()
                .map(|row| row.iter().map(|&d| d as i64).collect())
                .collect(),
            linked: instance.linked.iter().map(pair).collect(),
            requirements: instance
                .requirements
                .iter()
                .map(|modes| {
                    modes
                        .iter()
                        .map(|demands| demands.iter().map(|&d| d as i64).collect())
                        .collect()
                })
                .collect(),
        }
    }
}

fn to_amount(what: &str, value: i64) -> Result<u32> {
    if value < 0 {
        return Err(RcpspError::invalid(format!(
            "{what} must be non-negative, got {value}"
        )));
    }

    u32::try_from(value).map_err(|_| RcpspError::invalid(format!("{what} is too large: {value}")))
}

fn to_index(what: &str, value: i64) -> Result<usize> {
    to_amount(what, value).map(|value| value as usize)
}

fn to_pair(relation: &str, pair: &[i64; 2], activities: usize) -> Result<(usize, usize)> {
    let [i, j] = *pair;
    let in_range = |value: i64| value >= 0 && (value as usize) < activities;

    if !in_range(i) || !in_range(j) {
        return Err(RcpspError::invalid(format!(
            "{relation} references unknown activity in ({i}, {j}), there are {activities} activities"
        )));
    }

    Ok((i as usize, j as usize))
}
