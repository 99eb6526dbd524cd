//! Shared fixtures for unit tests.

use instance_parser::{parse_instance, structs::InstanceFile};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::instance::Instance;

pub static CHAIN_FILE: &str = include_str!("../../instances/chain.json");
pub static LINKED_FILE: &str = include_str!("../../instances/linked.json");

/// source -> 1 -> sink, one mode of length 3, horizon 6
pub fn chain_instance() -> Instance {
    Instance::parse(CHAIN_FILE).unwrap()
}

/// Two parallel activities competing for a resource of capacity 2, with
/// their modes linked.
pub fn linked_instance() -> Instance {
    Instance::parse(LINKED_FILE).unwrap()
}

/// `linked_instance` without the mode linking
pub fn unlinked_instance() -> Instance {
    let mut file = parse_instance(LINKED_FILE).unwrap();
    file.linked.clear();
    Instance::try_from(file).unwrap()
}

/// Multiply the horizon and all durations by `factor`
pub fn scaled(instance: &Instance, factor: u32) -> Instance {
    let mut file = InstanceFile::from(instance);
    file.horizon *= factor as i64;
    for row in file.durations.iter_mut() {
        for duration in row.iter_mut() {
            *duration *= factor as i64;
        }
    }
    Instance::try_from(file).unwrap()
}

pub fn build(
    horizon: u32,
    capacities: &[u32],
    precedences: &[(usize, usize)],
    durations: &[&[u32]],
    linked: &[(usize, usize)],
    requirements: &[&[&[u32]]],
) -> Instance {
    let pair = |&(i, j): &(usize, usize)| [i as i64, j as i64];

    let file = InstanceFile {
        n: durations.len() as i64,
        horizon: horizon as i64,
        modes: durations.first().map(|row| row.len()).unwrap_or(0) as i64,
        capacities: capacities.iter().map(|&c| c as i64).collect(),
        precedences: precedences.iter().map(pair).collect(),
        durations: durations
            .iter()
            .map(|row| row.iter().map(|&d| d as i64).collect())
            .collect(),
        linked: linked.iter().map(pair).collect(),
        requirements: requirements
            .iter()
            .map(|modes| {
                modes
                    .iter()
                    .map(|demands| demands.iter().map(|&d| d as i64).collect())
                    .collect()
            })
            .collect(),
    };

    Instance::try_from(file).unwrap()
}

/// One real activity that can run in zero time in its second mode
pub fn zero_duration_instance() -> Instance {
    build(
        4,
        &[1],
        &[(0, 1), (1, 2)],
        &[&[0, 0], &[2, 0], &[0, 0]],
        &[],
        &[&[&[0], &[0]], &[&[1], &[0]], &[&[0], &[0]]],
    )
}

/// Random acyclic project with `activities` activities in total.
///
/// Real activities are numbered in a shuffled order so that the numbering is
/// generally not topological. Capacities cover the largest single demand and
/// the horizon is the sum of the slowest durations, so a serial schedule
/// always fits.
pub fn random_instance(seed: u64, activities: usize, modes: usize, resources: usize) -> Instance {
    assert!(activities >= 3);

    let mut rng = StdRng::seed_from_u64(seed);
    let sink = activities - 1;

    let mut order: Vec<usize> = (1..sink).collect();
    order.shuffle(&mut rng);

    let mut precedences = Vec::new();
    for (a, &i) in order.iter().enumerate() {
        for &j in &order[a + 1..] {
            if rng.gen_bool(0.3) {
                precedences.push((i, j));
            }
        }
    }
    for &activity in &order {
        if !precedences.iter().any(|&(_, j)| j == activity) {
            precedences.push((0, activity));
        }
        if !precedences.iter().any(|&(i, _)| i == activity) {
            precedences.push((activity, sink));
        }
    }

    let durations: Vec<Vec<u32>> = (0..activities)
        .map(|i| {
            (0..modes)
                .map(|_| if i == 0 || i == sink { 0 } else { rng.gen_range(1..=4) })
                .collect()
        })
        .collect();

    let requirements: Vec<Vec<Vec<u32>>> = (0..activities)
        .map(|i| {
            (0..modes)
                .map(|_| {
                    (0..resources)
                        .map(|_| if i == 0 || i == sink { 0 } else { rng.gen_range(0..=3) })
                        .collect()
                })
                .collect()
        })
        .collect();

    let capacities: Vec<u32> = (0..resources)
        .map(|k| {
            requirements
                .iter()
                .flat_map(|modes| modes.iter().map(move |demands| demands[k]))
                .max()
                .unwrap_or(0)
                .max(1)
        })
        .collect();

    let horizon = durations
        .iter()
        .map(|row| row.iter().copied().max().unwrap_or(0))
        .sum();

    let durations: Vec<&[u32]> = durations.iter().map(|row| row.as_slice()).collect();
    let requirements: Vec<Vec<&[u32]>> = requirements
        .iter()
        .map(|modes| modes.iter().map(|demands| demands.as_slice()).collect())
        .collect();
    let requirements: Vec<&[&[u32]]> = requirements.iter().map(|modes| modes.as_slice()).collect();

    build(
        horizon,
        &capacities,
        &precedences,
        &durations,
        &[],
        &requirements,
    )
}
