use std::path::PathBuf;

use anyhow::Result;
use log::{info, warn};
use rcpsp_mm::dag::PrecedenceGraph;
use rcpsp_mm::schedule::fastest_serial_schedule;

use super::read_instance;

pub fn bounds(path: PathBuf) -> Result<()> {
    let instance = read_instance(&path)?;
    let graph = PrecedenceGraph::new(&instance)?;
    let bounds = graph.compute_bounds();

    println!("{:>8} {:>8} {:>8} {:>8}", "activity", "es", "ls", "slack");
    for activity in graph.topological_order() {
        println!(
            "{:>8} {:>8} {:>8} {:>8}",
            activity,
            bounds.earliest_start(activity),
            bounds.latest_start(activity),
            bounds.slack(activity)
        );
    }

    println!("lower bound: {}", graph.compute_lower_bound());
    println!("upper bound: {}", graph.compute_upper_bound());
    if !bounds.is_consistent() {
        warn!("some start windows are empty, the horizon is too short for the slowest modes");
    }

    match fastest_serial_schedule(&instance)? {
        Some(schedule) => {
            info!("serial schedule: {schedule:?}");
            println!("serial makespan: {}", schedule.makespan(&instance));
            println!("starts: {:?}", schedule.starts());
            println!("modes: {:?}", schedule.modes());
        }
        None => println!("serial schedule does not fit before the horizon"),
    }

    Ok(())
}
