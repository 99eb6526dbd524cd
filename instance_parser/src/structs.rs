use serde::{Deserialize, Serialize};

/// Raw instance as stored on disk.
///
/// Quantities are kept signed so that negative entries survive parsing and can
/// be reported by instance validation instead of failing as a type error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct InstanceFile {
    // number of activities, source is 0 and sink is n - 1
    pub n: i64,
    // planning horizon
    #[serde(rename = "T")]
    pub horizon: i64,
    // number of modes, shared by all activities
    #[serde(rename = "M")]
    pub modes: i64,
    // capacity of every renewable resource
    #[serde(rename = "R")]
    pub capacities: Vec<i64>,
    // precedence relations (i, j): i finishes before j starts
    #[serde(rename = "E")]
    pub precedences: Vec<[i64; 2]>,
    // p[i][m]
    #[serde(rename = "p")]
    pub durations: Vec<Vec<i64>>,
    // activities executed in the same mode
    #[serde(rename = "L", default)]
    pub linked: Vec<[i64; 2]>,
    // r[i][m][k]
    #[serde(rename = "r")]
    pub requirements: Vec<Vec<Vec<i64>>>,
}
