use std::fmt::{self, Write};

use serde::Serialize;

use crate::assembler::SolveResult;
use crate::error::{RcpspError, Result};
use crate::formulations::Encoding;
use crate::solver::SolverStatus;

/// Objective reported when a run ends without a solution
pub const NO_OBJECTIVE: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Failure {
    /// The encoding cannot represent the instance
    Unsupported,
    Error,
}

/// How a pipeline ended, as shown in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum RecordStatus {
    Solved(SolverStatus),
    Failed(Failure),
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Solved(status) => fmt::Display::fmt(status, f),
            RecordStatus::Failed(Failure::Unsupported) => f.pad("unsupported"),
            RecordStatus::Failed(Failure::Error) => f.pad("error"),
        }
    }
}

/// One row of the comparison report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRecord {
    pub model_name: String,
    pub status: RecordStatus,
    pub objective: f64,
    pub gap: Option<f64>,
    /// Seconds
    pub runtime: f64,
    pub variables: usize,
    pub constraints: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComparisonRecord {
    /// Row for a pipeline that stopped with an error, without counts
    pub fn failed(encoding: Encoding, error: &RcpspError) -> Self {
        let failure = match error {
            RcpspError::UnsupportedZeroDurationActivity { .. } => Failure::Unsupported,
            _ => Failure::Error,
        };

        Self {
            model_name: encoding.name().to_string(),
            status: RecordStatus::Failed(failure),
            objective: NO_OBJECTIVE,
            gap: None,
            runtime: 0.0,
            variables: 0,
            constraints: 0,
            message: Some(error.to_string()),
        }
    }

    pub fn from_result(encoding: Encoding, result: &Result<SolveResult>) -> Self {
        match result {
            Ok(result) => Self::from(result),
            Err(err) => Self::failed(encoding, err),
        }
    }
}

impl From<&SolveResult> for ComparisonRecord {
    fn from(result: &SolveResult) -> Self {
        Self {
            model_name: result.model_name.clone(),
            status: RecordStatus::Solved(result.status),
            objective: result.objective.unwrap_or(NO_OBJECTIVE),
            gap: result.gap,
            runtime: result.runtime.as_secs_f64(),
            variables: result.variables,
            constraints: result.constraints,
            message: None,
        }
    }
}

/// One row per compared encoding, failed pipelines included
pub fn records(results: &[(Encoding, Result<SolveResult>)]) -> Vec<ComparisonRecord> {
    results
        .iter()
        .map(|(encoding, result)| ComparisonRecord::from_result(*encoding, result))
        .collect()
}

fn format_gap(gap: Option<f64>) -> String {
    gap.map_or_else(|| "-".to_string(), |gap| format!("{gap:.3}"))
}

pub fn render_table(records: &[ComparisonRecord]) -> String {
    let mut table = String::new();

    let _ = writeln!(
        table,
        "| {:<10} | {:<11} | {:>10} | {:>10} | {:>10} | {:>10} | {:>10} |",
        "model_name", "status", "objective", "gap", "runtime", "# vars", "# cons"
    );
    let rule: Vec<String> = [10, 11, 10, 10, 10, 10, 10]
        .iter()
        .map(|width| "-".repeat(width + 2))
        .collect();
    let _ = writeln!(table, "|{}|", rule.join("|"));
    for record in records {
        let _ = writeln!(
            table,
            "| {:<10} | {:<11} | {:>10.3} | {:>10} | {:>8.3} s | {:>10} | {:>10} |",
            record.model_name,
            record.status,
            record.objective,
            format_gap(record.gap),
            record.runtime,
            record.variables,
            record.constraints,
        );
    }

    table
}

pub fn render_latex(records: &[ComparisonRecord]) -> String {
    let mut table = String::new();

    table.push_str("\\begin{table}[!ht]\n");
    table.push_str("\\centering\n");
    table.push_str("\\begin{tabular}{l l r r r r r}\n");
    table.push_str("\\hline\n");
    table.push_str("Model & Status & Objective & Gap & Runtime (s) & \\#Vars & \\#Cons \\\\\n");
    table.push_str("\\hline\n");
    for record in records {
        let _ = writeln!(
            table,
            "{} & {} & {:.3} & {} & {:.3} & {} & {} \\\\",
            record.model_name,
            record.status,
            record.objective,
            format_gap(record.gap),
            record.runtime,
            record.variables,
            record.constraints,
        );
    }
    table.push_str("\\hline\n");
    table.push_str("\\end{tabular}\n");
    table.push_str("\\caption{Solver statistics per encoding}\n");
    table.push_str("\\end{table}\n");

    table
}

pub fn render_json(records: &[ComparisonRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}
