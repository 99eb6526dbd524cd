use instance_parser::InstanceParseError;
use thiserror::Error;

use crate::solver::SolverError;

pub type Result<T> = std::result::Result<T, RcpspError>;

#[derive(Debug, Error)]
pub enum RcpspError {
    #[error("invalid instance: {0}")]
    InvalidInstance(String),
    #[error("precedence relations contain a cycle through activity {activity}")]
    CyclicPrecedence { activity: usize },
    #[error("time value {value} is not divisible by {divisor}")]
    IrreducibleInstance { value: u32, divisor: u32 },
    #[error(
        "activity {activity} has zero duration in mode {mode}, which the {encoding} encoding cannot represent"
    )]
    UnsupportedZeroDurationActivity {
        activity: usize,
        mode: usize,
        encoding: &'static str,
    },
    #[error(transparent)]
    Parse(#[from] InstanceParseError),
    #[error(transparent)]
    Solver(#[from] SolverError),
}

impl RcpspError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        RcpspError::InvalidInstance(message.into())
    }
}
