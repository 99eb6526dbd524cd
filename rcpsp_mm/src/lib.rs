pub mod assembler;
pub mod dag;
pub mod error;
pub mod formulations;
pub mod instance;
pub mod model;
pub mod normalize;
pub mod report;
pub mod schedule;
pub mod solver;

mod sources_load;

#[cfg(test)]
mod testing;

pub use assembler::{compare, prepare, solve, Prepared, SolveResult};
pub use dag::{estimate_bounds, Bounds};
pub use error::{RcpspError, Result};
pub use formulations::{Encoding, Formulation};
pub use instance::Instance;
pub use schedule::Schedule;
pub use solver::{MicroLpSolver, SolveOptions, SolverAdapter, SolverStatus};
