//! Generic finite-domain constraint satisfaction.
//!
//! Build a [`Problem`] out of variables and [`Constraint`]s, then ask a
//! solver from [`solver`] for one solution, every solution, or a lazy
//! stream of solutions. See `problem::Problem` for the entry point.

pub mod assignment;
pub mod constraint;
pub mod domain;
pub mod error;
pub mod numeric;
pub mod parser;
pub mod problem;
pub mod solver;
pub mod variable;

#[doc(hidden)]
pub mod demo;

pub use assignment::Assignment;
pub use constraint::Constraint;
pub use domain::Domain;
pub use error::{CspError, CspResult};
pub use numeric::Numeric;
pub use problem::{ParserMode, Problem, SolverKind};
pub use solver::Solver;
pub use variable::Variable;
