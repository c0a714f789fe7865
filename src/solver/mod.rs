//! Solvers (spec.md §4.D).
//!
//! Grounded on
//! `examples/MVanderloo-constraint-solver/src/solver/{mod,backtracking,
//! forward_checking,heuristics}.rs` for the overall split between a
//! shared heuristics module and one file per search strategy. The
//! teacher's `ForwardCheckingSolver` cloned the entire domain map on
//! every branch (`saved_domains = domains.clone()`); every solver here
//! instead uses `Domain::push_state`/`pop_state`, which is the whole
//! reason `crate::domain` carries a checkpoint stack instead of the
//! teacher's clone-based design.

pub mod backtracking;
pub mod heuristics;
pub mod min_conflicts;
pub mod optimized;
#[cfg(feature = "parallel")]
pub mod parallel;
pub mod recursive;

pub use backtracking::IterativeBacktrackingSolver;
pub use min_conflicts::MinConflictsSolver;
pub use optimized::OptimizedBacktrackingSolver;
pub use recursive::RecursiveBacktrackingSolver;

use std::fmt;
use std::hash::Hash;

use crate::assignment::Assignment;
use crate::error::CspError;
use crate::numeric::Numeric;
use crate::problem::Problem;

/// The contract every solver implements (spec.md §4.D: "get_solution,
/// get_solutions, get_solution_iter").
///
/// `get_solution_iter` defaults to `CspError::NotImplementedForSolver` so
/// solvers that cannot support lazy iteration (recursive, min-conflicts)
/// don't each have to repeat the same error path.
pub trait Solver<V, T>
where
    V: Eq + Hash + Clone + fmt::Debug,
    T: Numeric + fmt::Debug,
{
    fn get_solution(&self, problem: &Problem<V, T>) -> Result<Option<Assignment<V, T>>, CspError>;

    fn get_solutions(&self, problem: &Problem<V, T>) -> Result<Vec<Assignment<V, T>>, CspError>;

    fn get_solution_iter<'a>(
        &self,
        _problem: &'a Problem<V, T>,
    ) -> Result<Box<dyn Iterator<Item = Assignment<V, T>> + 'a>, CspError> {
        Err(CspError::NotImplementedForSolver(
            "this solver does not support lazy solution iteration",
        ))
    }
}
