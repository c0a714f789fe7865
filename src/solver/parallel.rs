//! Parallel solver — trait surface only.
//!
//! spec.md scopes the parallel solver as an external collaborator; this
//! crate defines the contract a caller's work-splitting code plugs into,
//! plus one illustrative split across the first variable's domain, using
//! `rayon` the way
//! `other_examples/66bad263_xgillard-ddo__ddo-examples-misp-main.rs.rs`
//! fans independent subproblems out over `rayon`'s global thread pool. A
//! real work-stealing parallel backtracking search (shared best-bound,
//! cooperative cancellation across workers) is out of scope here.

use std::fmt;
use std::hash::Hash;

use rayon::prelude::*;

use crate::assignment::Assignment;
use crate::domain::Domain;
use crate::error::CspError;
use crate::numeric::Numeric;
use crate::problem::Problem;
use crate::solver::backtracking::BacktrackIter;
use crate::solver::Solver;

/// The contract a parallel solver must satisfy: given a problem already
/// split into independent branches (typically by fixing one variable to
/// each of its candidate values), solve every branch concurrently and
/// return the first solution found, if any.
pub trait ParallelSolver<V, T>
where
    V: Eq + Hash + Clone + fmt::Debug + Send + Sync,
    T: Numeric + fmt::Debug + Send + Sync,
{
    fn get_solution(&self, problem: &Problem<V, T>) -> Result<Option<Assignment<V, T>>, CspError>;
}

/// Splits the search on the first declared variable's domain and solves
/// each resulting branch on its own `rayon` thread, sequentially from
/// there with `IterativeBacktrackingSolver`'s forward-checking search.
/// Intended as a starting point for a caller's own work-splitting
/// strategy, not a complete parallel search engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct SplitOnFirstVariableSolver;

impl<V, T> ParallelSolver<V, T> for SplitOnFirstVariableSolver
where
    V: Eq + Hash + Clone + fmt::Debug + Send + Sync,
    T: Numeric + fmt::Debug + Send + Sync,
{
    fn get_solution(&self, problem: &Problem<V, T>) -> Result<Option<Assignment<V, T>>, CspError> {
        // spec.md §4.D: "Fans out the first (largest-domain) variable's
        // values" — the variable with the most candidates gives every
        // worker the most work to do in parallel.
        let Some(split_variable) = problem
            .variables()
            .iter()
            .max_by_key(|v| problem.get_domain(v).map(Domain::len).unwrap_or(0))
            .cloned()
        else {
            return Ok(BacktrackIter::new(problem).next());
        };
        let Some(domain) = problem.get_domain(&split_variable) else {
            return Ok(None);
        };
        let candidates = domain.values().to_vec();

        log::debug!(
            "parallel solver: splitting on {:?} across {} branches",
            split_variable,
            candidates.len()
        );

        candidates
            .into_par_iter()
            .find_map_any(|value| solve_branch(problem, &split_variable, value))
            .map(Ok)
            .unwrap_or(Ok(None))
    }
}

fn solve_branch<V, T>(
    problem: &Problem<V, T>,
    variable: &V,
    value: T,
) -> Option<Assignment<V, T>>
where
    V: Eq + Hash + Clone + fmt::Debug,
    T: Numeric + fmt::Debug,
{
    let mut domains: std::collections::HashMap<V, Domain<T>> = problem.domains().clone();
    let branch_domain = Domain::new([value]).ok()?;
    domains.insert(variable.clone(), branch_domain);

    let mut branch = Problem::new();
    for (var, domain) in &domains {
        branch.add_variable(var.clone(), domain.clone()).ok()?;
    }
    for constraint in problem.constraints() {
        branch.add_constraint(constraint.clone()).ok()?;
    }
    BacktrackIter::new(&branch).next()
}
