//! Recursive backtracking with forward checking.
//!
//! Grounded on `original_source/constraint/solvers.py`'s
//! `RecursiveBacktrackingSolver`, which recurses directly (no explicit
//! stack) and stops as soon as a caller that only wants one solution has
//! one — its `recursiveBacktracking(..., solutions, single)` takes the
//! same `single` flag this port keeps as a plain recursion parameter
//! rather than solver state, since it only ever changes between
//! `get_solution` and `get_solutions`.
//!
//! Unlike `IterativeBacktrackingSolver`, recursion depth is bounded by
//! the number of variables, not by caller demand, so there is no lazy
//! `get_solution_iter` — the default `Solver::get_solution_iter` error
//! applies.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::assignment::Assignment;
use crate::domain::Domain;
use crate::error::CspError;
use crate::numeric::Numeric;
use crate::problem::Problem;
use crate::solver::heuristics::{least_constraining_value, select_variable};
use crate::solver::Solver;

#[derive(Debug, Default, Clone, Copy)]
pub struct RecursiveBacktrackingSolver;

impl RecursiveBacktrackingSolver {
    pub fn new() -> Self {
        RecursiveBacktrackingSolver
    }
}

fn recurse<V, T>(
    problem: &Problem<V, T>,
    domains: &mut HashMap<V, Domain<T>>,
    assignment: &mut Assignment<V, T>,
    single: bool,
    solutions: &mut Vec<Assignment<V, T>>,
) -> bool
where
    V: Eq + Hash + Clone + fmt::Debug,
    T: Numeric + fmt::Debug,
{
    if assignment.is_complete(problem.num_variables()) {
        solutions.push(assignment.clone());
        return single;
    }
    let Some(variable) =
        select_variable(problem.variables(), domains, assignment, problem.constraints())
    else {
        return false;
    };
    let candidates = match domains.get(&variable) {
        Some(domain) => least_constraining_value(&variable, domain, assignment, problem.constraints()),
        None => return false,
    };

    for value in candidates {
        for domain in domains.values_mut() {
            domain.push_state();
        }
        assignment.assign(variable.clone(), value);

        let forward_ok = problem
            .constraints()
            .iter()
            .filter(|c| c.involves(&variable))
            .all(|c| c.forward_check(assignment, domains));
        let consistent = forward_ok && problem.is_consistent(assignment);

        let stop = if consistent {
            recurse(problem, domains, assignment, single, solutions)
        } else {
            false
        };

        for domain in domains.values_mut() {
            domain.pop_state();
        }
        assignment.unassign(&variable);

        if stop {
            return true;
        }
    }
    false
}

fn solve<V, T>(problem: &Problem<V, T>, single: bool) -> Vec<Assignment<V, T>>
where
    V: Eq + Hash + Clone + fmt::Debug,
    T: Numeric + fmt::Debug,
{
    let mut domains = problem.domains().clone();
    for constraint in problem.constraints() {
        if !constraint.preprocess(&mut domains) {
            return Vec::new();
        }
    }
    let mut assignment = Assignment::new();
    let mut solutions = Vec::new();
    recurse(problem, &mut domains, &mut assignment, single, &mut solutions);
    solutions
}

impl<V, T> Solver<V, T> for RecursiveBacktrackingSolver
where
    V: Eq + Hash + Clone + fmt::Debug,
    T: Numeric + fmt::Debug,
{
    fn get_solution(&self, problem: &Problem<V, T>) -> Result<Option<Assignment<V, T>>, CspError> {
        log::debug!("recursive backtracking: searching for a single solution");
        Ok(solve(problem, true).into_iter().next())
    }

    fn get_solutions(&self, problem: &Problem<V, T>) -> Result<Vec<Assignment<V, T>>, CspError> {
        log::debug!("recursive backtracking: enumerating all solutions");
        Ok(solve(problem, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{AllDifferentConstraint, Constraint};

    #[test]
    fn single_flag_stops_after_first_solution() {
        let mut p: Problem<String, i64> = Problem::new();
        p.add_variable("a".into(), Domain::new([1, 2]).unwrap()).unwrap();
        p.add_variable("b".into(), Domain::new([1, 2]).unwrap()).unwrap();
        p.add_constraint(Constraint::AllDifferent(AllDifferentConstraint::new(
            "ad",
            vec!["a".to_string(), "b".to_string()],
        )))
        .unwrap();
        let solver = RecursiveBacktrackingSolver::new();
        assert_eq!(solver.get_solution(&p).unwrap().map(|_| 1), Some(1));
        assert_eq!(solver.get_solutions(&p).unwrap().len(), 2);
    }
}
