//! Iterative backtracking with forward checking.
//!
//! Grounded on
//! `examples/MVanderloo-constraint-solver/src/solver/backtracking.rs`
//! for the overall `find_solution`/`find_all_solutions` surface, with
//! the search itself rewritten as an explicit stack-based state machine
//! (no recursion, no generator) so `get_solution_iter` can hand the
//! caller a real `Iterator` that resumes exactly where the last
//! `.next()` call left off — "the caller simply stops consuming" (§5)
//! is only true if stopping doesn't require unwinding a recursive call
//! stack.

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

enum StepResult {
    Descended,
    FrameExhausted,
}

struct Frame<V, T> {
    variable: V,
    candidates: Vec<T>,
    cursor: usize,
    has_committed: bool,
}

/// Lazily enumerates every solution to `problem` depth-first, pruning
/// with forward checking after each assignment.
pub struct BacktrackIter<'a, V, T> {
    problem: &'a Problem<V, T>,
    domains: HashMap<V, Domain<T>>,
    assignment: Assignment<V, T>,
    stack: Vec<Frame<V, T>>,
    dead: bool,
    yielded: bool,
    exhausted: bool,
}

impl<'a, V, T> BacktrackIter<'a, V, T>
where
    V: Eq + Hash + Clone + fmt::Debug,
    T: Numeric + fmt::Debug,
{
    pub fn new(problem: &'a Problem<V, T>) -> Self {
        let mut domains = problem.domains().clone();
        let mut dead = false;
        for constraint in problem.constraints() {
            if !constraint.preprocess(&mut domains) {
                dead = true;
                break;
            }
        }
        BacktrackIter {
            problem,
            domains,
            assignment: Assignment::new(),
            stack: Vec::new(),
            dead,
            yielded: false,
            exhausted: false,
        }
    }

    fn retry_top_frame(&mut self, idx: usize) -> StepResult {
        let variable = self.stack[idx].variable.clone();
        let mut cursor = self.stack[idx].cursor;
        let candidates = self.stack[idx].candidates.clone();
        let was_committed = self.stack[idx].has_committed;

        if was_committed {
            for domain in self.domains.values_mut() {
                domain.pop_state();
            }
            self.assignment.unassign(&variable);
            self.stack[idx].has_committed = false;
        }

        while cursor < candidates.len() {
            let value = candidates[cursor].clone();
            cursor += 1;
            for domain in self.domains.values_mut() {
                domain.push_state();
            }
            self.assignment.assign(variable.clone(), value);

            let forward_ok = self
                .problem
                .constraints()
                .iter()
                .filter(|c| c.involves(&variable))
                .all(|c| c.forward_check(&self.assignment, &mut self.domains));
            let consistent = forward_ok && self.problem.is_consistent(&self.assignment);

            if consistent {
                self.stack[idx].cursor = cursor;
                self.stack[idx].has_committed = true;
                return StepResult::Descended;
            }
            for domain in self.domains.values_mut() {
                domain.pop_state();
            }
            self.assignment.unassign(&variable);
        }
        self.stack[idx].cursor = cursor;
        StepResult::FrameExhausted
    }

    fn backtrack_once(&mut self) -> bool {
        loop {
            if self.stack.is_empty() {
                return false;
            }
            let idx = self.stack.len() - 1;
            match self.retry_top_frame(idx) {
                StepResult::Descended => return true,
                StepResult::FrameExhausted => {
                    self.stack.pop();
                }
            }
        }
    }

    fn advance_to_next_solution(&mut self) -> bool {
        let total = self.problem.num_variables();
        loop {
            if self.assignment.is_complete(total) {
                return true;
            }
            if self.stack.len() == self.assignment.size() {
                match select_variable(
                    self.problem.variables(),
                    &self.domains,
                    &self.assignment,
                    self.problem.constraints(),
                ) {
                    Some(variable) => {
                        let candidates = match self.domains.get(&variable) {
                            Some(domain) => {
                                least_constraining_value(&variable, domain, &self.assignment, self.problem.constraints())
                            }
                            None => Vec::new(),
                        };
                        self.stack.push(Frame {
                            variable,
                            candidates,
                            cursor: 0,
                            has_committed: false,
                        });
                    }
                    None => return false,
                }
            }
            let idx = self.stack.len() - 1;
            match self.retry_top_frame(idx) {
                StepResult::Descended => continue,
                StepResult::FrameExhausted => {
                    self.stack.pop();
                    if !self.backtrack_once() {
                        return false;
                    }
                }
            }
        }
    }
}

impl<'a, V, T> Iterator for BacktrackIter<'a, V, T>
where
    V: Eq + Hash + Clone + fmt::Debug,
    T: Numeric + fmt::Debug,
{
    type Item = Assignment<V, T>;

    fn next(&mut self) -> Option<Assignment<V, T>> {
        if self.exhausted || self.dead {
            return None;
        }
        if self.yielded {
            self.yielded = false;
            if !self.backtrack_once() {
                self.exhausted = true;
                return None;
            }
        }
        if self.advance_to_next_solution() {
            self.yielded = true;
            Some(self.assignment.clone())
        } else {
            self.exhausted = true;
            None
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IterativeBacktrackingSolver;

impl IterativeBacktrackingSolver {
    pub fn new() -> Self {
        IterativeBacktrackingSolver
    }
}

impl<V, T> Solver<V, T> for IterativeBacktrackingSolver
where
    V: Eq + Hash + Clone + fmt::Debug,
    T: Numeric + fmt::Debug,
{
    fn get_solution(&self, problem: &Problem<V, T>) -> Result<Option<Assignment<V, T>>, CspError> {
        log::debug!("backtracking: searching for a single solution");
        Ok(BacktrackIter::new(problem).next())
    }

    fn get_solutions(&self, problem: &Problem<V, T>) -> Result<Vec<Assignment<V, T>>, CspError> {
        log::debug!("backtracking: enumerating all solutions");
        Ok(BacktrackIter::new(problem).collect())
    }

    fn get_solution_iter<'a>(
        &self,
        problem: &'a Problem<V, T>,
    ) -> Result<Box<dyn Iterator<Item = Assignment<V, T>> + 'a>, CspError> {
        Ok(Box::new(BacktrackIter::new(problem)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{AllDifferentConstraint, Constraint};

    fn two_var_all_different_problem() -> Problem<String, i64> {
        let mut p = Problem::new();
        p.add_variable("a".into(), Domain::new([1, 2]).unwrap()).unwrap();
        p.add_variable("b".into(), Domain::new([1, 2]).unwrap()).unwrap();
        p.add_constraint(Constraint::AllDifferent(AllDifferentConstraint::new(
            "ad",
            vec!["a".to_string(), "b".to_string()],
        )))
        .unwrap();
        p
    }

    #[test]
    fn finds_a_single_solution() {
        let problem = two_var_all_different_problem();
        let solver = IterativeBacktrackingSolver::new();
        let solution = solver.get_solution(&problem).unwrap().unwrap();
        assert_ne!(solution.get(&"a".to_string()), solution.get(&"b".to_string()));
    }

    #[test]
    fn enumerates_every_solution_exactly_once() {
        let problem = two_var_all_different_problem();
        let solver = IterativeBacktrackingSolver::new();
        let solutions = solver.get_solutions(&problem).unwrap();
        assert_eq!(solutions.len(), 2);
    }

    #[test]
    fn unsatisfiable_problem_yields_no_solutions() {
        let mut p: Problem<String, i64> = Problem::new();
        p.add_variable("a".into(), Domain::new([1]).unwrap()).unwrap();
        p.add_variable("b".into(), Domain::new([1]).unwrap()).unwrap();
        p.add_constraint(Constraint::AllDifferent(AllDifferentConstraint::new(
            "ad",
            vec!["a".to_string(), "b".to_string()],
        )))
        .unwrap();
        let solver = IterativeBacktrackingSolver::new();
        assert!(solver.get_solution(&p).unwrap().is_none());
    }

    #[test]
    fn lazy_iterator_can_be_stopped_early() {
        let mut p: Problem<String, i64> = Problem::new();
        p.add_variable("a".into(), Domain::new([1, 2, 3]).unwrap()).unwrap();
        let solver = IterativeBacktrackingSolver::new();
        let first = solver.get_solution_iter(&p).unwrap().next();
        assert!(first.is_some());
    }
}
