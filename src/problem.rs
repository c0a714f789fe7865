//! The `Problem` façade (spec.md §4.C): the object users build up with
//! variables and constraints, then hand to a solver.
//!
//! Grounded on `examples/MVanderloo-constraint-solver/src/csp.rs`
//! (`Csp<T, D>`, `add_variable`/`add_constraint`/`is_consistent`), with
//! its `HashMap<Variable<T>, D>` storage and constraint list kept, but
//! `get_constraints_for_variable` promoted from a linear scan into a
//! `vconstraints`-style index built once at `compile()` time, matching
//! `original_source/constraint/problem.py`'s `_getArgs`.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::assignment::Assignment;
use crate::constraint::Constraint;
use crate::domain::Domain;
use crate::error::CspError;
use crate::numeric::Numeric;
use crate::solver::{
    IterativeBacktrackingSolver, MinConflictsSolver, OptimizedBacktrackingSolver,
    RecursiveBacktrackingSolver, Solver,
};

/// How a problem's parsed string constraints are stored: as an already
/// compiled closure (`Inline`, the common case), or as source text kept
/// around for later recompilation (`Serializable`) — needed only by the
/// parallel solver's isolated workers, which cannot ship a closure
/// across an isolation boundary. Replaces the original's single
/// "picklable" boolean with a named choice (SPEC_FULL.md §4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserMode {
    Inline,
    Serializable,
}

impl Default for ParserMode {
    fn default() -> Self {
        ParserMode::Inline
    }
}

/// Which search strategy `Problem::get_solution`/`get_solutions`/
/// `get_solution_iter` delegate to (spec.md §4.C: "set_solver/
/// get_solver"). Grounded on `original_source/constraint/problem.py`'s
/// `Problem(solver=...)`, which holds a solver *instance*; this crate
/// names the strategy instead of boxing a trait object, since every
/// solver here is a zero-sized or small `Copy` struct and naming avoids
/// a `Box<dyn Solver<V, T>>` with no real benefit over a match.
#[derive(Debug, Clone)]
pub enum SolverKind {
    Iterative,
    Optimized,
    Recursive,
    MinConflicts { steps: usize, seed: Option<u64> },
}

impl Default for SolverKind {
    fn default() -> Self {
        SolverKind::Iterative
    }
}

pub struct Problem<V, T> {
    domains: HashMap<V, Domain<T>>,
    order: Vec<V>,
    constraints: Vec<Constraint<V, T>>,
    vconstraints: HashMap<V, Vec<usize>>,
    parser_mode: ParserMode,
    pending_strings: Vec<String>,
    solver_kind: SolverKind,
}

impl<V, T> Default for Problem<V, T>
where
    V: Eq + Hash + Clone + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V, T> Problem<V, T>
where
    V: Eq + Hash + Clone + fmt::Debug,
{
    pub fn new() -> Self {
        Problem {
            domains: HashMap::new(),
            order: Vec::new(),
            constraints: Vec::new(),
            vconstraints: HashMap::new(),
            parser_mode: ParserMode::Inline,
            pending_strings: Vec::new(),
            solver_kind: SolverKind::default(),
        }
    }

    pub fn with_parser_mode(mut self, mode: ParserMode) -> Self {
        self.parser_mode = mode;
        self
    }

    pub fn parser_mode(&self) -> ParserMode {
        self.parser_mode
    }

    pub fn set_solver(&mut self, kind: SolverKind) {
        self.solver_kind = kind;
    }

    pub fn get_solver(&self) -> &SolverKind {
        &self.solver_kind
    }

    pub fn add_variable(&mut self, variable: V, domain: Domain<T>) -> Result<(), CspError> {
        if self.domains.contains_key(&variable) {
            return Err(CspError::DuplicateVariable(format!("{variable:?}")));
        }
        self.order.push(variable.clone());
        self.domains.insert(variable, domain);
        Ok(())
    }

    /// Thin loop over `add_variable`, matching the original's
    /// `addVariables(variables, domain)` convenience, where every
    /// variable in the batch shares one domain definition.
    pub fn add_variables(
        &mut self,
        variables: impl IntoIterator<Item = V>,
        domain: Domain<T>,
    ) -> Result<(), CspError>
    where
        T: Clone,
    {
        for variable in variables {
            self.add_variable(variable, domain.clone())?;
        }
        Ok(())
    }

    pub fn add_constraint(&mut self, constraint: Constraint<V, T>) -> Result<(), CspError>
    where
        T: Numeric + fmt::Debug,
    {
        for variable in constraint.variables() {
            if !self.domains.contains_key(&variable) {
                return Err(CspError::invalid_constraint(
                    constraint.name().to_string(),
                    variable,
                ));
            }
        }
        self.constraints.push(constraint);
        Ok(())
    }

    pub fn get_domain(&self, variable: &V) -> Option<&Domain<T>> {
        self.domains.get(variable)
    }

    pub fn variables(&self) -> &[V] {
        &self.order
    }

    pub fn constraints(&self) -> &[Constraint<V, T>] {
        &self.constraints
    }

    pub fn num_variables(&self) -> usize {
        self.order.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Drops all variables and constraints, keeping the configured
    /// solver-agnostic settings (`parser_mode`). Mirrors the original
    /// `Problem.reset`.
    pub fn reset(&mut self) {
        self.domains.clear();
        self.order.clear();
        self.constraints.clear();
        self.vconstraints.clear();
        self.pending_strings.clear();
    }

    pub fn get_constraints_for_variable(&self, variable: &V) -> Vec<&Constraint<V, T>> {
        match self.vconstraints.get(variable) {
            Some(indices) => indices.iter().map(|&i| &self.constraints[i]).collect(),
            None => self
                .constraints
                .iter()
                .filter(|c| c.involves(variable))
                .collect(),
        }
    }

    pub fn is_consistent(&self, assignment: &Assignment<V, T>) -> bool
    where
        T: Numeric + fmt::Debug,
    {
        self.constraints.iter().all(|c| c.check(assignment))
    }

    pub fn is_solution(&self, assignment: &Assignment<V, T>) -> bool
    where
        T: Numeric + fmt::Debug,
    {
        assignment.is_complete(self.num_variables()) && self.is_consistent(assignment)
    }

    /// Builds the `vconstraints` index and runs every constraint's
    /// setup-time preprocessing. Grounded on `Problem._getArgs` in
    /// `original_source/constraint/problem.py`, which builds the same
    /// index once before the configured solver is invoked. Returns
    /// `false` (a `CspError::InvalidDomain`) if preprocessing empties a
    /// domain — the problem has no solution regardless of search.
    pub fn compile(&mut self) -> Result<(), CspError>
    where
        T: Numeric + fmt::Debug,
    {
        self.vconstraints.clear();
        for variable in &self.order {
            self.vconstraints.insert(variable.clone(), Vec::new());
        }
        for (index, constraint) in self.constraints.iter().enumerate() {
            for variable in constraint.variables() {
                self.vconstraints.entry(variable).or_default().push(index);
            }
        }
        for constraint in &self.constraints {
            if !constraint.preprocess(&mut self.domains) {
                return Err(CspError::InvalidDomain(format!(
                    "constraint {:?} preprocessing emptied a domain",
                    constraint.name()
                )));
            }
        }
        Ok(())
    }

    pub fn domains_mut(&mut self) -> &mut HashMap<V, Domain<T>> {
        &mut self.domains
    }

    pub fn domains(&self) -> &HashMap<V, Domain<T>> {
        &self.domains
    }

    fn min_conflicts_solver(steps: usize, seed: Option<u64>) -> MinConflictsSolver {
        match seed {
            Some(seed) => MinConflictsSolver::with_seed(steps, seed),
            None => MinConflictsSolver::new(steps),
        }
    }

    /// Delegates to whichever solver `set_solver` configured (spec.md
    /// §4.C, §4.D). Defaults to iterative backtracking.
    pub fn get_solution(&self) -> Result<Option<Assignment<V, T>>, CspError>
    where
        T: Numeric + fmt::Debug,
    {
        match &self.solver_kind {
            SolverKind::Iterative => IterativeBacktrackingSolver::new().get_solution(self),
            SolverKind::Optimized => OptimizedBacktrackingSolver::new().get_solution(self),
            SolverKind::Recursive => RecursiveBacktrackingSolver::new().get_solution(self),
            SolverKind::MinConflicts { steps, seed } => {
                Self::min_conflicts_solver(*steps, *seed).get_solution(self)
            }
        }
    }

    pub fn get_solutions(&self) -> Result<Vec<Assignment<V, T>>, CspError>
    where
        T: Numeric + fmt::Debug,
    {
        match &self.solver_kind {
            SolverKind::Iterative => IterativeBacktrackingSolver::new().get_solutions(self),
            SolverKind::Optimized => OptimizedBacktrackingSolver::new().get_solutions(self),
            SolverKind::Recursive => RecursiveBacktrackingSolver::new().get_solutions(self),
            SolverKind::MinConflicts { steps, seed } => {
                Self::min_conflicts_solver(*steps, *seed).get_solutions(self)
            }
        }
    }

    pub fn get_solution_iter<'a>(
        &'a self,
    ) -> Result<Box<dyn Iterator<Item = Assignment<V, T>> + 'a>, CspError>
    where
        T: Numeric + fmt::Debug,
    {
        match &self.solver_kind {
            SolverKind::Iterative => IterativeBacktrackingSolver::new().get_solution_iter(self),
            SolverKind::Optimized => OptimizedBacktrackingSolver::new().get_solution_iter(self),
            SolverKind::Recursive => RecursiveBacktrackingSolver::new().get_solution_iter(self),
            SolverKind::MinConflicts { steps, seed } => {
                Self::min_conflicts_solver(*steps, *seed).get_solution_iter(self)
            }
        }
    }

    /// Every solution, each flattened into `order`'s variable order
    /// instead of an `Assignment` map. Grounded on
    /// `original_source/constraint/problem.py`'s
    /// `getSolutionsAsListDict`, which exists so callers that just want
    /// positional tuples don't have to look each variable up themselves.
    pub fn get_solutions_ordered_list(&self, order: &[V]) -> Result<Vec<Vec<T>>, CspError>
    where
        T: Numeric + fmt::Debug,
    {
        let solutions = self.get_solutions()?;
        Ok(solutions
            .into_iter()
            .map(|assignment| order.iter().filter_map(|v| assignment.get(v).copied()).collect())
            .collect())
    }

    /// Same as `get_solutions_ordered_list`, optionally validating that
    /// no two solutions collapsed onto the same ordered tuple — which
    /// would mean two distinct assignments happened to agree on every
    /// variable in `order` (`order` omitting a variable the constraints
    /// actually distinguish between is the only way this can happen).
    pub fn get_solutions_as_list_dict(
        &self,
        order: &[V],
        validate: bool,
    ) -> Result<Vec<Vec<T>>, CspError>
    where
        T: Numeric + fmt::Debug,
    {
        let lists = self.get_solutions_ordered_list(order)?;
        if validate {
            let mut duplicates = Vec::new();
            for i in 0..lists.len() {
                for j in (i + 1)..lists.len() {
                    if lists[i] == lists[j] {
                        duplicates.push(format!("{:?}", lists[i]));
                    }
                }
            }
            if !duplicates.is_empty() {
                return Err(CspError::DuplicateSolutions {
                    duplicates,
                    count: lists.len(),
                    constraints: self.num_constraints(),
                });
            }
        }
        Ok(lists)
    }
}

impl Problem<String, f64> {
    /// Queues a textual constraint for the parser to compile against
    /// this problem's domains the next time `compile_with_parser` runs
    /// (spec.md §4.C, §4.E). Only meaningful for `Problem<String, f64>`
    /// — the parser's grammar names variables as bare identifiers, so
    /// nothing else can host it.
    pub fn add_string_constraint(&mut self, expr: impl Into<String>) {
        self.pending_strings.push(expr.into());
    }

    /// Folds every pending string constraint into the regular constraint
    /// list via the parser, then runs the usual `compile()`. Grounded on
    /// `original_source/constraint/problem.py`'s `_getArgs`, which asks
    /// the parser to compile string constraints against the current
    /// domains before folding the results into the constraint list.
    pub fn compile_with_parser(&mut self) -> Result<(), CspError> {
        if !self.pending_strings.is_empty() {
            let parsed = crate::parser::compile_to_constraints(
                &self.pending_strings,
                &self.domains,
                self.parser_mode,
            )?;
            for p in parsed {
                self.constraints.push(p.constraint);
            }
            self.pending_strings.clear();
        }
        self.compile()
    }
}

impl<V, T> fmt::Display for Problem<V, T>
where
    V: Eq + Hash + Clone + fmt::Debug,
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Problem with {} variables:", self.order.len())?;
        for variable in &self.order {
            writeln!(f, "  {variable:?}: {:?}", self.domains[variable].values())?;
        }
        writeln!(f, "{} constraints", self.constraints.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{AllDifferentConstraint, Constraint};

    #[test]
    fn duplicate_variable_is_an_error() {
        let mut p: Problem<String, i64> = Problem::new();
        p.add_variable("a".into(), Domain::new([1, 2]).unwrap())
            .unwrap();
        let err = p.add_variable("a".into(), Domain::new([1, 2]).unwrap());
        assert!(matches!(err, Err(CspError::DuplicateVariable(_))));
    }

    #[test]
    fn constraint_on_unknown_variable_is_an_error() {
        let mut p: Problem<String, i64> = Problem::new();
        p.add_variable("a".into(), Domain::new([1, 2]).unwrap())
            .unwrap();
        let c = Constraint::AllDifferent(AllDifferentConstraint::new(
            "ad",
            vec!["a".to_string(), "b".to_string()],
        ));
        assert!(matches!(
            p.add_constraint(c),
            Err(CspError::InvalidConstraint { .. })
        ));
    }

    #[test]
    fn compile_builds_vconstraints_index() {
        let mut p: Problem<String, i64> = Problem::new();
        p.add_variable("a".into(), Domain::new([1, 2]).unwrap())
            .unwrap();
        p.add_variable("b".into(), Domain::new([1, 2]).unwrap())
            .unwrap();
        p.add_constraint(Constraint::AllDifferent(AllDifferentConstraint::new(
            "ad",
            vec!["a".to_string(), "b".to_string()],
        )))
        .unwrap();
        p.compile().unwrap();
        assert_eq!(p.get_constraints_for_variable(&"a".to_string()).len(), 1);
    }

    // The six concrete seed scenarios from spec.md §8, exercised through
    // the public `Problem` surface end to end.

    fn sorted_pairs(solutions: Vec<Assignment<String, i64>>) -> Vec<(i64, i64)> {
        let mut pairs: Vec<(i64, i64)> = solutions
            .iter()
            .map(|a| (*a.get(&"a".to_string()).unwrap(), *a.get(&"b".to_string()).unwrap()))
            .collect();
        pairs.sort();
        pairs
    }

    #[test]
    fn scenario_1_simple_ordering() {
        use crate::constraint::PredicateConstraint;

        let mut p: Problem<String, i64> = Problem::new();
        p.add_variable("a".into(), Domain::new([1, 2, 3]).unwrap()).unwrap();
        p.add_variable("b".into(), Domain::new([1, 2, 3]).unwrap()).unwrap();
        p.add_constraint(Constraint::Predicate(PredicateConstraint::new(
            "b>a",
            vec!["a".to_string(), "b".to_string()],
            |args: &[Option<i64>]| match (args[0], args[1]) {
                (Some(a), Some(b)) => b > a,
                _ => true,
            },
        )))
        .unwrap();
        p.compile().unwrap();
        let solutions = p.get_solutions().unwrap();
        assert_eq!(sorted_pairs(solutions), vec![(1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn scenario_2_all_different_on_two_vars() {
        let mut p: Problem<String, i64> = Problem::new();
        p.add_variable("a".into(), Domain::new([1, 2]).unwrap()).unwrap();
        p.add_variable("b".into(), Domain::new([1, 2]).unwrap()).unwrap();
        p.add_constraint(Constraint::AllDifferent(AllDifferentConstraint::new(
            "ad",
            vec!["a".to_string(), "b".to_string()],
        )))
        .unwrap();
        p.compile().unwrap();
        let solutions = p.get_solutions().unwrap();
        assert_eq!(sorted_pairs(solutions), vec![(1, 2), (2, 1)]);
    }

    #[test]
    fn scenario_3_exact_sum_with_multipliers() {
        use crate::constraint::{SumBound, SumConstraint};

        let mut p: Problem<String, i64> = Problem::new();
        p.add_variable("a".into(), Domain::new([0, 1, 2]).unwrap()).unwrap();
        p.add_variable("b".into(), Domain::new([0, 1, 2]).unwrap()).unwrap();
        p.add_constraint(Constraint::Sum(
            SumConstraint::new(
                "3=a+2b",
                vec!["a".to_string(), "b".to_string()],
                SumBound::Exact(3),
            )
            .with_multipliers(vec![1, 2]),
        ))
        .unwrap();
        p.compile().unwrap();
        let solutions = p.get_solutions().unwrap();
        assert_eq!(sorted_pairs(solutions), vec![(1, 1)]);
    }

    #[test]
    fn scenario_4_max_prod_with_zero_bound() {
        use crate::constraint::{ProdBound, ProdConstraint};

        let mut p: Problem<String, i64> = Problem::new();
        p.add_variable("a".into(), Domain::new([0, 1, 2]).unwrap()).unwrap();
        p.add_variable("b".into(), Domain::new([0, 1, 2]).unwrap()).unwrap();
        p.add_constraint(Constraint::Prod(ProdConstraint::new(
            "cap0",
            vec!["a".to_string(), "b".to_string()],
            ProdBound::Max(0),
        )))
        .unwrap();
        p.compile().unwrap();
        let solutions = p.get_solutions().unwrap();
        assert_eq!(
            sorted_pairs(solutions),
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (2, 0)]
        );
    }

    #[test]
    fn scenario_5_parser_produces_numeric_constraints() {
        let mut p: Problem<String, f64> = Problem::new().with_parser_mode(ParserMode::Inline);
        p.add_variable("x".into(), Domain::new([1.0, 2.0, 3.0, 4.0, 5.0]).unwrap())
            .unwrap();
        p.add_variable("y".into(), Domain::new([1.0, 2.0, 3.0, 4.0, 5.0]).unwrap())
            .unwrap();
        p.add_string_constraint("3 <= x+y <= 5");
        p.compile_with_parser().unwrap();
        assert_eq!(p.num_constraints(), 2);
        for solution in p.get_solutions().unwrap() {
            let x = *solution.get(&"x".to_string()).unwrap();
            let y = *solution.get(&"y".to_string()).unwrap();
            assert!((3.0..=5.0).contains(&(x + y)));
        }
    }

    #[test]
    fn scenario_6_variable_linked_sum() {
        use crate::constraint::{LinkedBound, VariableLinkedSumConstraint};

        let mut p: Problem<String, i64> = Problem::new();
        for name in ["a", "b", "c"] {
            p.add_variable(name.into(), Domain::new([1, 2, 3]).unwrap()).unwrap();
        }
        p.add_constraint(Constraint::LinkedSum(VariableLinkedSumConstraint::new(
            "c=a+b",
            "c".to_string(),
            vec!["a".to_string(), "b".to_string()],
            LinkedBound::Exact,
        )))
        .unwrap();
        p.compile().unwrap();
        let mut triples: Vec<(i64, i64, i64)> = p
            .get_solutions()
            .unwrap()
            .iter()
            .map(|a| {
                (
                    *a.get(&"a".to_string()).unwrap(),
                    *a.get(&"b".to_string()).unwrap(),
                    *a.get(&"c".to_string()).unwrap(),
                )
            })
            .collect();
        triples.sort();
        assert_eq!(triples, vec![(1, 1, 2), (1, 2, 3), (2, 1, 3)]);
    }
}
