//! Variable- and value-ordering heuristics shared by the backtracking
//! solvers.
//!
//! Grounded on
//! `examples/MVanderloo-constraint-solver/src/solver/heuristics.rs`
//! (`minimum_remaining_values`, `least_constraining_value`), extended
//! with the degree heuristic as the MRV tie-breaker spec.md §4.D names
//! ("Degree+MRV variable selection").

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::assignment::Assignment;
use crate::constraint::Constraint;
use crate::domain::Domain;
use crate::numeric::Numeric;

/// Picks the unassigned variable with the **highest** constraint degree,
/// breaking ties by the **smallest** remaining domain (spec.md §4.D
/// "Select": "pick an unassigned variable with the highest
/// constraint-degree; ties broken by the smallest domain"). Returns
/// `None` once every variable is assigned.
pub fn select_variable<V, T>(
    order: &[V],
    domains: &HashMap<V, Domain<T>>,
    assignment: &Assignment<V, T>,
    constraints: &[Constraint<V, T>],
) -> Option<V>
where
    V: Eq + Hash + Clone + fmt::Debug,
    T: Numeric + fmt::Debug,
{
    order
        .iter()
        .filter(|v| !assignment.is_assigned(v))
        .min_by_key(|v| {
            let remaining = domains.get(*v).map(Domain::len).unwrap_or(0);
            let degree = constraints
                .iter()
                .filter(|c| {
                    c.involves(v)
                        && c.variables()
                            .iter()
                            .any(|other| other != *v && !assignment.is_assigned(other))
                })
                .count();
            (std::cmp::Reverse(degree), remaining)
        })
        .cloned()
}

/// Orders `domain`'s values by how many choices they leave for the
/// variable's neighbours, least-constraining first.
pub fn least_constraining_value<V, T>(
    variable: &V,
    domain: &Domain<T>,
    assignment: &Assignment<V, T>,
    constraints: &[Constraint<V, T>],
) -> Vec<T>
where
    V: Eq + Hash + Clone + fmt::Debug,
    T: Numeric + fmt::Debug,
{
    let relevant: Vec<&Constraint<V, T>> = constraints.iter().filter(|c| c.involves(variable)).collect();
    let mut values: Vec<T> = domain.values().to_vec();
    values.sort_by_key(|value| {
        let mut trial = assignment.clone();
        trial.assign(variable.clone(), *value);
        relevant.iter().filter(|c| !c.check(&trial)).count()
    });
    values
}
