use std::fmt;
use std::hash::Hash;

use crate::assignment::Assignment;

/// Grounded on `constraint::common::all_different`/`diff`/`same` in
/// `examples/MVanderloo-constraint-solver/src/constraint.rs`, generalised
/// from its pairwise `diff`/`same` helpers to the full n-ary
/// `AllDifferentConstraint`/`AllEqualConstraint` from
/// `original_source/constraint/constraints.py`.
#[derive(Debug, Clone)]
pub struct AllDifferentConstraint<V> {
    pub(crate) name: String,
    pub(crate) variables: Vec<V>,
}

impl<V: Eq + Hash + Clone + fmt::Debug> AllDifferentConstraint<V> {
    pub fn new(name: impl Into<String>, variables: Vec<V>) -> Self {
        AllDifferentConstraint {
            name: name.into(),
            variables,
        }
    }

    pub fn check<T: Eq + Clone + fmt::Debug>(&self, assignment: &Assignment<V, T>) -> bool {
        let mut seen: Vec<&T> = Vec::new();
        for var in &self.variables {
            if let Some(value) = assignment.get(var) {
                if seen.contains(&value) {
                    return false;
                }
                seen.push(value);
            }
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct AllEqualConstraint<V> {
    pub(crate) name: String,
    pub(crate) variables: Vec<V>,
}

impl<V: Eq + Hash + Clone + fmt::Debug> AllEqualConstraint<V> {
    pub fn new(name: impl Into<String>, variables: Vec<V>) -> Self {
        AllEqualConstraint {
            name: name.into(),
            variables,
        }
    }

    pub fn check<T: Eq + Clone + fmt::Debug>(&self, assignment: &Assignment<V, T>) -> bool {
        let mut reference: Option<&T> = None;
        for var in &self.variables {
            if let Some(value) = assignment.get(var) {
                match reference {
                    None => reference = Some(value),
                    Some(r) if r != value => return false,
                    _ => {}
                }
            }
        }
        true
    }
}
