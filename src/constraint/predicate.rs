use std::fmt;
use std::rc::Rc;

use crate::assignment::Assignment;

/// A user-supplied boolean function over an ordered tuple of variables.
///
/// Grounded on `examples/MVanderloo-constraint-solver/src/constraint.rs`,
/// which stored its predicate as `Rc<dyn Fn(&Assignment<T>) -> bool>`.
/// This version narrows the predicate's argument to exactly its own
/// variables, passed positionally as `Option<T>` (per spec.md §9's design
/// note: "no sentinel unassigned value — predicate arguments are threaded
/// as `Option<T>`"), so predicates never need to know about variables
/// outside their own scope.
pub struct PredicateConstraint<V, T> {
    pub(crate) name: String,
    pub(crate) variables: Vec<V>,
    /// When `false` (the default), `check` short-circuits to `true` as
    /// soon as any of this predicate's variables is unassigned instead
    /// of calling `f` with a `None` placeholder — per spec.md §4.B's
    /// Predicate row: "if any missing and accepts_unassigned=false,
    /// return true". Predicates that want to reason about partial
    /// assignments (e.g. to drive an early forward-check) set this.
    pub(crate) accepts_unassigned: bool,
    #[allow(clippy::type_complexity)]
    predicate: Rc<dyn Fn(&[Option<T>]) -> bool>,
}

impl<V: Clone, T> Clone for PredicateConstraint<V, T> {
    fn clone(&self) -> Self {
        PredicateConstraint {
            name: self.name.clone(),
            variables: self.variables.clone(),
            accepts_unassigned: self.accepts_unassigned,
            predicate: Rc::clone(&self.predicate),
        }
    }
}

impl<V, T> fmt::Debug for PredicateConstraint<V, T>
where
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateConstraint")
            .field("name", &self.name)
            .field("variables", &self.variables)
            .finish()
    }
}

impl<V: Eq + std::hash::Hash + Clone, T: Clone> PredicateConstraint<V, T> {
    pub fn new<F>(name: impl Into<String>, variables: Vec<V>, predicate: F) -> Self
    where
        F: Fn(&[Option<T>]) -> bool + 'static,
    {
        PredicateConstraint {
            name: name.into(),
            variables,
            accepts_unassigned: false,
            predicate: Rc::new(predicate),
        }
    }

    /// Opts into seeing `None` placeholders for unassigned variables
    /// instead of the default defer-until-complete behaviour.
    pub fn accepting_unassigned(mut self) -> Self {
        self.accepts_unassigned = true;
        self
    }

    pub fn check(&self, assignment: &Assignment<V, T>) -> bool
    where
        V: fmt::Debug,
        T: fmt::Debug,
    {
        let missing = self.variables.iter().any(|v| !assignment.is_assigned(v));
        if missing && !self.accepts_unassigned {
            return true;
        }
        let args: Vec<Option<T>> = self
            .variables
            .iter()
            .map(|v| assignment.get(v).cloned())
            .collect();
        (self.predicate)(&args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assign(pairs: &[(&str, i64)]) -> Assignment<String, i64> {
        let mut a = Assignment::new();
        for (name, value) in pairs {
            a.assign(name.to_string(), *value);
        }
        a
    }

    #[test]
    fn defaults_to_true_on_a_partial_assignment() {
        let c = PredicateConstraint::new("eq", vec!["a".to_string(), "b".to_string()], |args: &[Option<i64>]| {
            args[0] == args[1]
        });
        assert!(c.check(&assign(&[("a", 1)])));
        assert!(c.check(&assign(&[("a", 1), ("b", 1)])));
        assert!(!c.check(&assign(&[("a", 1), ("b", 2)])));
    }

    #[test]
    fn accepting_unassigned_passes_none_placeholders_through() {
        let c = PredicateConstraint::new(
            "either-unset-or-equal",
            vec!["a".to_string(), "b".to_string()],
            |args: &[Option<i64>]| match (args[0], args[1]) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            },
        )
        .accepting_unassigned();
        assert!(c.check(&assign(&[("a", 1)])));
    }
}
