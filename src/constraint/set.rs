use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::assignment::Assignment;
use crate::domain::Domain;

/// Grounded on `original_source/constraint/constraints.py`'s
/// `InSetConstraint`/`NotInSetConstraint`/`SomeInSetConstraint`/
/// `SomeNotInSetConstraint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    /// Every variable's value must lie in the set.
    In,
    /// Every variable's value must lie outside the set.
    NotIn,
}

#[derive(Debug, Clone)]
pub struct SetConstraint<V, T> {
    pub(crate) name: String,
    pub(crate) variables: Vec<V>,
    pub(crate) set: Vec<T>,
    pub(crate) mode: SetMode,
}

impl<V: Eq + Hash + Clone + fmt::Debug, T: Eq + Clone + fmt::Debug> SetConstraint<V, T> {
    pub fn new(name: impl Into<String>, variables: Vec<V>, set: Vec<T>, mode: SetMode) -> Self {
        SetConstraint {
            name: name.into(),
            variables,
            set,
            mode,
        }
    }

    /// Per spec.md §4.B, `check` on `InSet`/`NotInSet` is unreachable in
    /// the original design — `preprocess` removes every offending value
    /// from every variable's domain up front, so no assignment can ever
    /// violate the constraint by the time search begins. Kept here as a
    /// defensive fallback (e.g. a domain added to the problem after
    /// preprocessing ran) rather than relied upon.
    pub fn check(&self, assignment: &Assignment<V, T>) -> bool {
        for var in &self.variables {
            if let Some(value) = assignment.get(var) {
                let member = self.set.contains(value);
                let ok = match self.mode {
                    SetMode::In => member,
                    SetMode::NotIn => !member,
                };
                if !ok {
                    return false;
                }
            }
        }
        true
    }

    /// Permanently removes every domain value that would violate the
    /// constraint, discharging it for good (spec.md §4.B: "Remove all
    /// values (not) in S from each variable's domain, then
    /// self-discharge").
    pub fn preprocess(&self, domains: &mut HashMap<V, Domain<T>>) -> bool {
        for var in &self.variables {
            let Some(domain) = domains.get_mut(var) else {
                continue;
            };
            let to_remove: Vec<T> = domain
                .values()
                .iter()
                .filter(|v| {
                    let member = self.set.contains(v);
                    match self.mode {
                        SetMode::In => !member,
                        SetMode::NotIn => member,
                    }
                })
                .cloned()
                .collect();
            for value in to_remove {
                domain.remove(&value);
            }
            if domain.is_empty() {
                return false;
            }
        }
        true
    }
}

/// "At least `n`" (or, when `exact` is set, "exactly `n`") of the
/// constraint's variables have values in (or out of) the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SomeSetMode {
    SomeIn,
    SomeNotIn,
}

#[derive(Debug, Clone)]
pub struct SomeSetConstraint<V, T> {
    pub(crate) name: String,
    pub(crate) variables: Vec<V>,
    pub(crate) set: Vec<T>,
    pub(crate) n: usize,
    pub(crate) exact: bool,
    pub(crate) mode: SomeSetMode,
}

impl<V: Eq + Hash + Clone + fmt::Debug, T: Eq + Clone + fmt::Debug> SomeSetConstraint<V, T> {
    pub fn new(
        name: impl Into<String>,
        variables: Vec<V>,
        set: Vec<T>,
        n: usize,
        exact: bool,
        mode: SomeSetMode,
    ) -> Self {
        SomeSetConstraint {
            name: name.into(),
            variables,
            set,
            n,
            exact,
            mode,
        }
    }

    /// Deferred until every variable is assigned: the count of matches
    /// can only grow as more variables are filled in, so an early
    /// partial count can't soundly reject or accept.
    pub fn check(&self, assignment: &Assignment<V, T>) -> bool {
        let mut count = 0usize;
        for var in &self.variables {
            match assignment.get(var) {
                Some(value) => {
                    let member = self.set.contains(value);
                    let matches = match self.mode {
                        SomeSetMode::SomeIn => member,
                        SomeSetMode::SomeNotIn => !member,
                    };
                    if matches {
                        count += 1;
                    }
                }
                None => return true,
            }
        }
        if self.exact {
            count == self.n
        } else {
            count >= self.n
        }
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

    fn vars(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn in_set_preprocess_removes_values_outside_the_set_then_discharges() {
        let c = SetConstraint::new("members", vars(&["a", "b"]), vec![1, 2], SetMode::In);
        let mut domains = HashMap::new();
        domains.insert("a".to_string(), Domain::new([1, 2, 3]).unwrap());
        domains.insert("b".to_string(), Domain::new([2, 3, 4]).unwrap());
        assert!(c.preprocess(&mut domains));
        assert_eq!(domains["a"].values(), &[1, 2]);
        assert_eq!(domains["b"].values(), &[2]);
    }

    #[test]
    fn not_in_set_preprocess_removes_values_inside_the_set() {
        let c = SetConstraint::new("forbidden", vars(&["a"]), vec![2], SetMode::NotIn);
        let mut domains = HashMap::new();
        domains.insert("a".to_string(), Domain::new([1, 2, 3]).unwrap());
        assert!(c.preprocess(&mut domains));
        assert_eq!(domains["a"].values(), &[1, 3]);
    }

    #[test]
    fn in_set_preprocess_reports_failure_when_a_domain_empties() {
        let c = SetConstraint::new("members", vars(&["a"]), vec![99], SetMode::In);
        let mut domains = HashMap::new();
        domains.insert("a".to_string(), Domain::new([1, 2]).unwrap());
        assert!(!c.preprocess(&mut domains));
    }

    #[test]
    fn some_in_set_counts_matches_and_defers_on_partial_assignment() {
        let c = SomeSetConstraint::new("some", vars(&["a", "b", "c"]), vec![1, 2], 2, false, SomeSetMode::SomeIn);
        assert!(c.check(&assign(&[("a", 1)])));
        assert!(c.check(&assign(&[("a", 1), ("b", 2), ("c", 9)])));
        assert!(!c.check(&assign(&[("a", 1), ("b", 9), ("c", 9)])));
    }

    #[test]
    fn some_not_in_set_exact_requires_the_precise_count() {
        let c = SomeSetConstraint::new("exactly-one-outside", vars(&["a", "b"]), vec![1], 1, true, SomeSetMode::SomeNotIn);
        assert!(c.check(&assign(&[("a", 1), ("b", 2)])));
        assert!(!c.check(&assign(&[("a", 2), ("b", 2)])));
        assert!(!c.check(&assign(&[("a", 1), ("b", 1)])));
    }
}
