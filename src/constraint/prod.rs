use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::assignment::Assignment;
use crate::domain::Domain;
use crate::numeric::Numeric;

/// Grounded on `original_source/constraint/constraints.py`'s
/// `MaxProdConstraint`/`MinProdConstraint`/`ExactProdConstraint` family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProdBound<T> {
    Max(T),
    Min(T),
    Exact(T),
}

#[derive(Debug, Clone)]
pub struct ProdConstraint<V, T> {
    pub(crate) name: String,
    pub(crate) variables: Vec<V>,
    pub(crate) bound: ProdBound<T>,
}

impl<V: Eq + Hash + Clone + fmt::Debug, T: Numeric + fmt::Debug> ProdConstraint<V, T> {
    pub fn new(name: impl Into<String>, variables: Vec<V>, bound: ProdBound<T>) -> Self {
        ProdConstraint {
            name: name.into(),
            variables,
            bound,
        }
    }

    /// Unlike `SumConstraint::check`, every bound kind here defers to the
    /// complete assignment. An unassigned factor can be less than one
    /// (notably zero), which shrinks the running product back down once
    /// it's filled in, so a partial product that already exceeds `Max`
    /// or `Exact` cannot be soundly rejected early — the original's
    /// `MaxProdConstraint`/`ExactProdConstraint.__call__` only reject
    /// early when every unassigned variable's domain is known to contain
    /// no value below one (`missing_lt1`); since this `check` has no
    /// domain access to make that determination, it defers uniformly,
    /// the same way `MinProd` already did.
    pub fn check(&self, assignment: &Assignment<V, T>) -> bool {
        let mut total = T::one();
        let mut complete = true;
        for var in &self.variables {
            match assignment.get(var) {
                Some(value) => total = total * *value,
                None => complete = false,
            }
        }
        if !complete {
            return true;
        }
        let total = total.round10();
        match self.bound {
            ProdBound::Max(max) => total <= max.round10(),
            ProdBound::Min(min) => total >= min.round10(),
            ProdBound::Exact(target) => total == target.round10(),
        }
    }

    /// Mirrors `SumConstraint::preprocess` (SPEC_FULL.md §10.1), using
    /// "every candidate value is at least one" as the monotonicity test
    /// in place of sum's "no negatives" — a value below one (including
    /// zero or negative) can make the running product shrink or change
    /// sign as more variables are multiplied in, so pruning on it alone
    /// is unsound once two or more variables can produce one.
    pub fn preprocess(&self, domains: &mut HashMap<V, Domain<T>>) -> bool {
        if !self.prune_zero(domains) {
            return false;
        }
        let bound = match self.bound {
            ProdBound::Max(max) => max,
            ProdBound::Exact(target) => target,
            ProdBound::Min(_) => return true,
        };
        let sub_one_vars: Vec<&V> = self
            .variables
            .iter()
            .filter(|v| {
                domains
                    .get(*v)
                    .map(|d| d.values().iter().any(|val| val.is_less_than_one()))
                    .unwrap_or(false)
            })
            .collect();

        let targets: Vec<&V> = match sub_one_vars.len() {
            0 => self.variables.iter().collect(),
            1 => sub_one_vars,
            _ => return true,
        };

        for var in targets {
            let Some(domain) = domains.get_mut(var) else {
                continue;
            };
            let to_remove: Vec<T> = domain
                .values()
                .iter()
                .filter(|v| **v > bound)
                .copied()
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

    /// The zero special cases from spec.md §4.B's numeric edge cases:
    /// "for MaxProd, a value of 0 is removed iff the bound is negative.
    /// For MinProd, 0 is removed iff the bound is strictly positive.
    /// ExactProd removes 0 iff the target is non-zero." Applied to
    /// every variable independently, since any one of them taking the
    /// value 0 forces the whole product to 0 regardless of the others.
    fn prune_zero(&self, domains: &mut HashMap<V, Domain<T>>) -> bool {
        let remove_zero = match self.bound {
            ProdBound::Max(max) => max.is_negative(),
            ProdBound::Min(min) => min > T::zero(),
            ProdBound::Exact(target) => target != T::zero(),
        };
        if !remove_zero {
            return true;
        }
        for var in &self.variables {
            let Some(domain) = domains.get_mut(var) else {
                continue;
            };
            domain.remove(&T::zero());
            if domain.is_empty() {
                return false;
            }
        }
        true
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
    fn exact_prod_defers_until_complete() {
        let c = ProdConstraint::new(
            "prod",
            vec!["a".to_string(), "b".to_string()],
            ProdBound::Exact(12),
        );
        assert!(c.check(&assign(&[("a", 3)])));
        assert!(c.check(&assign(&[("a", 3), ("b", 4)])));
        assert!(!c.check(&assign(&[("a", 3), ("b", 5)])));
    }

    #[test]
    fn max_prod_preprocess_prunes_when_all_values_at_least_one() {
        let c = ProdConstraint::new(
            "cap",
            vec!["a".to_string(), "b".to_string()],
            ProdBound::Max(6i64),
        );
        let mut domains = HashMap::new();
        domains.insert("a".to_string(), Domain::new([1, 2, 10]).unwrap());
        domains.insert("b".to_string(), Domain::new([1, 2]).unwrap());
        assert!(c.preprocess(&mut domains));
        assert_eq!(domains["a"].values(), &[1, 2]);
    }
}
