use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::assignment::Assignment;
use crate::domain::Domain;
use crate::numeric::Numeric;

/// Grounded on `original_source/constraint/constraints.py`'s
/// `MaxSumConstraint`/`MinSumConstraint`/`ExactSumConstraint` family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SumBound<T> {
    Max(T),
    Min(T),
    Exact(T),
}

#[derive(Debug, Clone)]
pub struct SumConstraint<V, T> {
    pub(crate) name: String,
    pub(crate) variables: Vec<V>,
    pub(crate) bound: SumBound<T>,
    pub(crate) multipliers: Option<Vec<T>>,
}

impl<V: Eq + Hash + Clone + fmt::Debug, T: Numeric + fmt::Debug> SumConstraint<V, T> {
    pub fn new(name: impl Into<String>, variables: Vec<V>, bound: SumBound<T>) -> Self {
        SumConstraint {
            name: name.into(),
            variables,
            bound,
            multipliers: None,
        }
    }

    /// Weighted form: `Σ multipliers[i] * variables[i]`, per spec.md
    /// §4.B's `MaxSum(S, multipliers?)` row. `multipliers` must be the
    /// same length as `variables`.
    pub fn with_multipliers(mut self, multipliers: Vec<T>) -> Self {
        assert_eq!(
            multipliers.len(),
            self.variables.len(),
            "multipliers must match variables 1:1"
        );
        self.multipliers = Some(multipliers);
        self
    }

    fn weight(&self, index: usize) -> T {
        match &self.multipliers {
            Some(weights) => weights[index],
            None => T::one(),
        }
    }

    /// Deferred until every variable in this constraint is assigned, per
    /// the resolution in SPEC_FULL.md §10.2 applied uniformly to the
    /// numeric constraint family: a partial sum never yet "violates"
    /// unless it is the final value. `MaxSum` is the exception (spec.md
    /// §4.B: "false if > S" is checked against the partial sum too, not
    /// only the complete one), since a weighted running total can only
    /// grow or shrink towards the bound depending on sign, and cannot
    /// un-violate a bound it has already crossed for a non-negative
    /// weighted term.
    pub fn check(&self, assignment: &Assignment<V, T>) -> bool {
        let mut total = T::zero();
        let mut complete = true;
        for (index, var) in self.variables.iter().enumerate() {
            match assignment.get(var) {
                Some(value) => total = total + self.weight(index) * *value,
                None => {
                    complete = false;
                }
            }
        }
        let total = total.round10();
        match self.bound {
            SumBound::Max(max) => total <= max.round10(),
            SumBound::Min(min) => !complete || total >= min.round10(),
            SumBound::Exact(target) => {
                if complete {
                    total == target.round10()
                } else {
                    total <= target.round10()
                }
            }
        }
    }

    /// Node consistency at setup time (SPEC_FULL.md §10.1): when bounded
    /// by `Max`, or by `Exact` acting as an upper bound, and none (or
    /// exactly one) of the constraint's variables can go negative, a
    /// single value already larger than the bound can never be part of
    /// any solution, independent of the other variables.
    pub fn preprocess(&self, domains: &mut HashMap<V, Domain<T>>) -> bool {
        let bound = match self.bound {
            SumBound::Max(max) => max,
            SumBound::Exact(target) => target,
            SumBound::Min(_) => return true,
        };
        let negative_vars: Vec<(usize, &V)> = self
            .variables
            .iter()
            .enumerate()
            .filter(|(index, v)| {
                let weight = self.weight(*index);
                domains
                    .get(*v)
                    .map(|d| d.values().iter().any(|val| (weight * *val).is_negative()))
                    .unwrap_or(false)
            })
            .collect();

        let targets: Vec<(usize, &V)> = match negative_vars.len() {
            0 => self.variables.iter().enumerate().collect(),
            1 => negative_vars,
            _ => return true,
        };

        for (index, var) in targets {
            let weight = self.weight(index);
            let Some(domain) = domains.get_mut(var) else {
                continue;
            };
            let to_remove: Vec<T> = domain
                .values()
                .iter()
                .filter(|v| weight * **v > bound)
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
    fn exact_sum_defers_until_complete() {
        let c = SumConstraint::new(
            "sum",
            vec!["a".to_string(), "b".to_string()],
            SumBound::Exact(10),
        );
        assert!(c.check(&assign(&[("a", 3)])));
        assert!(c.check(&assign(&[("a", 4), ("b", 6)])));
        assert!(!c.check(&assign(&[("a", 4), ("b", 7)])));
    }

    #[test]
    fn max_sum_preprocess_prunes_values_above_bound_when_no_negatives() {
        let c = SumConstraint::new(
            "cap",
            vec!["a".to_string(), "b".to_string()],
            SumBound::Max(5i64),
        );
        let mut domains = HashMap::new();
        domains.insert("a".to_string(), Domain::new([1, 2, 3, 10]).unwrap());
        domains.insert("b".to_string(), Domain::new([0, 1]).unwrap());
        assert!(c.preprocess(&mut domains));
        assert_eq!(domains["a"].values(), &[1, 2, 3]);
    }

    #[test]
    fn max_sum_preprocess_skips_when_two_variables_can_go_negative() {
        let c = SumConstraint::new(
            "cap",
            vec!["a".to_string(), "b".to_string()],
            SumBound::Max(5i64),
        );
        let mut domains = HashMap::new();
        domains.insert("a".to_string(), Domain::new([-1, 10]).unwrap());
        domains.insert("b".to_string(), Domain::new([-1, 10]).unwrap());
        assert!(c.preprocess(&mut domains));
        assert_eq!(domains["a"].values(), &[-1, 10]);
    }
}
