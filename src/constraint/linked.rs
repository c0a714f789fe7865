use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::assignment::Assignment;
use crate::domain::Domain;
use crate::numeric::Numeric;

/// Grounded on `original_source/constraint/constraints.py`'s
/// `VariableExactSumConstraint` family ("VariableLinked Sum/Prod" in
/// spec.md §4.B): the bound itself is a variable's value, not a
/// constant.
///
/// Resolution (SPEC_FULL.md §10.2): deferred ("not yet violated") until
/// the target *and* every source variable is assigned, rather than
/// substituting a placeholder such as `max(domain)` for the unassigned
/// ones — a placeholder can only ever be sound for one direction of one
/// bound kind, and silently gives the wrong answer for the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkedBound {
    Min,
    Max,
    Exact,
}

/// The lowest and highest value currently in `domain`, or `None` if it's
/// empty (the caller's `preprocess` has nothing sound to do with it yet).
fn domain_bounds<T: Numeric>(domain: &Domain<T>) -> Option<(T, T)> {
    let values = domain.values();
    let (&first, rest) = values.split_first()?;
    let (mut lo, mut hi) = (first, first);
    for &v in rest {
        if v < lo {
            lo = v;
        }
        if v > hi {
            hi = v;
        }
    }
    Some((lo, hi))
}

/// The min/max product achievable by picking, independently, either
/// extreme of each `(lo, hi)` pair in `bounds`. Grounded on
/// `_get_product_bounds` in `original_source/constraint/constraints.py`'s
/// `VariableMaxProdConstraint`/`VariableMinProdConstraint` family, which
/// tries every corner of the hyper-rectangle rather than just
/// `min(lo)*min(lo)...` — necessary because a negative factor can flip
/// which corner produces the overall minimum or maximum.
fn corner_product_bounds<T: Numeric>(bounds: &[(T, T)]) -> (T, T) {
    let mut products = vec![T::one()];
    for &(lo, hi) in bounds {
        let mut next = Vec::with_capacity(products.len() * 2);
        for &p in &products {
            next.push(p * lo);
            next.push(p * hi);
        }
        products = next;
    }
    let mut min = products[0];
    let mut max = products[0];
    for &p in &products[1..] {
        if p < min {
            min = p;
        }
        if p > max {
            max = p;
        }
    }
    (min, max)
}

#[derive(Debug, Clone)]
pub struct VariableLinkedSumConstraint<V, T> {
    pub(crate) name: String,
    pub(crate) target: V,
    pub(crate) sources: Vec<V>,
    pub(crate) bound: LinkedBound,
    _marker: std::marker::PhantomData<T>,
}

impl<V: Eq + Hash + Clone + fmt::Debug, T: Numeric + fmt::Debug> VariableLinkedSumConstraint<V, T> {
    pub fn new(name: impl Into<String>, target: V, sources: Vec<V>, bound: LinkedBound) -> Self {
        VariableLinkedSumConstraint {
            name: name.into(),
            target,
            sources,
            bound,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn check(&self, assignment: &Assignment<V, T>) -> bool {
        let Some(&target_value) = assignment.get(&self.target) else {
            return true;
        };
        let mut total = T::zero();
        for var in &self.sources {
            match assignment.get(var) {
                Some(value) => total = total + *value,
                None => return true,
            }
        }
        let total = total.round10();
        let target_value = target_value.round10();
        match self.bound {
            LinkedBound::Min => total >= target_value,
            LinkedBound::Max => total <= target_value,
            LinkedBound::Exact => total == target_value,
        }
    }

    /// Bound-propagation, grounded on `VariableExactSumConstraint`/
    /// `VariableMaxSumConstraint`/`VariableMinSumConstraint.preProcess`
    /// (without multipliers): for each source, the other sources'
    /// domains bound how small or large their combined contribution can
    /// be, so a candidate value that cannot possibly reach the target's
    /// feasible range under any completion is pruned up front.
    pub fn preprocess(&self, domains: &mut HashMap<V, Domain<T>>) -> bool {
        let Some((target_min, target_max)) = domains.get(&self.target).and_then(domain_bounds) else {
            return true;
        };
        for var in &self.sources {
            let mut others_min = T::zero();
            let mut others_max = T::zero();
            for other in &self.sources {
                if other == var {
                    continue;
                }
                if let Some((lo, hi)) = domains.get(other).and_then(domain_bounds) {
                    others_min = others_min + lo;
                    others_max = others_max + hi;
                }
            }
            let Some(domain) = domains.get_mut(var) else {
                continue;
            };
            let to_remove: Vec<T> = domain
                .values()
                .iter()
                .copied()
                .filter(|value| {
                    let total_min = *value + others_min;
                    let total_max = *value + others_max;
                    match self.bound {
                        LinkedBound::Min => total_max < target_min,
                        LinkedBound::Max => total_min > target_max,
                        LinkedBound::Exact => total_max < target_min || total_min > target_max,
                    }
                })
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

#[derive(Debug, Clone)]
pub struct VariableLinkedProdConstraint<V, T> {
    pub(crate) name: String,
    pub(crate) target: V,
    pub(crate) sources: Vec<V>,
    pub(crate) bound: LinkedBound,
    _marker: std::marker::PhantomData<T>,
}

impl<V: Eq + Hash + Clone + fmt::Debug, T: Numeric + fmt::Debug> VariableLinkedProdConstraint<V, T> {
    pub fn new(name: impl Into<String>, target: V, sources: Vec<V>, bound: LinkedBound) -> Self {
        VariableLinkedProdConstraint {
            name: name.into(),
            target,
            sources,
            bound,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn check(&self, assignment: &Assignment<V, T>) -> bool {
        let Some(&target_value) = assignment.get(&self.target) else {
            return true;
        };
        let mut total = T::one();
        for var in &self.sources {
            match assignment.get(var) {
                Some(value) => total = total * *value,
                None => return true,
            }
        }
        let total = total.round10();
        let target_value = target_value.round10();
        match self.bound {
            LinkedBound::Min => total >= target_value,
            LinkedBound::Max => total <= target_value,
            LinkedBound::Exact => total == target_value,
        }
    }

    /// Bound-propagation, grounded on `_get_product_bounds` and
    /// `VariableMaxProdConstraint`/`VariableMinProdConstraint`/
    /// `VariableExactProdConstraint.preProcess`: the other sources'
    /// corner-product bounds give the range `value` would be multiplied
    /// into, and a value pruned if that range can never meet the
    /// target's feasible range.
    pub fn preprocess(&self, domains: &mut HashMap<V, Domain<T>>) -> bool {
        let Some((target_min, target_max)) = domains.get(&self.target).and_then(domain_bounds) else {
            return true;
        };
        for var in &self.sources {
            let other_bounds: Vec<(T, T)> = self
                .sources
                .iter()
                .filter(|other| *other != var)
                .filter_map(|other| domains.get(other).and_then(domain_bounds))
                .collect();
            let (other_min, other_max) = corner_product_bounds(&other_bounds);
            let Some(domain) = domains.get_mut(var) else {
                continue;
            };
            let to_remove: Vec<T> = domain
                .values()
                .iter()
                .copied()
                .filter(|value| {
                    let a = *value * other_min;
                    let b = *value * other_max;
                    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
                    match self.bound {
                        LinkedBound::Min => hi < target_min,
                        LinkedBound::Max => lo > target_max,
                        LinkedBound::Exact => hi < target_min || lo > target_max,
                    }
                })
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
    fn exact_sum_link_defers_until_target_and_sources_are_assigned() {
        let c = VariableLinkedSumConstraint::<String, i64>::new(
            "link",
            "total".to_string(),
            vec!["a".to_string(), "b".to_string()],
            LinkedBound::Exact,
        );
        assert!(c.check(&assign(&[("total", 10)])));
        assert!(c.check(&assign(&[("total", 10), ("a", 4)])));
        assert!(c.check(&assign(&[("total", 10), ("a", 4), ("b", 6)])));
        assert!(!c.check(&assign(&[("total", 10), ("a", 4), ("b", 7)])));
    }

    #[test]
    fn exact_sum_link_preprocess_prunes_sources_that_cannot_reach_the_target() {
        let c = VariableLinkedSumConstraint::<String, i64>::new(
            "link",
            "total".to_string(),
            vec!["a".to_string(), "b".to_string()],
            LinkedBound::Exact,
        );
        let mut domains = HashMap::new();
        domains.insert("total".to_string(), Domain::new([3, 4]).unwrap());
        domains.insert("a".to_string(), Domain::new([0, 1, 10]).unwrap());
        domains.insert("b".to_string(), Domain::new([1]).unwrap());
        assert!(c.preprocess(&mut domains));
        // b is fixed at 1, so a can only ever need to cover 2..3 to land
        // in [3, 4]; 10 can never be brought back down by b=1.
        assert_eq!(domains["a"].values(), &[0, 1]);
    }

    #[test]
    fn max_sum_link_preprocess_prunes_sources_guaranteed_over_target() {
        let c = VariableLinkedSumConstraint::<String, i64>::new(
            "link",
            "total".to_string(),
            vec!["a".to_string(), "b".to_string()],
            LinkedBound::Max,
        );
        let mut domains = HashMap::new();
        domains.insert("total".to_string(), Domain::new([5]).unwrap());
        domains.insert("a".to_string(), Domain::new([1, 10]).unwrap());
        domains.insert("b".to_string(), Domain::new([0]).unwrap());
        assert!(c.preprocess(&mut domains));
        assert_eq!(domains["a"].values(), &[1]);
    }

    #[test]
    fn exact_prod_link_preprocess_prunes_using_corner_products() {
        let c = VariableLinkedProdConstraint::<String, i64>::new(
            "link",
            "total".to_string(),
            vec!["a".to_string(), "b".to_string()],
            LinkedBound::Exact,
        );
        let mut domains = HashMap::new();
        domains.insert("total".to_string(), Domain::new([4]).unwrap());
        domains.insert("a".to_string(), Domain::new([1, 2, 5]).unwrap());
        domains.insert("b".to_string(), Domain::new([2]).unwrap());
        assert!(c.preprocess(&mut domains));
        // b is fixed at 2, so a*2 must land on 4 — a=5 can never reach it.
        assert_eq!(domains["a"].values(), &[1, 2]);
    }
}
