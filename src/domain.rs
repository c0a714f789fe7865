//! Reversible finite domain.
//!
//! Grounded on `examples/MVanderloo-constraint-solver/src/csp/domain.rs`
//! for the overall `Domain<T>` shape (a small value container owned by a
//! `Problem`), reworked from the teacher's clone-on-write
//! (`remove`/`restrict_to` returning new domains) into the push/pop
//! checkpoint stack `original_source/constraint/domain.py` implements,
//! which the backtracking solvers need to undo pruning cheaply between
//! branches without cloning the whole domain.

use crate::error::CspError;

/// A variable's remaining candidate values, with a checkpoint stack for
/// cheap undo during search.
///
/// `values` holds the values still in play; `hidden` holds values pushed
/// out by `hide_value` in the order they were removed, so `pop_state` can
/// restore them. `states` records, for every `push_state`, how many
/// entries `hidden` held at that point.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain<T> {
    values: Vec<T>,
    hidden: Vec<T>,
    states: Vec<usize>,
}

impl<T: Clone + PartialEq + std::fmt::Debug> Domain<T> {
    /// Builds a domain from a non-empty sequence of values, preserving
    /// order (the order drives the default value-ordering heuristic).
    pub fn new(values: impl IntoIterator<Item = T>) -> Result<Self, CspError> {
        let values: Vec<T> = values.into_iter().collect();
        if values.is_empty() {
            return Err(CspError::EmptyDomain(
                "domain must be constructed from a non-empty sequence".into(),
            ));
        }
        Ok(Domain {
            values,
            hidden: Vec::new(),
            states: Vec::new(),
        })
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, value: &T) -> bool {
        self.values.contains(value)
    }

    /// Checkpoints the current domain. Paired with `pop_state`.
    pub fn push_state(&mut self) {
        self.states.push(self.hidden.len());
    }

    /// Restores every value hidden since the matching `push_state`.
    ///
    /// A no-op when there is no open checkpoint, matching the original's
    /// tolerance for an unbalanced `popState` at the top of the stack.
    pub fn pop_state(&mut self) {
        let Some(mark) = self.states.pop() else {
            return;
        };
        while self.hidden.len() > mark {
            if let Some(value) = self.hidden.pop() {
                self.values.push(value);
            }
        }
    }

    /// Temporarily removes `value`, reversible by the next `pop_state`.
    /// No-op if the value is not currently present.
    pub fn hide_value(&mut self, value: &T) {
        if let Some(pos) = self.values.iter().position(|v| v == value) {
            let removed = self.values.remove(pos);
            self.hidden.push(removed);
        }
    }

    /// Permanently removes `value`. Only valid before search begins
    /// (preprocessing); unlike `hide_value`, this survives `pop_state`.
    pub fn remove(&mut self, value: &T) {
        self.values.retain(|v| v != value);
    }

    /// Drops every checkpoint and restores all hidden values, returning
    /// the domain to its post-construction state.
    pub fn reset_state(&mut self) {
        self.values.append(&mut self.hidden);
        self.states.clear();
    }

    /// Depth of the checkpoint stack, exposed for tests.
    pub fn state_depth(&self) -> usize {
        self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sequence_is_a_construction_error() {
        let result = Domain::<i64>::new(Vec::<i64>::new());
        assert!(matches!(result, Err(CspError::EmptyDomain(_))));
    }

    #[test]
    fn hide_and_pop_restores_exact_order() {
        let mut d = Domain::new([1, 2, 3, 4]).unwrap();
        d.push_state();
        d.hide_value(&2);
        d.hide_value(&4);
        assert_eq!(d.values(), &[1, 3]);
        d.pop_state();
        assert_eq!(d.values(), &[1, 2, 3, 4]);
    }

    #[test]
    fn nested_checkpoints_unwind_independently() {
        let mut d = Domain::new([1, 2, 3]).unwrap();
        d.push_state();
        d.hide_value(&1);
        d.push_state();
        d.hide_value(&2);
        assert_eq!(d.values(), &[3]);
        d.pop_state();
        assert_eq!(d.values(), &[3, 2]);
        d.pop_state();
        assert_eq!(d.values(), &[3, 2, 1]);
    }

    #[test]
    fn remove_is_permanent_across_pop_state() {
        let mut d = Domain::new([1, 2, 3]).unwrap();
        d.push_state();
        d.remove(&2);
        d.pop_state();
        assert_eq!(d.values(), &[1, 3]);
    }

    #[test]
    fn reset_state_restores_everything_and_clears_stack() {
        let mut d = Domain::new([1, 2, 3]).unwrap();
        d.push_state();
        d.hide_value(&1);
        d.push_state();
        d.hide_value(&2);
        d.reset_state();
        assert_eq!(d.state_depth(), 0);
        let mut values = d.values().to_vec();
        values.sort();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn unbalanced_pop_state_is_a_harmless_no_op() {
        let mut d = Domain::new([1, 2]).unwrap();
        d.pop_state();
        assert_eq!(d.values(), &[1, 2]);
    }
}
