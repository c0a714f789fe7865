//! Partial assignment of values to variables.
//!
//! Grounded on `examples/MVanderloo-constraint-solver/src/assignment.rs`;
//! kept as a thin wrapper around a map rather than the teacher's
//! `HashMap<Variable<T>, T>` field layout, generalised to the two
//! independent generic parameters this crate needs (`V` variable
//! identity, `T` domain value). Per the design note in spec.md §9, there
//! is no sentinel "unassigned" value: absence from the map *is*
//! unassigned, and predicate arguments are threaded as `Option<T>`.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

#[derive(Debug, Clone, Default)]
pub struct Assignment<V, T> {
    values: HashMap<V, T>,
}

impl<V: Eq + Hash + Clone + fmt::Debug, T: Clone + fmt::Debug> Assignment<V, T> {
    pub fn new() -> Self {
        Assignment {
            values: HashMap::new(),
        }
    }

    pub fn assign(&mut self, variable: V, value: T) {
        self.values.insert(variable, value);
    }

    pub fn unassign(&mut self, variable: &V) {
        self.values.remove(variable);
    }

    pub fn is_assigned(&self, variable: &V) -> bool {
        self.values.contains_key(variable)
    }

    pub fn get(&self, variable: &V) -> Option<&T> {
        self.values.get(variable)
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn is_complete(&self, num_variables: usize) -> bool {
        self.values.len() == num_variables
    }

    pub fn variables(&self) -> impl Iterator<Item = &V> {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&V, &T)> {
        self.values.iter()
    }

    pub fn into_map(self) -> HashMap<V, T> {
        self.values
    }
}

impl<V, T> From<HashMap<V, T>> for Assignment<V, T> {
    fn from(values: HashMap<V, T>) -> Self {
        Assignment { values }
    }
}

impl<V: fmt::Debug + Eq + Hash, T: fmt::Debug> fmt::Display for Assignment<V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (var, val)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{var:?}: {val:?}")?;
        }
        write!(f, "}}")
    }
}
