//! Optional convenience wrapper for variable identity.
//!
//! `original_source/constraint/domain.py` documents that "using this
//! class is optional, since any hashable object...may be used as
//! variables" — the same is true here: `Problem<V, T>` accepts any
//! `V: Eq + Hash + Clone + Debug` directly (a `String`, an integer, a
//! tuple). `Variable` exists only as a readable, `Display`-able name
//! type for callers who want one, grounded on
//! `examples/MVanderloo-constraint-solver/src/variable.rs`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(String);

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Variable(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Variable::new(name)
    }
}

impl From<String> for Variable {
    fn from(name: String) -> Self {
        Variable::new(name)
    }
}
