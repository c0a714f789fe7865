use std::fmt;

/// Errors produced while building or solving a CSP.
///
/// `NoSolutions` is deliberately absent: "no solution found" is a normal
/// outcome, represented by an empty `Vec`/`None`, not an error.
#[derive(Debug, thiserror::Error)]
pub enum CspError {
    #[error("variable {0:?} was already added to this problem")]
    DuplicateVariable(String),

    #[error("domain is empty: {0}")]
    EmptyDomain(String),

    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    #[error("constraint {name:?} references unknown variable {variable:?}")]
    InvalidConstraint { name: String, variable: String },

    #[error("failed to parse constraint expression {0:?}: {1}")]
    ParseFailure(String, String),

    #[error("{0} does not support this operation")]
    NotImplementedForSolver(&'static str),

    #[error("solver produced {count} duplicate solutions out of {constraints} constraints: {duplicates:?}")]
    DuplicateSolutions {
        duplicates: Vec<String>,
        count: usize,
        constraints: usize,
    },
}

impl CspError {
    pub fn invalid_constraint(name: impl Into<String>, variable: impl fmt::Debug) -> Self {
        CspError::InvalidConstraint {
            name: name.into(),
            variable: format!("{variable:?}"),
        }
    }
}

pub type CspResult<T> = Result<T, CspError>;
