//! The small numeric abstraction shared by every arithmetic constraint.
//!
//! Grounded on the teacher's `constraint::common::sum`, which bounded its
//! factory function with `T: Into<i32>`. That bound only ever let the
//! teacher's demos sum small integers; this crate's Sum/Product/
//! VariableLinked constraints need both integer and floating-point
//! domains, so the bound is generalised into a trait instead of widened
//! into a single concrete type.

use std::fmt::Debug;
use std::ops::{Add, Mul};

/// A domain value usable with the numeric constraint family
/// (`{Min,Max,Exact}{Sum,Prod}`, `VariableLinked*`).
///
/// AllDifferent, AllEqual, the predicate constraint and the set
/// constraints only need `Eq`/`Clone`/`Debug` and are not bound by this
/// trait; it exists purely for the constraints that add or multiply
/// domain values together.
pub trait Numeric: Copy + PartialOrd + PartialEq + Add<Output = Self> + Mul<Output = Self> + Debug + 'static {
    fn zero() -> Self;
    fn one() -> Self;

    /// Round to 10 fractional digits, matching the float comparison
    /// contract used throughout the sum/product constraints. A no-op for
    /// exact integer types.
    fn round10(self) -> Self;

    fn is_negative(self) -> bool {
        self < Self::zero()
    }

    fn is_less_than_one(self) -> bool {
        self < Self::one()
    }

    /// Used only by the string constraint parser (SPEC_FULL.md §6),
    /// which evaluates arithmetic over `f64` internally regardless of
    /// the problem's concrete domain type and converts at the edges.
    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
}

impl Numeric for i64 {
    fn zero() -> Self {
        0
    }
    fn one() -> Self {
        1
    }
    fn round10(self) -> Self {
        self
    }
    fn to_f64(self) -> f64 {
        self as f64
    }
    fn from_f64(value: f64) -> Self {
        value.round() as i64
    }
}

impl Numeric for f64 {
    fn zero() -> Self {
        0.0
    }
    fn one() -> Self {
        1.0
    }
    fn round10(self) -> Self {
        (self * 1e10).round() / 1e10
    }
    fn to_f64(self) -> f64 {
        self
    }
    fn from_f64(value: f64) -> Self {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // spec.md §4.B numeric edge cases: "float sums and products are
    // rounded to 10 fractional digits before comparison to avoid
    // accumulation artefacts."
    #[test]
    fn round10_absorbs_float_accumulation_noise() {
        let total = 0.1_f64 + 0.2_f64;
        assert_ne!(total, 0.3_f64);
        assert_eq!(total.round10(), 0.3_f64.round10());
    }

    #[test]
    fn round10_is_a_no_op_for_integers() {
        assert_eq!(7i64.round10(), 7i64);
    }

    #[test]
    fn is_negative_and_is_less_than_one() {
        assert!((-1i64).is_negative());
        assert!(!0i64.is_negative());
        assert!(0i64.is_less_than_one());
        assert!(!1i64.is_less_than_one());
    }
}
