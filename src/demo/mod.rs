//! Worked example problems used by `main.rs` (and exercised by the
//! integration tests). Not part of the published API — hidden from docs
//! at the crate root.
//!
//! Grounded on `examples/MVanderloo-constraint-solver/src/main.rs`'s
//! Australia map-coloring demo, carried over and adapted to this crate's
//! constraint/solver shape, plus two more classic benchmarks
//! (`original_source/constraint/constraints.py`'s docstrings use N-Queens
//! and Sudoku-style examples to motivate `AllDifferentConstraint`) picked
//! to exercise `AllDifferent` and a hand-written `Predicate` side by side.
//!
//! Every domain here is `i64`: the constraint catalogue requires a
//! `Numeric` value type, so map colors are encoded as small integers
//! (`0` = red, `1` = green, `2` = blue) instead of strings.

use crate::constraint::{AllDifferentConstraint, Constraint, PredicateConstraint};
use crate::domain::Domain;
use crate::problem::Problem;

/// The Australia map-coloring problem: seven regions, three colors, no
/// two bordering regions may share a color.
pub fn australia_map_coloring() -> Problem<String, i64> {
    let mut problem = Problem::new();
    let regions = [
        "Western Australia",
        "Northern Territory",
        "South Australia",
        "Queensland",
        "New South Wales",
        "Victoria",
        "Tasmania",
    ];
    for region in regions {
        problem
            .add_variable(region.to_string(), Domain::new([0, 1, 2]).unwrap())
            .unwrap();
    }

    let borders = [
        ("Western Australia", "Northern Territory"),
        ("Western Australia", "South Australia"),
        ("Northern Territory", "South Australia"),
        ("Northern Territory", "Queensland"),
        ("South Australia", "Queensland"),
        ("South Australia", "New South Wales"),
        ("South Australia", "Victoria"),
        ("Queensland", "New South Wales"),
        ("New South Wales", "Victoria"),
    ];
    // Tasmania is an island: no adjacency constraint touches it.
    for (a, b) in borders {
        problem
            .add_constraint(Constraint::AllDifferent(AllDifferentConstraint::new(
                format!("{a}-{b}"),
                vec![a.to_string(), b.to_string()],
            )))
            .unwrap();
    }
    problem
}

/// The N-Queens problem: one variable per row, its value is the column
/// the queen in that row occupies. No hand-rolled `AllDifferent` family
/// covers the diagonal rule, so each pair of rows gets its own predicate.
pub fn n_queens(n: i64) -> Problem<String, i64> {
    let mut problem = Problem::new();
    for row in 0..n {
        problem
            .add_variable(format!("q{row}"), Domain::new(0..n).unwrap())
            .unwrap();
    }
    for row_a in 0..n {
        for row_b in (row_a + 1)..n {
            let a = format!("q{row_a}");
            let b = format!("q{row_b}");
            let distance = row_b - row_a;
            let name = format!("{a}-{b}");
            problem
                .add_constraint(Constraint::Predicate(PredicateConstraint::new(
                    name,
                    vec![a, b],
                    move |args: &[Option<i64>]| match (args[0], args[1]) {
                        (Some(col_a), Some(col_b)) => col_a != col_b && (col_a - col_b).abs() != distance,
                        _ => true,
                    },
                )))
                .unwrap();
        }
    }
    problem
}

/// A 4x4 Sudoku: every row, column and 2x2 box must hold `1..=4` exactly
/// once. Returns the empty-board constraints; callers can pin cells by
/// shrinking individual domains to a single value before compiling.
pub fn sudoku_4x4() -> Problem<String, i64> {
    let mut problem = Problem::new();
    for row in 0..4 {
        for col in 0..4 {
            problem
                .add_variable(format!("r{row}c{col}"), Domain::new([1, 2, 3, 4]).unwrap())
                .unwrap();
        }
    }

    for row in 0..4 {
        let vars: Vec<String> = (0..4).map(|col| format!("r{row}c{col}")).collect();
        problem
            .add_constraint(Constraint::AllDifferent(AllDifferentConstraint::new(
                format!("row{row}"),
                vars,
            )))
            .unwrap();
    }
    for col in 0..4 {
        let vars: Vec<String> = (0..4).map(|row| format!("r{row}c{col}")).collect();
        problem
            .add_constraint(Constraint::AllDifferent(AllDifferentConstraint::new(
                format!("col{col}"),
                vars,
            )))
            .unwrap();
    }
    for box_row in 0..2 {
        for box_col in 0..2 {
            let vars: Vec<String> = (0..2)
                .flat_map(|r| (0..2).map(move |c| format!("r{}c{}", box_row * 2 + r, box_col * 2 + c)))
                .collect();
            problem
                .add_constraint(Constraint::AllDifferent(AllDifferentConstraint::new(
                    format!("box{box_row}{box_col}"),
                    vars,
                )))
                .unwrap();
        }
    }
    problem
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn australia_is_three_colorable() {
        let mut problem = australia_map_coloring();
        problem.compile().unwrap();
        assert!(problem.get_solution().unwrap().is_some());
    }

    #[test]
    fn four_queens_has_a_solution() {
        let mut problem = n_queens(4);
        problem.compile().unwrap();
        assert!(problem.get_solution().unwrap().is_some());
    }

    #[test]
    fn two_queens_has_no_solution() {
        let mut problem = n_queens(2);
        problem.compile().unwrap();
        assert!(problem.get_solution().unwrap().is_none());
    }

    #[test]
    fn empty_sudoku_board_is_solvable() {
        let mut problem = sudoku_4x4();
        problem.compile().unwrap();
        assert!(problem.get_solution().unwrap().is_some());
    }
}
