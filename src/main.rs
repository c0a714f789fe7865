//! Demonstration binary: solves the three worked problems in
//! [`csp_solver::demo`] and prints what it found. Not the library's
//! public surface; see `src/lib.rs` for that.

use csp_solver::demo;

fn main() {
    let mut australia = demo::australia_map_coloring();
    australia.compile().unwrap();
    println!("Australia map coloring:");
    match australia.get_solution().unwrap() {
        Some(assignment) => println!("  {assignment}"),
        None => println!("  no solution found"),
    }

    let mut queens = demo::n_queens(8);
    queens.compile().unwrap();
    println!("8-Queens:");
    match queens.get_solution().unwrap() {
        Some(assignment) => println!("  {assignment}"),
        None => println!("  no solution found"),
    }

    let mut sudoku = demo::sudoku_4x4();
    sudoku.compile().unwrap();
    println!("4x4 Sudoku (empty board):");
    match sudoku.get_solution().unwrap() {
        Some(assignment) => println!("  {assignment}"),
        None => println!("  no solution found"),
    }
}
