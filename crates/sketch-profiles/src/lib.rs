pub mod profiles;
pub mod solver;
pub mod split;
pub mod types;

pub use profiles::{build_profiles, build_profiles_with, build_wires_with};
pub use solver::{apply_solution, solve_sketch, ConstraintSolver, SolveError};
pub use types::*;
