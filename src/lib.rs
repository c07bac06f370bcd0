//! Mixed-Integer Linear Programming Solver
//!
//! Maximizes or minimizes a linear objective over linear constraints on non-negative variables, some of which
//! may be restricted to integer values. Continuous relaxations are solved by the simplex method of the `slp`
//! crate; integrality is enforced by a depth-first branch-and-bound search.
//!
//! ```
//! use mipbb::mip_solver::solve;
//! use mipbb::util::*;
//!
//! let constraints = vec![
//!     ConstraintInput::new("1", "6x1 + 4x2", "<=", "24"),
//!     ConstraintInput::new("2", "x1 + 2x2", "<=", "6"),
//! ];
//! let variables = vec![VariableDeclaration::integer("x1"), VariableDeclaration::integer("x2")];
//! let solution = solve("5x1 + 4x2", Sense::Max, &constraints, &variables);
//! assert!(solution.feasible);
//! assert_eq!(solution.value("x1"), 4.);
//! assert_eq!(solution.value("x2"), 0.);
//! ```
//!

extern crate serde;
#[macro_use]
extern crate serde_json;
extern crate clap;
extern crate derivative;
extern crate itertools;
extern crate more_asserts;
extern crate pest;
#[macro_use]
extern crate pest_derive;
#[cfg(feature = "cli")]
extern crate prettytable;
extern crate slp;
extern crate thiserror;
extern crate tracing;

pub mod branch_and_bound;
#[cfg(feature = "cli")]
pub mod cli;
pub mod error;
pub mod expression;
pub mod finalizer;
pub mod mip_solver;
pub mod model;
pub mod relaxation;
pub mod util;
