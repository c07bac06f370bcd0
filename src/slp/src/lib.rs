//! `slp` is a Linear Programming Solver.
//!
//! It solves continuous linear programs over non-negative variables with `<=`, `>=` and `=`
//! constraints using the two-phase tableau simplex method with Bland's rule.
//!
//! ## An example
//!
//! ```rust
//! use slp::*;
//!
//! // max 2x1 + 3x2
//! // subject to 2x1 + x2 <= 18, 6x1 + 5x2 <= 60, 2x1 + 5x2 <= 40
//! let mut problem = LpProblem::new(2, ObjectiveType::Max);
//! problem.set_objective(vec![2., 3.]);
//! problem.add_constraint(vec![2., 1.], Comparison::LtEq, 18.);
//! problem.add_constraint(vec![6., 5.], Comparison::LtEq, 60.);
//! problem.add_constraint(vec![2., 5.], Comparison::LtEq, 40.);
//! let mut solver = Solver::new(problem);
//! match solver.solve() {
//!     Solution::Optimal(obj, model) => {
//!         assert!((obj - 28.).abs() < 1e-9);
//!         assert!((model[0] - 5.).abs() < 1e-9);
//!         assert!((model[1] - 6.).abs() < 1e-9);
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

#![deny(missing_docs)]

mod common;
pub use common::*;
mod lp;

/// A General Linear Programming Solver.
mod solver;
pub use solver::*;
