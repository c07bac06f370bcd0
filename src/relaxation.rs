//! LP Relaxation Oracle
//!
//! Solves the continuous relaxation of a [`Model`]: integer flags are ignored and every variable is
//! continuous and non-negative. The default oracle is the simplex method of the `slp` crate.
//!

use crate::error::*;
use crate::model::*;
use crate::util::*;
use slp::{Comparison, LpProblem, ObjectiveType, SolverSettings};
use std::collections::BTreeMap;
use tracing::trace;

pub trait RelaxationOracle {
    /// solve the relaxation of `model`, synchronously and deterministically
    fn solve_relaxation(&self, model: &Model) -> SolverResult<Solution>;
}

impl<O: RelaxationOracle + ?Sized> RelaxationOracle for &O {
    fn solve_relaxation(&self, model: &Model) -> SolverResult<Solution> {
        (**self).solve_relaxation(model)
    }
}

#[derive(Debug, Clone)]
pub struct SimplexOracle {
    /// eliminate tableau rows in parallel
    pub parallel: bool,
    pub tolerance: f64,
    pub max_pivots: usize,
}

impl Default for SimplexOracle {
    fn default() -> Self {
        Self {
            parallel: false,
            tolerance: slp::DEFAULT_TOLERANCE,
            max_pivots: slp::DEFAULT_MAX_PIVOTS,
        }
    }
}

impl SimplexOracle {
    pub fn new(parallel: bool, tolerance: f64, max_pivots: usize) -> Self {
        Self {
            parallel,
            tolerance,
            max_pivots,
        }
    }

    /// column `i` of the LP is `model.variables()[i]`
    pub fn lp_problem(model: &Model) -> LpProblem {
        let variables = model.variables();
        let dense = |expression: &crate::expression::LinearExpression| -> Vec<f64> {
            variables
                .iter()
                .map(|variable| expression.coefficient(&variable.name).unwrap_or(0.))
                .collect()
        };
        let objective_type = match model.sense() {
            Sense::Max => ObjectiveType::Max,
            Sense::Min => ObjectiveType::Min,
        };
        let mut problem = LpProblem::new(variables.len(), objective_type);
        problem.set_objective(dense(model.objective()));
        for constraint in model.constraints().iter() {
            let comparison = match constraint.operator {
                Operator::LessEqual => Comparison::LtEq,
                Operator::GreaterEqual => Comparison::GtEq,
                Operator::Equal => Comparison::Eq,
            };
            problem.add_constraint(dense(&constraint.lhs), comparison, constraint.rhs);
        }
        problem
    }
}

impl RelaxationOracle for SimplexOracle {
    fn solve_relaxation(&self, model: &Model) -> SolverResult<Solution> {
        let mut solver = slp::Solver::new(Self::lp_problem(model));
        if self.parallel {
            solver.setting(SolverSettings::EnableDataParallelism);
        }
        solver.setting(SolverSettings::Tolerance(self.tolerance));
        solver.setting(SolverSettings::MaxPivots(self.max_pivots));
        let solution = match solver.solve() {
            slp::Solution::Infeasible => Solution::infeasible(),
            slp::Solution::Unbounded => Solution::unbounded(model.sense()),
            slp::Solution::Optimal(result, assignment) => {
                let values: BTreeMap<String, f64> = model
                    .variables()
                    .iter()
                    .zip(assignment)
                    .map(|(variable, value)| (variable.name.clone(), value))
                    .collect();
                Solution::optimal(result, values)
            }
            slp::Solution::IterationLimit => {
                return Err(SolverError::Oracle(format!(
                    "simplex stopped after the pivot limit of {}",
                    self.max_pivots
                )))
            }
        };
        trace!(
            "relaxation with {} constraints: {:?} after {} pivots",
            model.constraints().len(),
            solution.status,
            solver.pivots()
        );
        Ok(solution.with_iterations(solver.pivots()))
    }
}
