use crate::lp::*;
use crate::{Comparison, ObjectiveType, Solution, SolverOptions, SolverSettings};
use tracing::debug;

/// LP Problem instance over non-negative variables.
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Number of variables.
    pub(crate) n_vars: usize,
    /// Constraints as `(coefficients, comparison, rhs)`.
    pub(crate) constraints: Vec<(Vec<f64>, Comparison, f64)>,
    /// Objective coefficients.
    pub(crate) objective: Vec<f64>,
    /// Objective type.
    pub(crate) objective_type: ObjectiveType,
}

impl LpProblem {
    /// Creates a problem with `n_vars` variables and a zero objective.
    pub fn new(n_vars: usize, objective_type: ObjectiveType) -> Self {
        Self {
            n_vars,
            constraints: vec![],
            objective: vec![0.; n_vars],
            objective_type,
        }
    }

    /// Sets the objective coefficients; missing trailing coefficients are zero.
    pub fn set_objective(&mut self, mut objective: Vec<f64>) {
        objective.resize(self.n_vars, 0.);
        self.objective = objective;
    }

    /// Appends the constraint `coefficients . x  comparison  rhs`.
    pub fn add_constraint(&mut self, mut coefficients: Vec<f64>, comparison: Comparison, rhs: f64) {
        coefficients.resize(self.n_vars, 0.);
        self.constraints.push((coefficients, comparison, rhs));
    }

    /// Number of variables.
    pub fn n_vars(&self) -> usize {
        self.n_vars
    }

    /// Number of constraints.
    pub fn n_constraints(&self) -> usize {
        self.constraints.len()
    }
}

/// Linear Programming Solver.
#[derive(Debug, Clone)]
pub struct Solver {
    problem: LpProblem,
    options: SolverOptions,
    pivots: usize,
}

impl Solver {
    /// Creates a new Solver instance.
    pub fn new(problem: LpProblem) -> Self {
        Solver {
            problem,
            options: SolverOptions::default(),
            pivots: 0,
        }
    }

    /// Enable a setting.
    pub fn setting(&mut self, setting: SolverSettings) {
        match setting {
            SolverSettings::EnableDataParallelism => self.options.parallel = true,
            SolverSettings::Tolerance(tolerance) => self.options.tolerance = tolerance,
            SolverSettings::MaxPivots(max_pivots) => self.options.max_pivots = max_pivots,
        }
    }

    /// Solves the LP.
    ///
    /// Uses the two-phase simplex method; minimization is solved as maximization of the
    /// negated objective.
    ///
    /// Returns [a solution](enum.Solution.html).
    pub fn solve(&mut self) -> Solution {
        let negate_objective = self.problem.objective_type == ObjectiveType::Min;
        let objective = if negate_objective {
            self.problem.objective.iter().map(|v| -v).collect()
        } else {
            self.problem.objective.clone()
        };
        let mut lp = LP::new(self.problem.n_vars, objective, &self.problem.constraints);
        let solution = lp.solve(&self.options);
        self.pivots = lp.pivots;
        debug!(
            "simplex finished after {} pivots on {} variables and {} constraints",
            self.pivots,
            self.problem.n_vars,
            self.problem.constraints.len()
        );
        match solution {
            Solution::Optimal(opt, model) if negate_objective => Solution::Optimal(-opt, model),
            solution => solution,
        }
    }

    /// Number of pivots performed by the last call to [`Solver::solve`].
    pub fn pivots(&self) -> usize {
        self.pivots
    }
}

impl From<LpProblem> for Solver {
    fn from(lp_problem: LpProblem) -> Self {
        Solver::new(lp_problem)
    }
}
