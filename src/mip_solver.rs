//! Mixed-Integer Linear Programming Solver
//!
//! Wires the pipeline together: expression parsing and model building, then either a single relaxation
//! (no integer variable) or a branch-and-bound search followed by the finalizer.
//! Failures never escape [`MipSolver::solve`]; they come back as an infeasible [`Solution`] with an error message.
//!

use crate::branch_and_bound::*;
use crate::error::*;
use crate::expression::*;
use crate::finalizer::*;
use crate::model::*;
use crate::relaxation::*;
use crate::util::*;
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MipSolverConfig {
    /// branching depth beyond which nodes are not explored
    #[serde(default = "mip_default_configs::max_depth")]
    pub max_depth: usize,
    /// maximum number of relaxations in one search, unlimited when `null`
    #[serde(default = "mip_default_configs::max_nodes")]
    pub max_nodes: Option<usize>,
    #[serde(default = "mip_default_configs::repeated_terms")]
    pub repeated_terms: RepeatedTerms,
    /// parallel row elimination inside the simplex method
    #[serde(default = "mip_default_configs::parallel")]
    pub parallel: bool,
    #[serde(default = "mip_default_configs::pivot_tolerance")]
    pub pivot_tolerance: f64,
    #[serde(default = "mip_default_configs::max_pivots")]
    pub max_pivots: usize,
}

pub mod mip_default_configs {
    use crate::expression::RepeatedTerms;

    /// every level appends one row to the relaxations below it
    pub fn max_depth() -> usize {
        100
    }
    pub fn max_nodes() -> Option<usize> {
        Some(10_000)
    }
    pub fn repeated_terms() -> RepeatedTerms {
        RepeatedTerms::Overwrite
    }
    pub fn parallel() -> bool {
        false
    }
    pub fn pivot_tolerance() -> f64 {
        slp::DEFAULT_TOLERANCE
    }
    pub fn max_pivots() -> usize {
        slp::DEFAULT_MAX_PIVOTS
    }
}

impl Default for MipSolverConfig {
    fn default() -> Self {
        Self {
            max_depth: mip_default_configs::max_depth(),
            max_nodes: mip_default_configs::max_nodes(),
            repeated_terms: mip_default_configs::repeated_terms(),
            parallel: mip_default_configs::parallel(),
            pivot_tolerance: mip_default_configs::pivot_tolerance(),
            max_pivots: mip_default_configs::max_pivots(),
        }
    }
}

#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct MipSolver<O: RelaxationOracle = SimplexOracle> {
    pub config: MipSolverConfig,
    #[derivative(Debug = "ignore")]
    oracle: O,
    builder: ModelBuilder,
    /// counters of the last solve call
    stats: SearchStats,
}

impl MipSolver<SimplexOracle> {
    /// `config` is a JSON object of [`MipSolverConfig`] fields, missing fields take their defaults
    pub fn new(config: serde_json::Value) -> SolverResult<Self> {
        let config: MipSolverConfig = serde_json::from_value(config)?;
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: MipSolverConfig) -> Self {
        let oracle = SimplexOracle::new(config.parallel, config.pivot_tolerance, config.max_pivots);
        Self::with_oracle_config(oracle, config)
    }
}

impl Default for MipSolver<SimplexOracle> {
    fn default() -> Self {
        Self::from_config(MipSolverConfig::default())
    }
}

impl<O: RelaxationOracle> MipSolver<O> {
    /// solve relaxations with `oracle`; the simplex-related config fields are ignored
    pub fn with_oracle(oracle: O, config: serde_json::Value) -> SolverResult<Self> {
        let config: MipSolverConfig = serde_json::from_value(config)?;
        Ok(Self::with_oracle_config(oracle, config))
    }

    fn with_oracle_config(oracle: O, config: MipSolverConfig) -> Self {
        Self {
            builder: ModelBuilder::new(ExpressionParser::new(config.repeated_terms)),
            config,
            oracle,
            stats: SearchStats::default(),
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn build_model(
        &self,
        objective: &str,
        sense: Sense,
        constraints: &[ConstraintInput],
        variables: &[VariableDeclaration],
    ) -> SolverResult<Model> {
        self.builder.build(objective, sense, constraints, variables)
    }

    /// never panics and never returns an error: failures are reported in [`Solution::error`]
    pub fn solve(
        &mut self,
        objective: &str,
        sense: Sense,
        constraints: &[ConstraintInput],
        variables: &[VariableDeclaration],
    ) -> Solution {
        match self.try_solve(objective, sense, constraints, variables) {
            Ok(solution) => solution,
            Err(error) => {
                debug!("solve failed: {error}");
                Solution::failure(SolveStatus::Error, format!("Error solving the problem: {error}"))
            }
        }
    }

    pub fn try_solve(
        &mut self,
        objective: &str,
        sense: Sense,
        constraints: &[ConstraintInput],
        variables: &[VariableDeclaration],
    ) -> SolverResult<Solution> {
        self.stats = SearchStats::default();
        let model = self.build_model(objective, sense, constraints, variables)?;
        info!(
            "{sense} {} subject to {} constraints over {} variables ({} integer)",
            model.objective(),
            model.constraints().len(),
            model.variables().len(),
            model.integer_variables().count()
        );
        if !model.has_integer_variables() {
            let relaxation = self.oracle.solve_relaxation(&model)?;
            self.stats.nodes = 1;
            self.stats.iterations = relaxation.iterations.unwrap_or(0);
            debug!("pure linear program, relaxation is final: {:?}", relaxation.status);
            return Ok(relaxation);
        }
        let mut engine = BranchAndBound::new(&self.oracle, self.config.max_depth, self.config.max_nodes);
        let best = engine.search(&model)?;
        self.stats = engine.stats;
        let solution = finalize(best, &model, &self.stats);
        debug!("{:?} with objective {}", solution.status, solution.result);
        Ok(solution)
    }

    pub fn solve_problem(&mut self, problem: &ProblemInput) -> Solution {
        self.solve(&problem.objective, problem.sense, &problem.constraints, &problem.variables)
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn generate_profiler_report(&self) -> serde_json::Value {
        json!({
            "config": self.config,
            "search": self.stats,
        })
    }
}

/// solve with the default configuration and the simplex oracle
pub fn solve(objective: &str, sense: Sense, constraints: &[ConstraintInput], variables: &[VariableDeclaration]) -> Solution {
    MipSolver::default().solve(objective, sense, constraints, variables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::scenario_constraints;
    use crate::relaxation::tests::FixedOracle;
    use maplit::btreemap;

    #[test]
    fn mip_solver_config_defaults() {
        // cargo test mip_solver_config_defaults -- --nocapture
        let solver = MipSolver::new(json!({})).unwrap();
        assert_eq!(solver.config, MipSolverConfig::default());
        assert_eq!(solver.config.max_depth, 100);
        assert_eq!(solver.config.max_nodes, Some(10_000));
        assert_eq!(solver.config.repeated_terms, RepeatedTerms::Overwrite);
        assert_eq!(solver.oracle().max_pivots, 50_000);
        let solver = MipSolver::new(json!({ "max_nodes": 10, "repeated_terms": "sum", "parallel": true })).unwrap();
        assert_eq!(solver.config.max_nodes, Some(10));
        assert_eq!(solver.config.repeated_terms, RepeatedTerms::Sum);
        assert!(solver.oracle().parallel);
        let solver = MipSolver::new(json!({ "max_nodes": null })).unwrap();
        assert_eq!(solver.config.max_nodes, None);
    }

    #[test]
    fn mip_solver_config_rejects_unknown_fields() {
        assert!(matches!(MipSolver::new(json!({ "depth": 3 })), Err(SolverError::Json(_))));
        assert!(matches!(MipSolver::new(json!({ "max_depth": "deep" })), Err(SolverError::Json(_))));
    }

    #[test]
    fn mip_solver_parse_error_becomes_solution() {
        let solution = solve("12 + 4", Sense::Max, &[], &[]);
        assert!(!solution.feasible);
        assert_eq!(solution.result, 0.);
        assert_eq!(solution.status, SolveStatus::Error);
        let error = solution.error.unwrap();
        assert!(error.starts_with("Error solving the problem: invalid expression format"), "{error}");
    }

    #[test]
    fn mip_solver_duplicate_ids_become_solution() {
        let constraints = vec![
            ConstraintInput::new("1", "x1", "<=", "3"),
            ConstraintInput::new("1", "x1", "<=", "4"),
        ];
        let solution = solve("x1", Sense::Max, &constraints, &[]);
        assert_eq!(
            solution.error.as_deref(),
            Some("Error solving the problem: duplicate constraint id `1`")
        );
    }

    #[test]
    fn mip_solver_pure_lp_is_the_relaxation() {
        let mut solver = MipSolver::default();
        let solution = solver.solve("3x1 + 4x2", Sense::Max, &scenario_constraints(), &[]);
        let model = solver.build_model("3x1 + 4x2", Sense::Max, &scenario_constraints(), &[]).unwrap();
        let relaxation = solver.oracle().solve_relaxation(&model).unwrap();
        assert_eq!(solution, relaxation);
        assert_eq!(solution.nodes, None);
        assert_eq!(solver.stats().nodes, 1);
    }

    #[test]
    fn mip_solver_repeated_terms_flag() {
        let constraints = vec![ConstraintInput::new("1", "x1", "<=", "1")];
        let overwrite = solve("x1 + x1", Sense::Max, &constraints, &[]);
        assert!((overwrite.result - 1.).abs() < 1e-9);
        let mut solver = MipSolver::new(json!({ "repeated_terms": "sum" })).unwrap();
        let sum = solver.solve("x1 + x1", Sense::Max, &constraints, &[]);
        assert!((sum.result - 2.).abs() < 1e-9);
    }

    #[test]
    fn mip_solver_custom_oracle() {
        let fixed = Solution::optimal(7., btreemap! {"x".to_string() => 2., "y".to_string() => 1.5});
        let mut solver = MipSolver::with_oracle(FixedOracle(fixed), json!({})).unwrap();
        let solution = solver.solve("2x + 2y", Sense::Max, &[], &[VariableDeclaration::integer("x")]);
        assert_eq!(solution.result, 7.);
        assert_eq!(solution.value("y"), 1.5);
        assert_eq!(solution.nodes, Some(1));
    }

    #[test]
    fn mip_solver_search_limit() {
        let constraints = vec![
            ConstraintInput::new("1", "6x1 + 4x2", "<=", "24"),
            ConstraintInput::new("2", "x1 + 2x2", "<=", "6"),
        ];
        let variables = vec![VariableDeclaration::integer("x1"), VariableDeclaration::integer("x2")];
        let mut solver = MipSolver::new(json!({ "max_nodes": 1 })).unwrap();
        let solution = solver.solve("5x1 + 4x2", Sense::Max, &constraints, &variables);
        assert!(!solution.feasible);
        assert_eq!(solution.status, SolveStatus::SearchLimitReached);
        assert_eq!(solution.error.as_deref(), Some(SEARCH_LIMIT_WITHOUT_SOLUTION));
        let report = solver.generate_profiler_report();
        assert_eq!(report["search"]["nodes"], json!(1));
        assert_eq!(report["search"]["limit_reached"], json!(true));
        assert_eq!(report["config"]["max_nodes"], json!(1));
    }

    #[test]
    fn mip_solver_solve_problem() {
        let problem: ProblemInput = serde_json::from_value(json!({
            "objective": "x",
            "sense": "min",
            "constraints": [{ "id": "1", "lhs": "2x", "operator": ">=", "rhs": "3" }],
            "variables": [{ "name": "x", "isInteger": true }],
        }))
        .unwrap();
        let solution = MipSolver::default().solve_problem(&problem);
        assert_eq!(solution.value("x"), 2.);
        assert!((solution.result - 2.).abs() < 1e-9);
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.nodes, Some(3));
    }
}
