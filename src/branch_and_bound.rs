//! Branch-and-Bound Engine
//!
//! Depth-first search over relaxations. Every node relaxes its model, prunes on infeasibility or on a
//! bound that cannot beat the incumbent, and otherwise splits on the first fractional integer variable.
//! The incumbent travels down as an immutable reference and comes back up as a return value.
//!

use crate::error::*;
use crate::expression::*;
use crate::model::*;
use crate::relaxation::*;
use crate::util::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// counters of one search, exported as the profiler report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// relaxations solved
    pub nodes: usize,
    pub pruned_infeasible: usize,
    pub pruned_bound: usize,
    pub integral_leaves: usize,
    pub branchings: usize,
    pub max_depth_reached: usize,
    /// simplex pivots summed over every relaxation
    pub iterations: usize,
    /// a depth or node limit cut off part of the tree
    pub limit_reached: bool,
}

pub struct BranchAndBound<'a, O: RelaxationOracle + ?Sized> {
    oracle: &'a O,
    pub max_depth: usize,
    pub max_nodes: Option<usize>,
    pub stats: SearchStats,
}

impl<'a, O: RelaxationOracle + ?Sized> BranchAndBound<'a, O> {
    pub fn new(oracle: &'a O, max_depth: usize, max_nodes: Option<usize>) -> Self {
        Self {
            oracle,
            max_depth,
            max_nodes,
            stats: SearchStats::default(),
        }
    }

    /// the best solution of `root` with every integer variable integral, or `None` when there is none
    pub fn search(&mut self, root: &Model) -> SolverResult<Option<Solution>> {
        self.stats = SearchStats::default();
        let best = self.search_node(root, 0, None)?;
        debug!(
            "branch-and-bound explored {} nodes ({} branchings, {} pruned infeasible, {} pruned by bound, {} integral leaves, depth {}, {} pivots)",
            self.stats.nodes,
            self.stats.branchings,
            self.stats.pruned_infeasible,
            self.stats.pruned_bound,
            self.stats.integral_leaves,
            self.stats.max_depth_reached,
            self.stats.iterations
        );
        if self.stats.limit_reached {
            debug!("search limit reached, the result is the best incumbent found so far");
        }
        Ok(best)
    }

    /// returns a solution of the subtree strictly better than `incumbent`, if one exists
    fn search_node(&mut self, model: &Model, depth: usize, incumbent: Option<&Solution>) -> SolverResult<Option<Solution>> {
        if depth > self.max_depth || self.max_nodes.map_or(false, |max_nodes| self.stats.nodes >= max_nodes) {
            self.stats.limit_reached = true;
            return Ok(None);
        }
        self.stats.nodes += 1;
        self.stats.max_depth_reached = self.stats.max_depth_reached.max(depth);
        let relaxation = self.oracle.solve_relaxation(model)?;
        self.stats.iterations += relaxation.iterations.unwrap_or(0);
        if !relaxation.feasible {
            trace!("depth {depth}: infeasible, pruned");
            self.stats.pruned_infeasible += 1;
            return Ok(None);
        }
        if let Some(incumbent) = incumbent {
            if !model.sense().improves(relaxation.result, incumbent.result) {
                trace!(
                    "depth {depth}: bound {} does not improve on {}, pruned",
                    relaxation.result,
                    incumbent.result
                );
                self.stats.pruned_bound += 1;
                return Ok(None);
            }
        }
        if !relaxation.is_bounded() {
            trace!("depth {depth}: unbounded, stop branching");
            return Ok(Some(relaxation));
        }
        let tolerance = model.tolerance();
        let fractional = model.integer_variables().find_map(|name| {
            let value = relaxation.value(name);
            ((value.round() - value).abs() > tolerance).then(|| (name.to_string(), value))
        });
        let Some((variable, value)) = fractional else {
            trace!("depth {depth}: integral candidate {}", relaxation.result);
            self.stats.integral_leaves += 1;
            return Ok(Some(relaxation));
        };
        trace!("depth {depth}: branch on {variable} = {value}");
        self.stats.branchings += 1;
        let lower_model = model.with_constraint(Constraint::new(
            &format!("b{depth}l"),
            LinearExpression::single(variable.as_str(), 1.),
            Operator::LessEqual,
            value.floor(),
        ));
        let lower = self.search_node(&lower_model, depth + 1, incumbent)?;
        let upper_model = model.with_constraint(Constraint::new(
            &format!("b{depth}u"),
            LinearExpression::single(variable.as_str(), 1.),
            Operator::GreaterEqual,
            value.ceil(),
        ));
        let upper = self.search_node(&upper_model, depth + 1, lower.as_ref().or(incumbent))?;
        Ok(better(model.sense(), lower, upper))
    }
}

/// the better of two optional candidates; ties keep `first`
pub fn better(sense: Sense, first: Option<Solution>, second: Option<Solution>) -> Option<Solution> {
    match (first, second) {
        (Some(first), Some(second)) => {
            if sense.improves(second.result, first.result) {
                Some(second)
            } else {
                Some(first)
            }
        }
        (first, None) => first,
        (None, second) => second,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relaxation::tests::FixedOracle;
    use maplit::btreemap;
    use more_asserts::*;
    use std::cell::RefCell;
    use test_case::test_case;

    /// simplex oracle that remembers the key of the last constraint of every model it solves
    #[derive(Default)]
    struct RecordingOracle {
        inner: SimplexOracle,
        keys: RefCell<Vec<String>>,
    }

    impl RelaxationOracle for RecordingOracle {
        fn solve_relaxation(&self, model: &Model) -> SolverResult<Solution> {
            let key = model.constraints().last().map(|c| c.key.clone()).unwrap_or_default();
            self.keys.borrow_mut().push(key);
            self.inner.solve_relaxation(model)
        }
    }

    fn knapsack() -> Model {
        build_model(
            "5x1 + 4x2",
            Sense::Max,
            &[
                ConstraintInput::new("1", "6x1 + 4x2", "<=", "24"),
                ConstraintInput::new("2", "x1 + 2x2", "<=", "6"),
            ],
            &[VariableDeclaration::integer("x1"), VariableDeclaration::integer("x2")],
        )
        .unwrap()
    }

    #[test]
    fn branch_and_bound_knapsack() {
        // cargo test branch_and_bound_knapsack -- --nocapture
        let model = knapsack();
        let oracle = SimplexOracle::default();
        let mut engine = BranchAndBound::new(&oracle, 1000, None);
        let best = engine.search(&model).unwrap().unwrap();
        assert!((best.result - 20.).abs() < 1e-9);
        assert!((best.value("x1") - 4.).abs() < 1e-9);
        assert!(best.value("x2").abs() < 1e-9);
        assert_eq!(engine.stats.nodes, 5);
        assert_eq!(engine.stats.branchings, 2);
        assert_eq!(engine.stats.integral_leaves, 2);
        assert_eq!(engine.stats.pruned_bound, 1);
        assert_eq!(engine.stats.max_depth_reached, 2);
        assert!(!engine.stats.limit_reached);
        assert_gt!(engine.stats.iterations, 0);
    }

    #[test]
    fn branch_and_bound_visits_lower_child_first() {
        let model = knapsack();
        let oracle = RecordingOracle::default();
        BranchAndBound::new(&oracle, 1000, None).search(&model).unwrap();
        assert_eq!(*oracle.keys.borrow(), vec!["c2", "cb0l", "cb1l", "cb1u", "cb0u"]);
    }

    #[test]
    fn branch_and_bound_never_beats_root_relaxation() {
        let oracle = SimplexOracle::default();
        let model = knapsack();
        let root = oracle.solve_relaxation(&model).unwrap();
        let best = BranchAndBound::new(&oracle, 1000, None).search(&model).unwrap().unwrap();
        assert_le!(best.result, root.result + 1e-9);
    }

    #[test]
    fn branch_and_bound_minimize() {
        let model = build_model(
            "x",
            Sense::Min,
            &[ConstraintInput::new("1", "2x", ">=", "3")],
            &[VariableDeclaration::integer("x")],
        )
        .unwrap();
        let oracle = SimplexOracle::default();
        let mut engine = BranchAndBound::new(&oracle, 1000, None);
        let best = engine.search(&model).unwrap().unwrap();
        assert!((best.value("x") - 2.).abs() < 1e-9);
        assert_eq!(engine.stats.nodes, 3);
        assert_eq!(engine.stats.pruned_infeasible, 1);
    }

    #[test]
    fn branch_and_bound_infeasible_integer_problem() {
        let model = build_model(
            "x",
            Sense::Max,
            &[
                ConstraintInput::new("1", "2x", ">=", "1"),
                ConstraintInput::new("2", "2x", "<=", "1.5"),
            ],
            &[VariableDeclaration::integer("x")],
        )
        .unwrap();
        let oracle = SimplexOracle::default();
        let mut engine = BranchAndBound::new(&oracle, 1000, None);
        assert_eq!(engine.search(&model).unwrap(), None);
        assert_eq!(engine.stats.pruned_infeasible, 2);
    }

    #[test]
    fn branch_and_bound_unbounded_stops_branching() {
        let model = build_model(
            "x1 + x2",
            Sense::Max,
            &[ConstraintInput::new("1", "x1", "<=", "2.5")],
            &[VariableDeclaration::integer("x1")],
        )
        .unwrap();
        let oracle = SimplexOracle::default();
        let mut engine = BranchAndBound::new(&oracle, 1000, None);
        let best = engine.search(&model).unwrap().unwrap();
        assert_eq!(best.bounded, Some(false));
        assert_eq!(best.result, f64::INFINITY);
        assert_eq!(engine.stats.nodes, 1);
        assert_eq!(engine.stats.branchings, 0);
    }

    #[test_case(Some(1), 1000, None; "node limit at root")]
    #[test_case(None, 0, None; "depth limit at root")]
    #[test_case(Some(3), 1000, Some(19.); "node limit after first leaf")]
    fn branch_and_bound_limits(max_nodes: Option<usize>, max_depth: usize, expected: Option<f64>) {
        let model = knapsack();
        let oracle = SimplexOracle::default();
        let mut engine = BranchAndBound::new(&oracle, max_depth, max_nodes);
        let best = engine.search(&model).unwrap();
        assert_eq!(best.as_ref().map(|best| best.result.round()), expected);
        assert!(engine.stats.limit_reached);
    }

    #[test]
    fn branch_and_bound_oracle_is_substitutable() {
        let model = knapsack();
        let fixed = Solution::optimal(13., btreemap! {"x1".to_string() => 1., "x2".to_string() => 2.});
        let oracle = FixedOracle(fixed.clone());
        let mut engine = BranchAndBound::new(&oracle as &dyn RelaxationOracle, 1000, None);
        assert_eq!(engine.search(&model).unwrap(), Some(fixed));
        assert_eq!(engine.stats.nodes, 1);
    }

    #[test]
    fn branch_and_bound_oracle_error_propagates() {
        let model = knapsack();
        let oracle = SimplexOracle::new(false, slp::DEFAULT_TOLERANCE, 0);
        let result = BranchAndBound::new(&oracle, 1000, None).search(&model);
        assert!(matches!(result, Err(SolverError::Oracle(_))));
    }

    #[test]
    fn branch_and_bound_better() {
        let low = Solution::optimal(1., btreemap! {});
        let high = Solution::optimal(2., btreemap! {});
        assert_eq!(better(Sense::Max, Some(low.clone()), Some(high.clone())), Some(high.clone()));
        assert_eq!(better(Sense::Min, Some(low.clone()), Some(high.clone())), Some(low.clone()));
        assert_eq!(better(Sense::Max, None, Some(low.clone())), Some(low.clone()));
        assert_eq!(better(Sense::Max, Some(high.clone()), None), Some(high));
        assert_eq!(better(Sense::Max, None, None), None);
        let tie = Solution::optimal(1., btreemap! {"x".to_string() => 1.});
        assert_eq!(better(Sense::Max, Some(low.clone()), Some(tie)), Some(low));
    }
}
