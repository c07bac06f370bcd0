//! Solution Finalizer
//!
//! Packages the outcome of a branch-and-bound search into the [`Solution`] handed to the caller.
//!

use crate::branch_and_bound::*;
use crate::model::*;
use crate::util::*;

pub const NO_FEASIBLE_INTEGER_SOLUTION: &str = "No feasible integer solution found";
pub const SEARCH_LIMIT_WITHOUT_SOLUTION: &str = "Search limit reached before a feasible integer solution was found";

/// round the integer variables of `best` and attach the search counters
pub fn finalize(best: Option<Solution>, model: &Model, stats: &SearchStats) -> Solution {
    let mut solution = match best {
        Some(solution) => solution,
        None if stats.limit_reached => {
            Solution::failure(SolveStatus::SearchLimitReached, SEARCH_LIMIT_WITHOUT_SOLUTION)
        }
        None => Solution::failure(SolveStatus::Infeasible, NO_FEASIBLE_INTEGER_SOLUTION),
    };
    for name in model.integer_variables() {
        if let Some(value) = solution.values.get_mut(name) {
            *value = value.round();
        }
    }
    if solution.feasible && stats.limit_reached {
        solution.status = SolveStatus::SearchLimitReached;
    }
    solution.iterations = Some(stats.iterations);
    solution.nodes = Some(stats.nodes);
    solution
}
