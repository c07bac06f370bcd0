use crate::{Comparison, Solution, SolverOptions};
use rayon::prelude::*;
use tracing::trace;

/// Represents an LP instance in tableau form.
///
/// Row 0 holds the reduced costs of a maximization problem and column 0 holds the
/// right-hand side, so `tableau[0][0]` is the current objective value.
#[derive(Debug, Clone)]
pub struct LP {
    pub n_constraints: usize,
    pub n_vars: usize,
    /// first column of the artificial variables; every column before it is a structural or slack column
    pub artificial_start: usize,
    pub basic_indices: Vec<usize>,
    pub tableau: Vec<Vec<f64>>, // Row major format
    /// objective to be maximized, one entry per structural variable
    pub objective: Vec<f64>,
    pub pivots: usize,
}

enum SimplexStatus {
    Optimal,
    Unbounded,
    IterationLimit,
}

impl LP {
    /// Builds the phase one tableau. Rows with a negative right-hand side are negated first,
    /// then `<=` rows get a slack, `>=` rows a surplus and an artificial, `=` rows an artificial.
    pub fn new(n_vars: usize, objective: Vec<f64>, constraints: &[(Vec<f64>, Comparison, f64)]) -> Self {
        let rows: Vec<(Vec<f64>, Comparison, f64)> = constraints
            .iter()
            .map(|(coefficients, comparison, rhs)| {
                if *rhs < 0. {
                    (coefficients.iter().map(|v| -v).collect(), comparison.flipped(), -rhs)
                } else {
                    (coefficients.clone(), *comparison, *rhs)
                }
            })
            .collect();
        let n_constraints = rows.len();
        let n_slacks = rows.iter().filter(|row| row.1 != Comparison::Eq).count();
        let n_artificials = rows.iter().filter(|row| row.1 != Comparison::LtEq).count();
        let artificial_start = 1 + n_vars + n_slacks;
        let tot_col = artificial_start + n_artificials;

        let mut tableau = vec![vec![0.; tot_col]; n_constraints + 1];
        let mut basic_indices = vec![0; n_constraints + 1];
        let mut slack_col = 1 + n_vars;
        let mut artificial_col = artificial_start;
        for (i, (coefficients, comparison, rhs)) in rows.into_iter().enumerate() {
            let row = &mut tableau[i + 1];
            row[0] = rhs;
            for (v, c) in row[1..=n_vars].iter_mut().zip(coefficients) {
                *v = c;
            }
            match comparison {
                Comparison::LtEq => {
                    row[slack_col] = 1.;
                    basic_indices[i + 1] = slack_col;
                    slack_col += 1;
                }
                Comparison::GtEq => {
                    row[slack_col] = -1.;
                    slack_col += 1;
                    row[artificial_col] = 1.;
                    basic_indices[i + 1] = artificial_col;
                    artificial_col += 1;
                }
                Comparison::Eq => {
                    row[artificial_col] = 1.;
                    basic_indices[i + 1] = artificial_col;
                    artificial_col += 1;
                }
            }
        }

        // phase one objective: maximize the negated sum of artificials, in canonical form
        for v in tableau[0][artificial_start..].iter_mut() {
            *v = 1.;
        }
        for i in 1..=n_constraints {
            if basic_indices[i] >= artificial_start {
                for j in 0..tot_col {
                    let num_to_sub = tableau[i][j];
                    tableau[0][j] -= num_to_sub;
                }
            }
        }

        LP {
            n_constraints,
            n_vars,
            artificial_start,
            basic_indices,
            tableau,
            objective,
            pivots: 0,
        }
    }

    pub fn solve(&mut self, options: &SolverOptions) -> Solution {
        if self.artificial_start < self.tableau[0].len() {
            match self.simplex(options) {
                SimplexStatus::IterationLimit => return Solution::IterationLimit,
                // the phase one objective is bounded above by zero
                SimplexStatus::Unbounded => return Solution::Infeasible,
                SimplexStatus::Optimal => {}
            }
            if self.tableau[0][0] < -options.tolerance {
                trace!("phase one optimum {} < 0, infeasible", self.tableau[0][0]);
                return Solution::Infeasible;
            }
            if let SimplexStatus::IterationLimit = self.drive_out_artificials(options) {
                return Solution::IterationLimit;
            }
        }
        self.install_objective();
        match self.simplex(options) {
            SimplexStatus::IterationLimit => Solution::IterationLimit,
            SimplexStatus::Unbounded => Solution::Unbounded,
            SimplexStatus::Optimal => Solution::Optimal(self.tableau[0][0], self.model(options.tolerance)),
        }
    }

    /// Pivots zero-valued artificials out of the basis, drops the rows that turn out redundant
    /// and finally removes the artificial columns. These pivots count against `max_pivots`.
    fn drive_out_artificials(&mut self, options: &SolverOptions) -> SimplexStatus {
        let mut redundant = vec![];
        for i in 1..=self.n_constraints {
            if self.basic_indices[i] < self.artificial_start {
                continue;
            }
            let entering = (1..self.artificial_start).find(|&j| self.tableau[i][j].abs() > options.tolerance);
            match entering {
                Some(_) if self.pivots >= options.max_pivots => return SimplexStatus::IterationLimit,
                Some(j) => {
                    LP::pivot(&mut self.tableau, j, i, options.parallel);
                    self.basic_indices[i] = j;
                    self.pivots += 1;
                }
                None => redundant.push(i),
            }
        }
        for &i in redundant.iter().rev() {
            trace!("dropping redundant row {}", i);
            self.tableau.remove(i);
            self.basic_indices.remove(i);
        }
        self.n_constraints -= redundant.len();
        let artificial_start = self.artificial_start;
        for row in self.tableau.iter_mut() {
            row.truncate(artificial_start);
        }
        SimplexStatus::Optimal
    }

    /// Replaces row 0 with the real objective expressed in the current basis.
    fn install_objective(&mut self) {
        let tot_col = self.tableau[0].len();
        let mut obj = vec![0.; tot_col];
        for (v, c) in obj[1..=self.n_vars].iter_mut().zip(&self.objective) {
            *v = -c;
        }
        for i in 1..=self.n_constraints {
            let multiplier = obj[self.basic_indices[i]];
            if multiplier != 0. {
                for (v, t) in obj.iter_mut().zip(&self.tableau[i]) {
                    *v -= multiplier * t;
                }
            }
        }
        self.tableau[0] = obj;
    }

    /// Primal simplex with Bland's rule: the smallest improving column enters and ties in the
    /// ratio test go to the row whose basic variable has the smallest index.
    fn simplex(&mut self, options: &SolverOptions) -> SimplexStatus {
        let tolerance = options.tolerance;
        loop {
            let tot_col = self.tableau[0].len();
            let entering_var = match (1..tot_col).find(|&j| self.tableau[0][j] < -tolerance) {
                Some(j) => j,
                None => break SimplexStatus::Optimal,
            };

            let mut leaving_var: Option<(usize, f64)> = None;
            for i in 1..=self.n_constraints {
                let coefficient = self.tableau[i][entering_var];
                if coefficient <= tolerance {
                    continue;
                }
                let ratio = self.tableau[i][0] / coefficient;
                leaving_var = match leaving_var {
                    None => Some((i, ratio)),
                    Some((best, best_ratio)) => {
                        if ratio < best_ratio - tolerance
                            || (ratio <= best_ratio + tolerance && self.basic_indices[i] < self.basic_indices[best])
                        {
                            Some((i, ratio))
                        } else {
                            Some((best, best_ratio))
                        }
                    }
                };
            }

            let leaving_var = match leaving_var {
                Some((i, _)) => i,
                None => break SimplexStatus::Unbounded,
            };
            if self.pivots >= options.max_pivots {
                break SimplexStatus::IterationLimit;
            }

            LP::pivot(&mut self.tableau, entering_var, leaving_var, options.parallel);
            self.basic_indices[leaving_var] = entering_var;
            self.pivots += 1;
        }
    }

    fn model(&self, tolerance: f64) -> Vec<f64> {
        let mut model = vec![0.; self.n_vars];
        for i in 1..=self.n_constraints {
            let column = self.basic_indices[i];
            if (1..=self.n_vars).contains(&column) {
                let value = self.tableau[i][0];
                model[column - 1] = if value.abs() <= tolerance { 0. } else { value };
            }
        }
        model
    }

    pub fn pivot(tableau: &mut [Vec<f64>], entering_var: usize, leaving_var: usize, parallel: bool) {
        let pivot_coeff = tableau[leaving_var][entering_var];
        tableau[leaving_var].iter_mut().for_each(|v| {
            *v /= pivot_coeff;
        });
        let pivot_row = tableau[leaving_var].clone();
        let eliminate = |(k, row): (usize, &mut Vec<f64>)| {
            if k == leaving_var {
                return;
            }
            let multiplier = row[entering_var];
            if multiplier == 0. {
                return;
            }
            for (v, p) in row.iter_mut().zip(&pivot_row) {
                *v -= multiplier * p;
            }
        };
        if parallel {
            tableau.par_iter_mut().enumerate().for_each(eliminate);
        } else {
            tableau.iter_mut().enumerate().for_each(eliminate);
        }
    }
}
