/// Relational operator of one constraint row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `lhs <= rhs`
    LtEq,
    /// `lhs >= rhs`
    GtEq,
    /// `lhs = rhs`
    Eq,
}

impl Comparison {
    /// The operator obtained by multiplying both sides with `-1`.
    pub fn flipped(self) -> Self {
        match self {
            Comparison::LtEq => Comparison::GtEq,
            Comparison::GtEq => Comparison::LtEq,
            Comparison::Eq => Comparison::Eq,
        }
    }
}

/// Objective type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveType {
    /// Maximize.
    Max,
    /// Minimize.
    Min,
}

/// Solution to an LP instance as returned by
/// the solve method of a [`Solver`](crate::Solver).
#[derive(Debug, Clone, PartialEq)]
pub enum Solution {
    /// Represents that LP is infeasible.
    Infeasible,
    /// Represents that LP is unbounded.
    Unbounded,
    /// The first value is the optimal value of the objective and
    /// the second value is the assignment.
    Optimal(f64, Vec<f64>),
    /// The pivot limit was exhausted before the method terminated.
    IterationLimit,
}

/// Solver settings that can be passed to the solver instance.
#[derive(Debug, Clone, Copy)]
pub enum SolverSettings {
    /// Enables data parallelism while solving.
    EnableDataParallelism,
    /// Entries whose magnitude is below this value are treated as zero.
    Tolerance(f64),
    /// Maximum number of pivots over both phases.
    MaxPivots(usize),
}

/// default pivot tolerance
pub const DEFAULT_TOLERANCE: f64 = 1e-9;
/// default pivot limit
pub const DEFAULT_MAX_PIVOTS: usize = 50_000;

#[derive(Debug, Clone)]
pub(crate) struct SolverOptions {
    pub parallel: bool,
    pub tolerance: f64,
    pub max_pivots: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            tolerance: DEFAULT_TOLERANCE,
            max_pivots: DEFAULT_MAX_PIVOTS,
        }
    }
}
