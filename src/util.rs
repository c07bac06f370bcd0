use crate::error::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

/// every model uses this tolerance to decide whether a relaxed value is integral
pub const INTEGRALITY_TOLERANCE: f64 = 1e-10;

/// optimization sense of the objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Sense {
    /// maximize the objective
    #[serde(alias = "maximize", alias = "maximise")]
    #[value(alias = "maximize", alias = "maximise")]
    Max,
    /// minimize the objective
    #[serde(alias = "minimize", alias = "minimise")]
    #[value(alias = "minimize", alias = "minimise")]
    Min,
}

impl Sense {
    /// whether `candidate` is strictly better than `incumbent`
    pub fn improves(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Sense::Max => candidate > incumbent,
            Sense::Min => candidate < incumbent,
        }
    }

    /// the objective value reported for an unbounded relaxation
    pub fn unbounded_value(&self) -> f64 {
        match self {
            Sense::Max => f64::INFINITY,
            Sense::Min => f64::NEG_INFINITY,
        }
    }
}

impl FromStr for Sense {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max" | "maximize" | "maximise" => Ok(Sense::Max),
            "min" | "minimize" | "minimise" => Ok(Sense::Min),
            _ => Err(ParseError::UnknownSense(s.to_string())),
        }
    }
}

impl std::fmt::Display for Sense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Sense::Max => "max",
            Sense::Min => "min",
        })
    }
}

/// relational operator of a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "<=")]
    LessEqual,
    #[serde(rename = ">=")]
    GreaterEqual,
    #[serde(rename = "=")]
    Equal,
}

impl FromStr for Operator {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<=" | "≤" => Ok(Operator::LessEqual),
            ">=" | "≥" => Ok(Operator::GreaterEqual),
            "=" | "==" => Ok(Operator::Equal),
            _ => Err(ParseError::UnknownOperator(s.to_string())),
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Operator::LessEqual => "<=",
            Operator::GreaterEqual => ">=",
            Operator::Equal => "=",
        })
    }
}

/// a constraint as entered by the user: every field is raw text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintInput {
    /// bookkeeping id, unique among the constraints of one problem
    pub id: String,
    pub lhs: String,
    pub operator: String,
    pub rhs: String,
}

impl ConstraintInput {
    pub fn new(id: impl Into<String>, lhs: impl Into<String>, operator: impl Into<String>, rhs: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            lhs: lhs.into(),
            operator: operator.into(),
            rhs: rhs.into(),
        }
    }

    /// split a one-line constraint like `x1 + 2x2 <= 14` at its operator
    pub fn parse_line(id: impl Into<String>, line: &str) -> Result<Self, ParseError> {
        const OPERATORS: [&str; 6] = ["<=", ">=", "≤", "≥", "==", "="];
        let (position, operator) = OPERATORS
            .iter()
            .find_map(|operator| line.find(operator).map(|position| (position, *operator)))
            .ok_or_else(|| ParseError::MalformedConstraint(line.to_string()))?;
        let lhs = line[..position].trim();
        let rhs = line[position + operator.len()..].trim();
        if lhs.is_empty() || rhs.is_empty() {
            return Err(ParseError::MalformedConstraint(line.to_string()));
        }
        Ok(Self::new(id, lhs, operator, rhs))
    }
}

/// a variable name plus whether it is restricted to integer values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub name: String,
    #[serde(rename = "isInteger", alias = "is_integer", default)]
    pub is_integer: bool,
}

impl VariableDeclaration {
    pub fn new(name: impl Into<String>, is_integer: bool) -> Self {
        Self {
            name: name.into(),
            is_integer,
        }
    }

    pub fn continuous(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }
}

/// the full input of one solve call, as a JSON problem file stores it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProblemInput {
    pub objective: String,
    #[serde(alias = "objectiveType")]
    pub sense: Sense,
    #[serde(default)]
    pub constraints: Vec<ConstraintInput>,
    #[serde(default)]
    pub variables: Vec<VariableDeclaration>,
}

impl ProblemInput {
    pub fn from_json_file(path: impl AsRef<Path>) -> SolverResult<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// how a solve call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// the depth or node limit stopped the search; the solution is the best one found
    SearchLimitReached,
    Error,
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::SearchLimitReached => "search_limit_reached",
            SolveStatus::Error => "error",
        })
    }
}

/// the outcome of one relaxation or one complete solve
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub feasible: bool,
    /// objective value; `±inf` when unbounded
    pub result: f64,
    pub values: BTreeMap<String, f64>,
    /// `Some(false)` when the objective grows without limit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounded: Option<bool>,
    /// simplex pivots spent to produce this solution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<usize>,
    /// branch-and-bound nodes explored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub status: SolveStatus,
}

impl Solution {
    pub fn optimal(result: f64, values: BTreeMap<String, f64>) -> Self {
        Self {
            feasible: true,
            result,
            values,
            bounded: Some(true),
            iterations: None,
            nodes: None,
            error: None,
            status: SolveStatus::Optimal,
        }
    }

    pub fn infeasible() -> Self {
        Self {
            feasible: false,
            result: 0.,
            values: BTreeMap::new(),
            bounded: None,
            iterations: None,
            nodes: None,
            error: None,
            status: SolveStatus::Infeasible,
        }
    }

    pub fn unbounded(sense: Sense) -> Self {
        Self {
            feasible: true,
            result: sense.unbounded_value(),
            values: BTreeMap::new(),
            bounded: Some(false),
            iterations: None,
            nodes: None,
            error: None,
            status: SolveStatus::Unbounded,
        }
    }

    /// an infeasible solution carrying an error message
    pub fn failure(status: SolveStatus, message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            status,
            ..Self::infeasible()
        }
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = Some(iterations);
        self
    }

    /// value of a variable, zero when the solution does not mention it
    pub fn value(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.)
    }

    pub fn is_bounded(&self) -> bool {
        self.bounded != Some(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("x1 + 2x2 <= 14", "x1 + 2x2", "<=", "14")]
    #[test_case("3x1 - x2>=0", "3x1 - x2", ">=", "0")]
    #[test_case("x1 - x2 = 2", "x1 - x2", "=", "2")]
    #[test_case("x ≤ 1.5", "x", "≤", "1.5")]
    fn util_parse_constraint_line(line: &str, lhs: &str, operator: &str, rhs: &str) {
        let constraint = ConstraintInput::parse_line("1", line).unwrap();
        assert_eq!(constraint, ConstraintInput::new("1", lhs, operator, rhs));
    }

    #[test_case("x1 + x2"; "missing operator")]
    #[test_case("<= 4"; "missing lhs")]
    #[test_case("x1 >= "; "missing rhs")]
    fn util_parse_constraint_line_malformed(line: &str) {
        assert_eq!(
            ConstraintInput::parse_line("1", line),
            Err(ParseError::MalformedConstraint(line.to_string()))
        );
    }

    #[test]
    fn util_sense_comparison() {
        assert!(Sense::Max.improves(2., 1.));
        assert!(!Sense::Max.improves(1., 1.));
        assert!(Sense::Min.improves(1., 2.));
        assert!(!Sense::Min.improves(2., 2.));
        assert!(Sense::Max.improves(Sense::Max.unbounded_value(), 1e300));
        assert_eq!("Maximize".parse::<Sense>(), Ok(Sense::Max));
        assert_eq!(" min ".parse::<Sense>(), Ok(Sense::Min));
        assert!("up".parse::<Sense>().is_err());
    }

    #[test]
    fn util_problem_input_json() {
        let problem: ProblemInput = serde_json::from_value(serde_json::json!({
            "objective": "3x1 + 4x2",
            "objectiveType": "max",
            "constraints": [{ "id": "1", "lhs": "x1 + 2x2", "operator": "<=", "rhs": "14" }],
            "variables": [{ "name": "x1", "isInteger": true }, { "name": "x2" }],
        }))
        .unwrap();
        assert_eq!(problem.sense, Sense::Max);
        assert_eq!(problem.constraints[0].rhs, "14");
        assert_eq!(
            problem.variables,
            vec![VariableDeclaration::integer("x1"), VariableDeclaration::continuous("x2")]
        );
    }

    #[test]
    fn util_solution_json_skips_absent_fields() {
        let value = serde_json::to_value(Solution::infeasible()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "feasible": false, "result": 0.0, "values": {}, "status": "infeasible" })
        );
    }
}
