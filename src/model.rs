//! Model Builder
//!
//! Assembles the objective, the constraints and the variable declarations into one immutable [`Model`].
//!

use crate::error::*;
use crate::expression::*;
use crate::util::*;
use std::collections::{BTreeMap, BTreeSet};

/// a parsed linear constraint `lhs <op> rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// bookkeeping key `"c" + id`, carries no meaning for the solver
    pub key: String,
    pub lhs: LinearExpression,
    pub operator: Operator,
    pub rhs: f64,
}

impl Constraint {
    pub fn new(id: &str, lhs: LinearExpression, operator: Operator, rhs: f64) -> Self {
        Self {
            key: format!("c{id}"),
            lhs,
            operator,
            rhs,
        }
    }

    pub fn is_satisfied(&self, values: &BTreeMap<String, f64>, tolerance: f64) -> bool {
        let lhs = self.lhs.evaluate(values);
        match self.operator {
            Operator::LessEqual => lhs <= self.rhs + tolerance,
            Operator::GreaterEqual => lhs >= self.rhs - tolerance,
            Operator::Equal => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} {} {}", self.key, self.lhs, self.operator, self.rhs)
    }
}

/// solver-ready problem; never mutated after construction
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    objective: LinearExpression,
    sense: Sense,
    constraints: Vec<Constraint>,
    /// declared variables first, then undeclared ones in order of first appearance
    variables: Vec<VariableDeclaration>,
    tolerance: f64,
}

impl Model {
    pub fn objective(&self) -> &LinearExpression {
        &self.objective
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn variables(&self) -> &[VariableDeclaration] {
        &self.variables
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn declaration(&self, name: &str) -> Option<&VariableDeclaration> {
        self.variables.iter().find(|variable| variable.name == name)
    }

    pub fn is_integer(&self, name: &str) -> bool {
        self.declaration(name).map_or(false, |variable| variable.is_integer)
    }

    /// integer-restricted variables in declaration order
    pub fn integer_variables(&self) -> impl Iterator<Item = &str> {
        self.variables
            .iter()
            .filter(|variable| variable.is_integer)
            .map(|variable| variable.name.as_str())
    }

    pub fn has_integer_variables(&self) -> bool {
        self.variables.iter().any(|variable| variable.is_integer)
    }

    /// a new model with `constraint` appended; `self` is left untouched
    pub fn with_constraint(&self, constraint: Constraint) -> Model {
        let mut model = self.clone();
        model.constraints.push(constraint);
        model
    }

    pub fn objective_value(&self, values: &BTreeMap<String, f64>) -> f64 {
        self.objective.evaluate(values)
    }

    /// whether `values` is non-negative and satisfies every constraint up to `tolerance`
    pub fn is_feasible_point(&self, values: &BTreeMap<String, f64>, tolerance: f64) -> bool {
        values.values().all(|&value| value >= -tolerance)
            && self
                .constraints
                .iter()
                .all(|constraint| constraint.is_satisfied(values, tolerance))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ModelBuilder {
    pub parser: ExpressionParser,
}

impl ModelBuilder {
    pub fn new(parser: ExpressionParser) -> Self {
        Self { parser }
    }

    pub fn build(
        &self,
        objective: &str,
        sense: Sense,
        constraints: &[ConstraintInput],
        variables: &[VariableDeclaration],
    ) -> SolverResult<Model> {
        let objective = self.parser.parse(objective)?;
        let mut parsed_constraints = Vec::with_capacity(constraints.len());
        let mut ids = BTreeSet::new();
        for constraint in constraints.iter() {
            if !ids.insert(constraint.id.as_str()) {
                return Err(SolverError::DuplicateConstraint(constraint.id.clone()));
            }
            parsed_constraints.push(Constraint::new(
                &constraint.id,
                self.parser.parse(&constraint.lhs)?,
                constraint.operator.parse()?,
                parse_rhs(&constraint.rhs)?,
            ));
        }
        let mut declarations: Vec<VariableDeclaration> = vec![];
        for variable in variables.iter() {
            if !is_variable_name(&variable.name) {
                return Err(ParseError::InvalidVariableName(variable.name.clone()).into());
            }
            match declarations.iter_mut().find(|declared| declared.name == variable.name) {
                Some(declared) => declared.is_integer = variable.is_integer,
                None => declarations.push(variable.clone()),
            }
        }
        let referenced = objective
            .variables()
            .chain(parsed_constraints.iter().flat_map(|constraint| constraint.lhs.variables()));
        for name in referenced {
            if !declarations.iter().any(|declared| declared.name == name) {
                declarations.push(VariableDeclaration::continuous(name));
            }
        }
        Ok(Model {
            objective,
            sense,
            constraints: parsed_constraints,
            variables: declarations,
            tolerance: INTEGRALITY_TOLERANCE,
        })
    }

    /// declarations for the variables of the objective, in order, flagged integer when listed
    /// in `integers`; listed names absent from the objective are appended
    pub fn declarations_from_objective(
        &self,
        objective: &str,
        integers: &[String],
    ) -> Result<Vec<VariableDeclaration>, ParseError> {
        let objective = self.parser.parse(objective)?;
        let mut declarations: Vec<VariableDeclaration> = objective
            .variables()
            .map(|name| VariableDeclaration::new(name, integers.iter().any(|integer| integer == name)))
            .collect();
        for name in integers.iter() {
            if !declarations.iter().any(|declared| &declared.name == name) {
                declarations.push(VariableDeclaration::integer(name.as_str()));
            }
        }
        Ok(declarations)
    }
}

/// build with the default expression parser
pub fn build_model(
    objective: &str,
    sense: Sense,
    constraints: &[ConstraintInput],
    variables: &[VariableDeclaration],
) -> SolverResult<Model> {
    ModelBuilder::default().build(objective, sense, constraints, variables)
}

fn parse_rhs(rhs: &str) -> Result<f64, ParseError> {
    match rhs.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ParseError::InvalidRightHandSide(rhs.to_string())),
    }
}
