//! Expression Parser
//!
//! Turns free-form linear expression text such as `3x1 + 4x2 - x3` into a [`LinearExpression`].
//! Whitespace is removed first; then every maximal `[sign][coefficient]variable` run is a term,
//! and characters that cannot start a term are skipped.
//!

use crate::error::*;
use pest::Parser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod expression_grammar {
    #[derive(Parser)]
    #[grammar = "expression/grammar.pest"]
    pub struct ExpressionGrammar;
}

use expression_grammar::*;

/// what happens when a variable appears in more than one term of the same expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatedTerms {
    /// the later coefficient replaces the earlier one, `x1 + x1` is `x1`
    #[default]
    Overwrite,
    /// coefficients are added, `x1 + x1` is `2x1`
    Sum,
}

/// ordered `(variable, coefficient)` pairs with unique variable names
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearExpression {
    terms: Vec<(String, f64)>,
}

impl LinearExpression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(variable: impl Into<String>, coefficient: f64) -> Self {
        let mut expression = Self::new();
        expression.insert(variable, coefficient);
        expression
    }

    /// set the coefficient of `variable`; an existing term keeps its position
    pub fn insert(&mut self, variable: impl Into<String>, coefficient: f64) {
        let variable = variable.into();
        match self.terms.iter_mut().find(|(name, _)| *name == variable) {
            Some(term) => term.1 = coefficient,
            None => self.terms.push((variable, coefficient)),
        }
    }

    /// add `coefficient` to the coefficient of `variable`
    pub fn add(&mut self, variable: impl Into<String>, coefficient: f64) {
        let variable = variable.into();
        match self.terms.iter_mut().find(|(name, _)| *name == variable) {
            Some(term) => term.1 += coefficient,
            None => self.terms.push((variable, coefficient)),
        }
    }

    pub fn coefficient(&self, variable: &str) -> Option<f64> {
        self.terms
            .iter()
            .find(|(name, _)| name == variable)
            .map(|(_, coefficient)| *coefficient)
    }

    pub fn terms(&self) -> &[(String, f64)] {
        &self.terms
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// value of the expression, variables missing from `values` count as zero
    pub fn evaluate(&self, values: &BTreeMap<String, f64>) -> f64 {
        self.terms
            .iter()
            .map(|(name, coefficient)| coefficient * values.get(name).copied().unwrap_or(0.))
            .sum()
    }
}

impl std::fmt::Display for LinearExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.terms.is_empty() {
            return f.write_str("0");
        }
        for (idx, (name, coefficient)) in self.terms.iter().enumerate() {
            let negative = coefficient.is_sign_negative();
            if idx == 0 {
                if negative {
                    f.write_str("-")?;
                }
            } else {
                f.write_str(if negative { " - " } else { " + " })?;
            }
            let magnitude = coefficient.abs();
            if magnitude == 1. {
                write!(f, "{name}")?;
            } else {
                write!(f, "{magnitude}{name}")?;
            }
        }
        Ok(())
    }
}

/// whether `name` is one ASCII letter followed by zero or more digits
pub fn is_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic()) && chars.all(|c| c.is_ascii_digit())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionParser {
    pub repeated_terms: RepeatedTerms,
}

impl ExpressionParser {
    pub fn new(repeated_terms: RepeatedTerms) -> Self {
        Self { repeated_terms }
    }

    pub fn parse(&self, input: &str) -> Result<LinearExpression, ParseError> {
        let stripped: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        let expression = ExpressionGrammar::parse(Rule::expression, &stripped)
            .map_err(|error| ParseError::Grammar(error.to_string()))?
            .next()
            .ok_or_else(|| ParseError::NoTerms(input.to_string()))?;
        let mut linear_expression = LinearExpression::new();
        for term in expression.into_inner().filter(|pair| pair.as_rule() == Rule::term) {
            let mut inner_pairs = term.into_inner();
            let (coefficient, variable) = match (inner_pairs.next(), inner_pairs.next()) {
                (Some(coefficient), Some(variable)) => (coefficient.as_str(), variable.as_str()),
                _ => return Err(ParseError::Grammar(format!("incomplete term in `{input}`"))),
            };
            let coefficient = parse_coefficient(coefficient, variable)?;
            match self.repeated_terms {
                RepeatedTerms::Overwrite => linear_expression.insert(variable, coefficient),
                RepeatedTerms::Sum => linear_expression.add(variable, coefficient),
            }
        }
        if linear_expression.is_empty() {
            return Err(ParseError::NoTerms(input.to_string()));
        }
        Ok(linear_expression)
    }
}

/// parse with the default (overwriting) treatment of repeated variables
pub fn parse_expression(input: &str) -> Result<LinearExpression, ParseError> {
    ExpressionParser::default().parse(input)
}

fn parse_coefficient(coefficient: &str, variable: &str) -> Result<f64, ParseError> {
    match coefficient {
        "" | "+" => Ok(1.),
        "-" => Ok(-1.),
        _ => match coefficient.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(ParseError::InvalidCoefficient {
                coefficient: coefficient.to_string(),
                variable: variable.to_string(),
            }),
        },
    }
}
