use crate::symbolic::symbolic_engine::Expr;

use itertools::Itertools;
use std::fmt;
use std::ops::Index;

#[derive(Clone, Debug, PartialEq)]
/// Symbolic vector: vector field components, curls, Gram-Schmidt vectors
pub struct ExprVector {
    pub data: Vec<Expr>,
}

impl ExprVector {
    /// Create new symbolic vector
    pub fn new(data: Vec<Expr>) -> Self {
        Self { data }
    }

    /// Create from variable names
    pub fn from_variables(vars: &[&str]) -> Self {
        Self {
            data: vars.iter().map(|&v| Expr::Var(v.to_string())).collect(),
        }
    }

    /// turn symbolic vector into vector of strings
    pub fn to_strings(&self) -> Vec<String> {
        self.data.iter().map(|expr| expr.to_string()).collect()
    }

    /// Get length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn check_same_len(&self, other: &ExprVector) -> Result<(), String> {
        if self.len() != other.len() {
            return Err(format!(
                "vector dimensions must match: {} and {}",
                self.len(),
                other.len()
            ));
        }
        Ok(())
    }

    /// Dot product (symbolic), simplified
    pub fn dot(&self, other: &ExprVector) -> Result<Expr, String> {
        self.check_same_len(other)?;
        let mut result = Expr::Const(0.0);
        for (a, b) in self.data.iter().zip(&other.data) {
            result = result + a.clone() * b.clone();
        }
        Ok(result.simplify())
    }

    /// v·v
    pub fn norm_squared(&self) -> Expr {
        self.data
            .iter()
            .fold(Expr::Const(0.0), |acc, e| acc + e.clone() * e.clone())
            .simplify()
    }

    /// Scalar multiplication, componentwise
    pub fn scale(&self, scalar: &Expr) -> ExprVector {
        ExprVector {
            data: self
                .data
                .iter()
                .map(|e| (e.clone() * scalar.clone()).simplify())
                .collect(),
        }
    }

    /// Componentwise sum
    pub fn try_add(&self, other: &ExprVector) -> Result<ExprVector, String> {
        self.check_same_len(other)?;
        Ok(ExprVector {
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| (a.clone() + b.clone()).simplify())
                .collect(),
        })
    }

    /// Componentwise difference
    pub fn try_sub(&self, other: &ExprVector) -> Result<ExprVector, String> {
        self.check_same_len(other)?;
        Ok(ExprVector {
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| (a.clone() - b.clone()).simplify())
                .collect(),
        })
    }

    /// Evaluate vector numerically
    pub fn evaluate(&self, vars: &[&str], values: &[f64]) -> Vec<f64> {
        self.data
            .iter()
            .map(|expr| expr.eval_expression(vars, values))
            .collect()
    }

    /// Substitute variables
    pub fn substitute(&self, var: &str, value: &Expr) -> ExprVector {
        ExprVector {
            data: self
                .data
                .iter()
                .map(|expr| expr.substitute_variable(var, value))
                .collect(),
        }
    }

    /// Simultaneous substitution of several variables
    pub fn substitute_many(&self, substitutions: &[(&str, Expr)]) -> ExprVector {
        ExprVector {
            data: self
                .data
                .iter()
                .map(|expr| expr.substitute_many(substitutions))
                .collect(),
        }
    }

    /// Differentiate with respect to variable
    pub fn diff(&self, var: &str) -> ExprVector {
        ExprVector {
            data: self
                .data
                .iter()
                .map(|expr| expr.diff(var).simplify())
                .collect(),
        }
    }

    /// Simplify all expressions
    pub fn simplify(&self) -> ExprVector {
        ExprVector {
            data: self.data.iter().map(|expr| expr.simplify()).collect(),
        }
    }

    /// true when every component simplifies to zero
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|expr| expr.simplifies_to_zero())
    }
}

impl fmt::Display for ExprVector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({})", self.data.iter().join(", "))
    }
}

// Implement indexing
impl Index<usize> for ExprVector {
    type Output = Expr;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}
