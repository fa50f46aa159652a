//! # Symbolic Engine Module
//!
//! This module provides the symbolic expression type used by every vector calculus
//! computation in the crate: integrands, bounds, vector field components, curls,
//! divergences and the intermediate results that end up in derivation traces.
//!
//! ## Purpose
//!
//! The symbolic engine allows users to:
//! - Build symbolic mathematical expressions (by parsing or with operator overloads)
//! - Substitute variables by other expressions (coordinate changes)
//! - Perform analytical differentiation and integration (see sibling modules)
//! - Simplify expressions to a canonical form
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! - **Variables**: `Var(String)` - symbolic variables like "x", "theta"
//! - **Constants**: `Const(f64)` - numerical constants, `Pi` - the exact constant π
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow` - basic arithmetic
//! - **Functions**: `Exp`, `Ln`, `sin`, `cos`, `tg`, `Abs`
//!
//! ### Key Methods
//! - `var(name: &str)` - Create a variable
//! - `substitute_variable()` / `substitute_many()` - replace variables with expressions
//! - `diff(var: &str)` - Analytical differentiation
//! - `integrate(var: &str)` - Analytical integration
//! - `simplify()` - Canonical simplification
//!
//! ## Interesting Code Features
//!
//! 1. **Recursive Expression Tree**: Uses Box<Expr> for nested expressions
//!
//! 2. **Operator Overloading**: Implements std::ops traits (Add, Sub, Mul, Div, Neg) for
//!    natural mathematical syntax: `x + y * z`
//!
//! 3. **Precedence-aware printing**: `Display` only emits the parentheses the reader needs
//!
//! 4. **Non-standard Function Names**: Uses mathematical notation (tg) for the tangent,
//!    printed as `tan`

#![allow(non_camel_case_types)]

use std::collections::BTreeSet;
use std::f64;
use std::fmt;

/// Core symbolic expression enum representing mathematical expressions as an abstract syntax tree.
///
/// # Examples
/// ```rust, ignore
/// use RustedVectorCalc::symbolic::symbolic_engine::Expr;
/// let x = Expr::Var("x".to_string());
/// let expr = Expr::Add(Box::new(x), Box::new(Expr::Const(2.0)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Symbolic variable with a name (e.g., "x", "rho")
    Var(String),
    /// Numerical constant value
    Const(f64),
    /// The constant π, kept exact so that sin(π), cos(2π) etc. simplify
    Pi,
    /// Addition operation: left + right
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction operation: left - right
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication operation: left * right
    Mul(Box<Expr>, Box<Expr>),
    /// Division operation: left / right
    Div(Box<Expr>, Box<Expr>),
    /// Power operation: base ^ exponent
    Pow(Box<Expr>, Box<Expr>),
    /// Exponential function: e^x
    Exp(Box<Expr>),
    /// Natural logarithm: ln(x)
    Ln(Box<Expr>),
    /// Sine function: sin(x)
    sin(Box<Expr>),
    /// Cosine function: cos(x)
    cos(Box<Expr>),
    /// Tangent function: tan(x) - uses mathematical notation 'tg'
    tg(Box<Expr>),
    /// Absolute value: |x|
    Abs(Box<Expr>),
}

impl Expr {
    /// binding strength used by `Display`
    fn precedence(&self) -> u8 {
        match self {
            Expr::Add(_, _) | Expr::Sub(_, _) => 1,
            Expr::Mul(lhs, _) if **lhs == Expr::Const(-1.0) => 1,
            Expr::Mul(_, _) | Expr::Div(_, _) => 2,
            Expr::Pow(_, exp) if **exp == Expr::Const(0.5) => 4,
            Expr::Pow(_, _) => 3,
            Expr::Const(c) if *c < 0.0 => 1,
            _ => 4,
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter, parenthesize: bool) -> fmt::Result {
        if parenthesize {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

/// Display implementation for pretty printing symbolic expressions.
///
/// Only the parentheses required by operator precedence are printed,
/// `tg` is printed as `tan` and `x^0.5` as `sqrt(x)`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) => write!(f, "{}", val),
            Expr::Pi => write!(f, "pi"),
            Expr::Add(lhs, rhs) => {
                lhs.fmt_child(f, false)?;
                write!(f, " + ")?;
                rhs.fmt_child(f, matches!(**rhs, Expr::Const(c) if c < 0.0))
            }
            Expr::Sub(lhs, rhs) => {
                lhs.fmt_child(f, false)?;
                write!(f, " - ")?;
                rhs.fmt_child(f, rhs.precedence() <= 1)
            }
            Expr::Mul(lhs, rhs) if **lhs == Expr::Const(-1.0) => {
                write!(f, "-")?;
                rhs.fmt_child(f, rhs.precedence() < 2)
            }
            Expr::Mul(lhs, rhs) => {
                lhs.fmt_child(f, lhs.precedence() < 2 && !matches!(**lhs, Expr::Const(_)))?;
                write!(f, "*")?;
                rhs.fmt_child(f, rhs.precedence() < 2)
            }
            Expr::Div(lhs, rhs) => {
                lhs.fmt_child(f, lhs.precedence() < 2 && !matches!(**lhs, Expr::Const(_)))?;
                write!(f, "/")?;
                rhs.fmt_child(f, rhs.precedence() <= 2)
            }
            Expr::Pow(base, exp) => {
                if **exp == Expr::Const(0.5) {
                    return write!(f, "sqrt({})", base);
                }
                base.fmt_child(f, base.precedence() <= 3)?;
                write!(f, "^")?;
                exp.fmt_child(f, exp.precedence() < 4)
            }
            Expr::Exp(expr) => write!(f, "exp({})", expr),
            Expr::Ln(expr) => write!(f, "ln({})", expr),
            Expr::sin(expr) => write!(f, "sin({})", expr),
            Expr::cos(expr) => write!(f, "cos({})", expr),
            Expr::tg(expr) => write!(f, "tan({})", expr),
            Expr::Abs(expr) => write!(f, "Abs({})", expr),
        }
    }
}

impl Expr {
    /// Shorthand for `Expr::Var(name.to_string())`
    pub fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    pub fn powf(self, exponent: f64) -> Expr {
        Expr::Pow(self.boxed(), Expr::Const(exponent).boxed())
    }

    pub fn sqrt(self) -> Expr {
        self.powf(0.5)
    }

    pub fn exp(self) -> Expr {
        Expr::Exp(self.boxed())
    }

    pub fn ln(self) -> Expr {
        Expr::Ln(self.boxed())
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(c) if *c == 0.0)
    }

    /// Rebuilds the node with `f` applied to each direct child.
    pub fn map_children<F>(&self, mut f: F) -> Expr
    where
        F: FnMut(&Expr) -> Expr,
    {
        match self {
            Expr::Var(_) | Expr::Const(_) | Expr::Pi => self.clone(),
            Expr::Add(lhs, rhs) => Expr::Add(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Sub(lhs, rhs) => Expr::Sub(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Mul(lhs, rhs) => Expr::Mul(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Div(lhs, rhs) => Expr::Div(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Pow(base, exp) => Expr::Pow(f(base).boxed(), f(exp).boxed()),
            Expr::Exp(expr) => Expr::Exp(f(expr).boxed()),
            Expr::Ln(expr) => Expr::Ln(f(expr).boxed()),
            Expr::sin(expr) => Expr::sin(f(expr).boxed()),
            Expr::cos(expr) => Expr::cos(f(expr).boxed()),
            Expr::tg(expr) => Expr::tg(f(expr).boxed()),
            Expr::Abs(expr) => Expr::Abs(f(expr).boxed()),
        }
    }

    /// direct children of the node
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Var(_) | Expr::Const(_) | Expr::Pi => Vec::new(),
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => vec![lhs, rhs],
            Expr::Exp(expr)
            | Expr::Ln(expr)
            | Expr::sin(expr)
            | Expr::cos(expr)
            | Expr::tg(expr)
            | Expr::Abs(expr) => vec![expr],
        }
    }

    /// Replaces every occurrence of variable `var` by `replacement`.
    pub fn substitute_variable(&self, var: &str, replacement: &Expr) -> Expr {
        match self {
            Expr::Var(name) if name == var => replacement.clone(),
            _ => self.map_children(|child| child.substitute_variable(var, replacement)),
        }
    }

    /// Simultaneous substitution: replacements never see each other's output,
    /// so `[(x, y), (y, x)]` swaps the two variables.
    pub fn substitute_many(&self, substitutions: &[(&str, Expr)]) -> Expr {
        match self {
            Expr::Var(name) => substitutions
                .iter()
                .find(|(var, _)| var == name)
                .map(|(_, replacement)| replacement.clone())
                .unwrap_or_else(|| self.clone()),
            _ => self.map_children(|child| child.substitute_many(substitutions)),
        }
    }

    pub fn contains_variable(&self, var_name: &str) -> bool {
        match self {
            Expr::Var(name) => name == var_name,
            _ => self
                .children()
                .iter()
                .any(|child| child.contains_variable(var_name)),
        }
    }

    /// all free variables, sorted
    pub fn variables(&self) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        self.collect_variables(&mut found);
        found
    }

    fn collect_variables(&self, found: &mut BTreeSet<String>) {
        if let Expr::Var(name) = self {
            found.insert(name.clone());
        }
        for child in self.children() {
            child.collect_variables(found);
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Expr::Const(-1.0).boxed(), self.boxed())
    }
}

