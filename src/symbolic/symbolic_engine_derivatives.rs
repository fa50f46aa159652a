//! Analytical differentiation and numerical evaluation of `Expr`.
//!
//! `diff` returns an unsimplified tree built with the usual rules (sum, product,
//! quotient, general power, chain rule); callers run `simplify()` on it when the
//! result is meant to be read.
#![allow(non_camel_case_types)]

use crate::symbolic::symbolic_engine::Expr;
use std::f64::consts::PI;

impl Expr {
    /// Partial derivative with respect to `var`.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let f = parse_expression("x^2*y").unwrap();
    /// let df_dx = f.diff("x").simplify(); // 2*x*y
    /// ```
    pub fn diff(&self, var: &str) -> Expr {
        match self {
            Expr::Var(name) => {
                if name == var {
                    Expr::Const(1.0)
                } else {
                    Expr::Const(0.0)
                }
            }
            Expr::Const(_) | Expr::Pi => Expr::Const(0.0),
            Expr::Add(lhs, rhs) => sum(lhs.diff(var), rhs.diff(var)),
            Expr::Sub(lhs, rhs) => difference(lhs.diff(var), rhs.diff(var)),
            Expr::Mul(lhs, rhs) => sum(
                product(lhs.diff(var), (**rhs).clone()),
                product((**lhs).clone(), rhs.diff(var)),
            ),
            Expr::Div(lhs, rhs) => {
                let numerator = difference(
                    product(lhs.diff(var), (**rhs).clone()),
                    product((**lhs).clone(), rhs.diff(var)),
                );
                if numerator.is_zero() {
                    return Expr::Const(0.0);
                }
                numerator / (**rhs).clone().powf(2.0)
            }
            Expr::Pow(base, exp) => {
                let base_depends = base.contains_variable(var);
                let exp_depends = exp.contains_variable(var);
                match (base_depends, exp_depends) {
                    (false, false) => Expr::Const(0.0),
                    // n * b^(n-1) * b'
                    (true, false) => product(
                        product(
                            (**exp).clone(),
                            (**base).clone().pow((**exp).clone() - Expr::Const(1.0)),
                        ),
                        base.diff(var),
                    ),
                    // b^e * ln(b) * e'
                    (false, true) => product(
                        product(self.clone(), (**base).clone().ln()),
                        exp.diff(var),
                    ),
                    // b^e * (e' ln(b) + e b'/b)
                    (true, true) => product(
                        self.clone(),
                        sum(
                            product(exp.diff(var), (**base).clone().ln()),
                            product((**exp).clone(), base.diff(var)) / (**base).clone(),
                        ),
                    ),
                }
            }
            Expr::Exp(arg) => product(self.clone(), arg.diff(var)),
            Expr::Ln(arg) => {
                let darg = arg.diff(var);
                if darg.is_zero() {
                    return Expr::Const(0.0);
                }
                darg / (**arg).clone()
            }
            Expr::sin(arg) => product(Expr::cos(arg.clone()), arg.diff(var)),
            Expr::cos(arg) => product(-Expr::sin(arg.clone()), arg.diff(var)),
            Expr::tg(arg) => {
                let darg = arg.diff(var);
                if darg.is_zero() {
                    return Expr::Const(0.0);
                }
                darg / Expr::cos(arg.clone()).powf(2.0)
            }
            Expr::Abs(arg) => product((**arg).clone() / self.clone(), arg.diff(var)),
        }
    }

    /// Evaluates the expression numerically, `vars[i]` taking `values[i]`.
    /// Unbound variables evaluate to NaN.
    pub fn eval_expression(&self, vars: &[&str], values: &[f64]) -> f64 {
        match self {
            Expr::Var(name) => vars
                .iter()
                .position(|v| v == name)
                .and_then(|i| values.get(i).copied())
                .unwrap_or(f64::NAN),
            Expr::Const(val) => *val,
            Expr::Pi => PI,
            Expr::Add(lhs, rhs) => {
                lhs.eval_expression(vars, values) + rhs.eval_expression(vars, values)
            }
            Expr::Sub(lhs, rhs) => {
                lhs.eval_expression(vars, values) - rhs.eval_expression(vars, values)
            }
            Expr::Mul(lhs, rhs) => {
                lhs.eval_expression(vars, values) * rhs.eval_expression(vars, values)
            }
            Expr::Div(lhs, rhs) => {
                lhs.eval_expression(vars, values) / rhs.eval_expression(vars, values)
            }
            Expr::Pow(base, exp) => base
                .eval_expression(vars, values)
                .powf(exp.eval_expression(vars, values)),
            Expr::Exp(arg) => arg.eval_expression(vars, values).exp(),
            Expr::Ln(arg) => arg.eval_expression(vars, values).ln(),
            Expr::sin(arg) => arg.eval_expression(vars, values).sin(),
            Expr::cos(arg) => arg.eval_expression(vars, values).cos(),
            Expr::tg(arg) => arg.eval_expression(vars, values).tan(),
            Expr::Abs(arg) => arg.eval_expression(vars, values).abs(),
        }
    }

    /// numeric value of a closed expression, `None` if it has free variables or is not finite
    pub fn to_f64(&self) -> Option<f64> {
        if !self.variables().is_empty() {
            return None;
        }
        let value = self.eval_expression(&[], &[]);
        value.is_finite().then_some(value)
    }
}

fn sum(lhs: Expr, rhs: Expr) -> Expr {
    match (lhs.is_zero(), rhs.is_zero()) {
        (true, _) => rhs,
        (_, true) => lhs,
        _ => lhs + rhs,
    }
}

fn difference(lhs: Expr, rhs: Expr) -> Expr {
    match (lhs.is_zero(), rhs.is_zero()) {
        (_, true) => lhs,
        (true, _) => -rhs,
        _ => lhs - rhs,
    }
}

fn product(lhs: Expr, rhs: Expr) -> Expr {
    if lhs.is_zero() || rhs.is_zero() {
        return Expr::Const(0.0);
    }
    match (&lhs, &rhs) {
        (Expr::Const(c), _) if *c == 1.0 => rhs,
        (_, Expr::Const(c)) if *c == 1.0 => lhs,
        _ => lhs * rhs,
    }
}
