//! # Symbolic Expression Simplification Module
//!
//! Brings expressions to a canonical form: a sum of monomials, each monomial being a
//! numeric coefficient times a product of atoms raised to numeric powers.
//!
//! ## Simplification Strategy
//!
//! 1. **Atoms**: variables, `pi`, function calls with canonical arguments, powers with
//!    symbolic exponents and sums that cannot be expanded
//! 2. **Expansion**: products are distributed, `(a + b)^n` is expanded for small positive `n`
//! 3. **Like Term Collection**: `3x + 2x = 5x`, `x*x^2 = x^3`, `exp(a)*exp(b) = exp(a + b)`
//! 4. **Trigonometric rules**: `tan = sin/cos`, `sin(-u) = -sin(u)`, `cos(-u) = cos(u)`,
//!    shifts by multiples of π/2 (so `sin(pi) = 0`, `cos(2*pi) = 1`)
//! 5. **Logarithms and exponentials**: `exp(0) = 1`, `ln(1) = 0`, `ln(exp(u)) = u`,
//!    `exp(k*ln(u)) = u^k`
//! 6. **Roots of even powers**: `sqrt(x^2) = |x|`, `(x^2)^(3/2) = |x|^3`
//! 7. **Pythagorean identity**: `c*sin(u)^2 + c*cos(u)^2 = c`
//!
//! ## Key Features
//!
//! - **Term Ordering Independence**: `(a + b)` and `(b + a)` have the same canonical form,
//!   so `a.simplify() == b.simplify()` is a meaningful equality test
//! - **Exact π**: multiples of `pi` stay symbolic and print as fractions, e.g. `4*pi/3`
//! - **Zero Elimination**: coefficients that cancel to within floating noise are dropped

use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::utils::{as_fraction, is_integer, is_simple_rational};
use std::collections::BTreeMap;

/// coefficients smaller than this (relative to the largest one) are treated as zero
pub const ZERO_TOLERANCE: f64 = 1e-12;
/// largest positive integer power of a sum that is expanded
const EXPANSION_LIMIT: f64 = 8.0;

/// A numeric coefficient times a product of atoms raised to numeric powers.
/// Factors are keyed by the printed form of their base.
#[derive(Clone, Debug, PartialEq)]
pub struct Monomial {
    pub coeff: f64,
    pub factors: BTreeMap<String, (Expr, f64)>,
}

/// A sum of monomials keyed by their factor signature. The constant term has the empty key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polynomial {
    pub terms: BTreeMap<String, Monomial>,
}

impl Monomial {
    pub fn constant(coeff: f64) -> Self {
        Monomial {
            coeff,
            factors: BTreeMap::new(),
        }
    }

    pub fn atom(base: Expr, power: f64) -> Self {
        let mut factors = BTreeMap::new();
        factors.insert(base.to_string(), (base, power));
        Monomial { coeff: 1.0, factors }.normalize()
    }

    /// signature shared by like terms
    pub fn key(&self) -> String {
        self.factors
            .iter()
            .map(|(key, (_, power))| format!("{}^{}", key, power))
            .collect::<Vec<_>>()
            .join("*")
    }

    pub fn is_constant(&self) -> bool {
        self.factors.is_empty()
    }

    /// same factors with coefficient 1
    pub fn unit(&self) -> Monomial {
        Monomial {
            coeff: 1.0,
            factors: self.factors.clone(),
        }
    }

    pub fn mul(&self, other: &Monomial) -> Monomial {
        let mut result = self.clone();
        result.coeff *= other.coeff;
        for (key, (base, power)) in &other.factors {
            result
                .factors
                .entry(key.clone())
                .and_modify(|(_, p)| *p += power)
                .or_insert((base.clone(), *power));
        }
        result.normalize()
    }

    /// `self^n`; `None` when the result would need the power of a negative coefficient
    pub fn powf(&self, n: f64) -> Option<Monomial> {
        let mut result = Monomial::constant(1.0);
        if is_integer(n) {
            result.coeff = self.coeff.powi(n.round() as i32);
        } else if self.coeff < 0.0 {
            return None;
        } else {
            let value = self.coeff.powf(n);
            if self.coeff == 1.0 || is_simple_rational(value) {
                result.coeff = value;
            } else {
                let base = Expr::Const(self.coeff);
                result.factors.insert(base.to_string(), (base, n));
            }
        }
        for (key, (base, power)) in &self.factors {
            let folded = power * n;
            // (b^2k)^n = |b|^(2kn)
            let factor = if !is_integer(n) && is_even(*power) && !is_even(folded) && !is_non_negative(base) {
                canonical_abs(&Polynomial::from_expr(base))
                    .single_monomial()
                    .and_then(|magnitude| magnitude.powf(folded))
                    .unwrap_or_else(|| Monomial::atom(Expr::Abs(base.clone().boxed()), folded))
            } else {
                let mut factors = BTreeMap::new();
                factors.insert(key.clone(), (base.clone(), folded));
                Monomial { coeff: 1.0, factors }
            };
            result = result.mul(&factor);
        }
        Some(result.normalize())
    }

    /// drops zero powers, folds numeric bases with integer powers into the
    /// coefficient and merges exponentials
    fn normalize(mut self) -> Monomial {
        let mut exponentials: Vec<(Expr, f64)> = Vec::new();
        let mut factors = BTreeMap::new();
        for (key, (base, power)) in std::mem::take(&mut self.factors) {
            let power = if is_integer(power) { power.round() } else { power };
            if power == 0.0 {
                continue;
            }
            match base {
                Expr::Const(b) if is_integer(power) => {
                    self.coeff *= b.powi(power as i32);
                }
                Expr::Exp(arg) => exponentials.push((*arg, power)),
                base => {
                    factors.insert(key, (base, power));
                }
            }
        }
        if !exponentials.is_empty() {
            let mut combined = Polynomial::zero();
            for (arg, power) in &exponentials {
                combined = combined.add(&Polynomial::from_expr(arg).scale(*power));
            }
            if !combined.is_zero() {
                let base = Expr::Exp(combined.to_expr().boxed());
                factors.insert(base.to_string(), (base, 1.0));
            }
        }
        self.factors = factors;
        self
    }

    /// Expression for `|coeff| * factors`; the sign is returned separately so that a
    /// sum can be printed with subtractions.
    fn to_unsigned_expr(&self) -> (bool, Expr) {
        let negative = self.coeff < 0.0;
        let magnitude = self.coeff.abs();
        let (numerator_coeff, denominator_coeff) = match as_fraction(magnitude) {
            Some((p, q)) => (p as f64, q as f64),
            None => (magnitude, 1.0),
        };

        let mut numerator: Vec<Expr> = Vec::new();
        let mut denominator: Vec<Expr> = Vec::new();
        if numerator_coeff != 1.0 || self.factors.values().all(|(_, p)| *p < 0.0) {
            numerator.push(Expr::Const(numerator_coeff));
        }
        if denominator_coeff != 1.0 {
            denominator.push(Expr::Const(denominator_coeff));
        }
        for (base, power) in self.factors.values() {
            let target = if *power > 0.0 {
                &mut numerator
            } else {
                &mut denominator
            };
            let power = power.abs();
            if power == 1.0 {
                target.push(base.clone());
            } else {
                target.push(base.clone().powf(power));
            }
        }

        let product = |items: Vec<Expr>| {
            items
                .into_iter()
                .reduce(|acc, item| acc * item)
                .unwrap_or(Expr::Const(1.0))
        };
        let expr = if denominator.is_empty() {
            product(numerator)
        } else {
            product(numerator) / product(denominator)
        };
        (negative, expr)
    }

    pub fn to_expr(&self) -> Expr {
        match self.to_unsigned_expr() {
            (true, Expr::Const(c)) => Expr::Const(-c),
            (true, expr) => -expr,
            (false, expr) => expr,
        }
    }
}

impl Polynomial {
    pub fn zero() -> Self {
        Polynomial::default()
    }

    pub fn constant(c: f64) -> Self {
        Polynomial::from_monomial(Monomial::constant(c))
    }

    pub fn from_monomial(monomial: Monomial) -> Self {
        let mut result = Polynomial::zero();
        if monomial.coeff != 0.0 {
            result.terms.insert(monomial.key(), monomial);
        }
        result
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// numeric value when the sum has no atoms
    pub fn as_constant(&self) -> Option<f64> {
        match self.terms.len() {
            0 => Some(0.0),
            1 => self.terms.get("").map(|m| m.coeff),
            _ => None,
        }
    }

    pub fn single_monomial(&self) -> Option<&Monomial> {
        if self.terms.len() == 1 {
            self.terms.values().next()
        } else {
            None
        }
    }

    pub fn has_non_finite(&self) -> bool {
        self.terms.values().any(|m| !m.coeff.is_finite())
    }

    pub fn add(&self, other: &Polynomial) -> Polynomial {
        let mut result = self.clone();
        for (key, monomial) in &other.terms {
            result
                .terms
                .entry(key.clone())
                .and_modify(|m| m.coeff += monomial.coeff)
                .or_insert_with(|| monomial.clone());
        }
        result.prune()
    }

    pub fn scale(&self, factor: f64) -> Polynomial {
        let mut result = self.clone();
        for monomial in result.terms.values_mut() {
            monomial.coeff *= factor;
        }
        result.prune()
    }

    pub fn mul_monomial(&self, factor: &Monomial) -> Polynomial {
        let mut result = Polynomial::zero();
        for monomial in self.terms.values() {
            result = result.add(&Polynomial::from_monomial(monomial.mul(factor)));
        }
        result
    }

    pub fn mul(&self, other: &Polynomial) -> Polynomial {
        let mut result = Polynomial::zero();
        for monomial in other.terms.values() {
            result = result.add(&self.mul_monomial(monomial));
        }
        result
    }

    pub fn divide(&self, denominator: &Polynomial) -> Polynomial {
        if denominator.is_zero() {
            let value = if self.is_zero() { f64::NAN } else { f64::INFINITY };
            return Polynomial::constant(value);
        }
        if let Some(monomial) = denominator.single_monomial() {
            return match monomial.powf(-1.0) {
                Some(inverse) => self.mul_monomial(&inverse),
                None => Polynomial::constant(f64::NAN),
            };
        }
        if let Some(ratio) = self.ratio_to(denominator) {
            return Polynomial::constant(ratio);
        }
        // make the leading coefficient of the denominator 1 so that equal
        // denominators share one atom
        let leading = denominator
            .terms
            .values()
            .next()
            .map(|m| m.coeff)
            .unwrap_or(1.0);
        let normalized = denominator.scale(1.0 / leading);
        self.scale(1.0 / leading)
            .mul_monomial(&Monomial::atom(normalized.to_expr(), -1.0))
    }

    /// `Some(c)` when `self == c * other`
    fn ratio_to(&self, other: &Polynomial) -> Option<f64> {
        if self.terms.len() != other.terms.len() {
            return None;
        }
        let mut ratio = None;
        for (key, monomial) in &self.terms {
            let candidate = monomial.coeff / other.terms.get(key)?.coeff;
            match ratio {
                None => ratio = Some(candidate),
                Some(r) if (r - candidate).abs() <= ZERO_TOLERANCE * r.abs().max(1.0) => {}
                Some(_) => return None,
            }
        }
        ratio
    }

    pub fn power(&self, exponent: &Polynomial) -> Polynomial {
        let Some(n) = exponent.as_constant() else {
            return self.symbolic_power(exponent);
        };
        if n == 0.0 {
            return Polynomial::constant(1.0);
        }
        if self.is_zero() {
            let value = if n > 0.0 { 0.0 } else { f64::INFINITY };
            return Polynomial::constant(value);
        }
        if let Some(monomial) = self.single_monomial() {
            if let Some(result) = monomial.powf(n) {
                return Polynomial::from_monomial(result);
            }
        } else if is_integer(n) && n > 0.0 && n <= EXPANSION_LIMIT {
            let mut result = Polynomial::constant(1.0);
            for _ in 0..n.round() as usize {
                result = result.mul(self);
            }
            return result;
        }
        Polynomial::from_monomial(Monomial::atom(self.to_expr(), n))
    }

    /// `b^e` with a non-numeric exponent: rewritten through `exp` when the base allows it
    fn symbolic_power(&self, exponent: &Polynomial) -> Polynomial {
        if let Some(base) = self.as_constant() {
            if base > 0.0 {
                let log_base = Polynomial::from_expr(&Expr::Const(base).ln());
                return canonical_exp(&log_base.mul(exponent));
            }
        }
        if let Some(monomial) = self.single_monomial() {
            if monomial.coeff == 1.0 && monomial.factors.len() == 1 {
                if let Some((Expr::Exp(arg), power)) = monomial.factors.values().next() {
                    let arg = Polynomial::from_expr(arg).scale(*power);
                    return canonical_exp(&arg.mul(exponent));
                }
            }
        }
        let base = self.to_expr();
        Polynomial::from_monomial(Monomial::atom(base.pow(exponent.to_expr()), 1.0))
    }

    fn prune(mut self) -> Polynomial {
        let largest = self
            .terms
            .values()
            .map(|m| m.coeff.abs())
            .filter(|c| c.is_finite())
            .fold(1.0_f64, f64::max);
        self.terms
            .retain(|_, m| !(m.coeff.abs() <= ZERO_TOLERANCE * largest));
        self
    }

    /// Canonical form of an expression.
    pub fn from_expr(expr: &Expr) -> Polynomial {
        let result = match expr {
            Expr::Const(c) => Polynomial::constant(*c),
            Expr::Var(_) | Expr::Pi => Polynomial::from_monomial(Monomial::atom(expr.clone(), 1.0)),
            Expr::Add(lhs, rhs) => Polynomial::from_expr(lhs).add(&Polynomial::from_expr(rhs)),
            Expr::Sub(lhs, rhs) => {
                Polynomial::from_expr(lhs).add(&Polynomial::from_expr(rhs).scale(-1.0))
            }
            Expr::Mul(lhs, rhs) => Polynomial::from_expr(lhs).mul(&Polynomial::from_expr(rhs)),
            Expr::Div(lhs, rhs) => {
                Polynomial::from_expr(lhs).divide(&Polynomial::from_expr(rhs))
            }
            Expr::Pow(base, exp) => {
                let exponent = Polynomial::from_expr(exp);
                nested_even_power(base, &exponent)
                    .unwrap_or_else(|| Polynomial::from_expr(base).power(&exponent))
            }
            Expr::Exp(arg) => canonical_exp(&Polynomial::from_expr(arg)),
            Expr::Ln(arg) => canonical_ln(&Polynomial::from_expr(arg)),
            Expr::sin(arg) => canonical_sin(&Polynomial::from_expr(arg)),
            Expr::cos(arg) => canonical_cos(&Polynomial::from_expr(arg)),
            Expr::tg(arg) => {
                let arg = Polynomial::from_expr(arg);
                canonical_sin(&arg).divide(&canonical_cos(&arg))
            }
            Expr::Abs(arg) => canonical_abs(&Polynomial::from_expr(arg)),
        };
        result.reduce_pythagorean()
    }

    /// Collapses `c*sin(u)^2 + c*cos(u)^2` into `c` until no such pair is left.
    fn reduce_pythagorean(mut self) -> Polynomial {
        while let Some((sin_key, cos_key, cofactor)) = self.pythagorean_pair() {
            self.terms.remove(&sin_key);
            self.terms.remove(&cos_key);
            self = self.add(&Polynomial::from_monomial(cofactor));
        }
        self
    }

    /// keys of a `c*sin(u)^2`, `c*cos(u)^2` pair and their common part `c`
    fn pythagorean_pair(&self) -> Option<(String, String, Monomial)> {
        for (key, monomial) in &self.terms {
            for (base, power) in monomial.factors.values() {
                let Expr::sin(arg) = base else { continue };
                if !is_integer(*power) {
                    continue;
                }
                let cofactor = monomial.mul(&Monomial::atom(base.clone(), -2.0));
                let partner = cofactor.mul(&Monomial::atom(Expr::cos(arg.clone()), 2.0));
                let partner_key = partner.key();
                let Some(found) = self.terms.get(&partner_key) else { continue };
                if (found.coeff - monomial.coeff).abs() <= 1e-9 * monomial.coeff.abs().max(1.0) {
                    return Some((key.clone(), partner_key, cofactor));
                }
            }
        }
        None
    }

    /// Expression tree of the sum: positive terms first, constant term last
    /// within its sign group.
    pub fn to_expr(&self) -> Expr {
        let mut ordered: Vec<&Monomial> = Vec::with_capacity(self.terms.len());
        for positive in [true, false] {
            ordered.extend(
                self.terms
                    .values()
                    .filter(|m| (m.coeff > 0.0) == positive && !m.is_constant()),
            );
            ordered.extend(
                self.terms
                    .values()
                    .filter(|m| (m.coeff > 0.0) == positive && m.is_constant()),
            );
        }
        let mut iter = ordered.into_iter();
        let Some(first) = iter.next() else {
            return Expr::Const(0.0);
        };
        let mut result = first.to_expr();
        for monomial in iter {
            result = match monomial.to_unsigned_expr() {
                (true, expr) => result - expr,
                (false, expr) => result + expr,
            };
        }
        result
    }
}

fn is_even(power: f64) -> bool {
    is_integer(power) && (power.round() as i64) % 2 == 0
}

/// bases that can never be negative
fn is_non_negative(base: &Expr) -> bool {
    matches!(base, Expr::Pi | Expr::Exp(_) | Expr::Abs(_))
}

/// `(u^m)^n` for an even integer `m` and a fractional `n` is `|u|^(m*n)`; caught before
/// `u^m` is expanded so that `sqrt((x - 1)^2)` keeps its absolute value.
fn nested_even_power(base: &Expr, exponent: &Polynomial) -> Option<Polynomial> {
    let Expr::Pow(inner, inner_exponent) = base else {
        return None;
    };
    let n = exponent.as_constant()?;
    let m = Polynomial::from_expr(inner_exponent).as_constant()?;
    if !is_even(m) || is_integer(n) {
        return None;
    }
    let inner = Polynomial::from_expr(inner);
    let root = if is_even(m * n) { inner } else { canonical_abs(&inner) };
    Some(root.power(&Polynomial::constant(m * n)))
}

/// Splits `arg` into `k*pi + rest` when k is a multiple of 1/2.
/// Returns the number of quarter turns `round(2k) mod 4` and `rest`.
fn split_half_pi_multiple(arg: &Polynomial) -> (i64, Polynomial) {
    let pi_key = Monomial::atom(Expr::Pi, 1.0).key();
    match arg.terms.get(&pi_key) {
        Some(monomial) if is_integer(2.0 * monomial.coeff) => {
            let quarter_turns = ((2.0 * monomial.coeff).round() as i64).rem_euclid(4);
            let mut rest = arg.clone();
            rest.terms.remove(&pi_key);
            (quarter_turns, rest)
        }
        _ => (0, arg.clone()),
    }
}

/// `(true, -arg)` when the first non-constant term of `arg` has a negative coefficient
fn normalize_sign(arg: &Polynomial) -> (bool, Polynomial) {
    let leading = arg
        .terms
        .values()
        .find(|m| !m.is_constant())
        .or_else(|| arg.terms.values().next());
    match leading {
        Some(m) if m.coeff < 0.0 => (true, arg.scale(-1.0)),
        _ => (false, arg.clone()),
    }
}

fn function_atom(build: fn(Box<Expr>) -> Expr, arg: &Polynomial) -> Polynomial {
    Polynomial::from_monomial(Monomial::atom(build(arg.to_expr().boxed()), 1.0))
}

/// sin of an argument with no π shift
fn plain_sin(arg: &Polynomial) -> Polynomial {
    if arg.is_zero() {
        return Polynomial::zero();
    }
    let (negated, arg) = normalize_sign(arg);
    let result = function_atom(Expr::sin, &arg);
    if negated { result.scale(-1.0) } else { result }
}

/// cos of an argument with no π shift
fn plain_cos(arg: &Polynomial) -> Polynomial {
    if arg.is_zero() {
        return Polynomial::constant(1.0);
    }
    let (_, arg) = normalize_sign(arg);
    function_atom(Expr::cos, &arg)
}

pub(crate) fn canonical_sin(arg: &Polynomial) -> Polynomial {
    let (quarter_turns, rest) = split_half_pi_multiple(arg);
    match quarter_turns {
        0 => plain_sin(&rest),
        1 => plain_cos(&rest),
        2 => plain_sin(&rest).scale(-1.0),
        _ => plain_cos(&rest).scale(-1.0),
    }
}

pub(crate) fn canonical_cos(arg: &Polynomial) -> Polynomial {
    let (quarter_turns, rest) = split_half_pi_multiple(arg);
    match quarter_turns {
        0 => plain_cos(&rest),
        1 => plain_sin(&rest).scale(-1.0),
        2 => plain_cos(&rest).scale(-1.0),
        _ => plain_sin(&rest),
    }
}

pub(crate) fn canonical_exp(arg: &Polynomial) -> Polynomial {
    if arg.is_zero() {
        return Polynomial::constant(1.0);
    }
    // exp(k*ln(u)) = u^k
    if let Some(monomial) = arg.single_monomial() {
        if monomial.factors.len() == 1 {
            if let Some((Expr::Ln(inner), power)) = monomial.factors.values().next() {
                if *power != 1.0 {
                    return Polynomial::from_monomial(Monomial::atom(Expr::Exp(arg.to_expr().boxed()), 1.0));
                }
                return Polynomial::from_expr(inner).power(&Polynomial::constant(monomial.coeff));
            }
        }
    }
    Polynomial::from_monomial(Monomial::atom(Expr::Exp(arg.to_expr().boxed()), 1.0))
}

fn canonical_ln(arg: &Polynomial) -> Polynomial {
    if let Some(c) = arg.as_constant() {
        if c == 1.0 {
            return Polynomial::zero();
        }
        if c <= 0.0 {
            let value = if c == 0.0 { f64::NEG_INFINITY } else { f64::NAN };
            return Polynomial::constant(value);
        }
    }
    // ln(exp(u)^p) = p*u
    if let Some(monomial) = arg.single_monomial() {
        if monomial.coeff == 1.0 && monomial.factors.len() == 1 {
            if let Some((Expr::Exp(inner), power)) = monomial.factors.values().next() {
                return Polynomial::from_expr(inner).scale(*power);
            }
        }
    }
    function_atom(Expr::Ln, arg)
}

fn canonical_abs(arg: &Polynomial) -> Polynomial {
    if let Some(c) = arg.as_constant() {
        return Polynomial::constant(c.abs());
    }
    let (_, arg) = normalize_sign(arg);
    if let Some(monomial) = arg.single_monomial() {
        // |c * pi^k| = |c| * pi^k, the same for even powers
        let non_negative = monomial
            .factors
            .values()
            .all(|(base, power)| is_non_negative(base) || is_even(*power));
        if non_negative {
            return Polynomial::from_monomial(monomial.clone()).scale(1.0_f64.copysign(monomial.coeff));
        }
    }
    function_atom(Expr::Abs, &arg)
}

impl Expr {
    /// Canonical simplification.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let expr = Expr::parse_expression("(x + 1)^2 - x*(x + 2)").unwrap();
    /// assert_eq!(expr.simplify(), Expr::Const(1.0));
    /// ```
    pub fn simplify(&self) -> Expr {
        Polynomial::from_expr(self).to_expr()
    }

    /// true when the expression simplifies to exactly zero
    pub fn simplifies_to_zero(&self) -> bool {
        Polynomial::from_expr(self).is_zero()
    }
}

#[cfg(test)]
mod tests {
    use crate::symbolic::symbolic_engine::Expr;
    use approx::assert_relative_eq;

    fn parse(s: &str) -> Expr {
        Expr::parse_expression(s).unwrap()
    }

    #[test]
    fn test_like_terms() {
        assert_eq!(parse("3*x + 2*x").simplify(), parse("5*x").simplify());
        assert_eq!(parse("x*x^2").simplify(), parse("x^3").simplify());
        assert_eq!(parse("x - x").simplify(), Expr::Const(0.0));
    }

    #[test]
    fn test_ordering_independence() {
        assert_eq!(parse("y + x").simplify(), parse("x + y").simplify());
        assert_eq!(parse("z*y*x").simplify(), parse("x*y*z").simplify());
    }

    #[test]
    fn test_expansion() {
        assert_eq!(parse("(x + 1)^2 - x*(x + 2)").simplify(), Expr::Const(1.0));
        assert_eq!(parse("(x + y)*(x - y)").simplify(), parse("x^2 - y^2").simplify());
    }

    #[test]
    fn test_division() {
        assert_eq!(parse("x^3/x").simplify(), parse("x^2").simplify());
        assert_eq!(parse("(2*x + 2)/(x + 1)").simplify(), Expr::Const(2.0));
        assert_eq!(parse("(r*cos(theta))/r").simplify(), parse("cos(theta)").simplify());
    }

    #[test]
    fn test_trig_rules() {
        assert_eq!(parse("sin(pi)").simplify(), Expr::Const(0.0));
        assert_eq!(parse("cos(2*pi)").simplify(), Expr::Const(1.0));
        assert_eq!(parse("sin(pi/2)").simplify(), Expr::Const(1.0));
        assert_eq!(parse("cos(3*pi)").simplify(), Expr::Const(-1.0));
        assert_eq!(parse("sin(-x)").simplify(), parse("-sin(x)").simplify());
        assert_eq!(parse("cos(-x)").simplify(), parse("cos(x)").simplify());
        assert_eq!(parse("cos(x + pi)").simplify(), parse("-cos(x)").simplify());
        assert_eq!(parse("tan(x)*cos(x)").simplify(), parse("sin(x)").simplify());
    }

    #[test]
    fn test_exp_and_ln() {
        assert_eq!(parse("exp(0)").simplify(), Expr::Const(1.0));
        assert_eq!(parse("ln(1)").simplify(), Expr::Const(0.0));
        assert_eq!(parse("ln(exp(x))").simplify(), parse("x").simplify());
        assert_eq!(parse("exp(x)*exp(-x)").simplify(), Expr::Const(1.0));
        assert_eq!(parse("exp(2*ln(x))").simplify(), parse("x^2").simplify());
    }

    #[test]
    fn test_even_root_keeps_absolute_value() {
        assert_eq!(parse("sqrt(x^2)").simplify(), parse("abs(x)").simplify());
        assert_eq!(parse("sqrt(4*x^2)").simplify(), parse("2*abs(x)").simplify());
        assert_eq!(parse("sqrt((x - 1)^2)").simplify(), parse("abs(x - 1)").simplify());
        assert_eq!(parse("sqrt((1 - x)^2)").simplify(), parse("abs(x - 1)").simplify());
        assert_eq!(parse("(x^2)^(3/2)").simplify(), parse("abs(x)^3").simplify());
        // even result, no absolute value needed
        assert_eq!(parse("(x^4)^(1/2)").simplify(), parse("x^2").simplify());
        assert_eq!(parse("sqrt(exp(2*x))").simplify(), parse("exp(x)").simplify());
        let folded = parse("sqrt(x^2)").simplify();
        assert_relative_eq!(folded.eval_expression(&["x"], &[-3.0]), 3.0);
    }

    #[test]
    fn test_pythagorean_identity() {
        assert_eq!(parse("sin(t)^2 + cos(t)^2").simplify(), Expr::Const(1.0));
        assert_eq!(
            parse("r^2*cos(theta)^2 + r^2*sin(theta)^2").simplify(),
            parse("r^2").simplify()
        );
        // nested: spherical |(x, y, z)|^2
        let nested = parse(
            "rho^2*sin(phi)^2*cos(theta)^2 + rho^2*sin(phi)^2*sin(theta)^2 + rho^2*cos(phi)^2",
        );
        assert_eq!(nested.simplify(), parse("rho^2").simplify());
        assert_eq!(
            parse("cos(u)^2/sin(u) + sin(u)").simplify(),
            parse("1/sin(u)").simplify()
        );
        // unequal coefficients are left alone
        let uneven = parse("2*sin(t)^2 + cos(t)^2").simplify();
        assert_relative_eq!(uneven.eval_expression(&["t"], &[0.3]), 1.0 + 0.3_f64.sin().powi(2), epsilon = 1e-12);
    }

    #[test]
    fn test_pi_prints_as_fraction() {
        let expr = parse("4*pi/3").simplify();
        assert_eq!(expr.to_string(), "4*pi/3");
        assert_relative_eq!(expr.to_f64().unwrap(), 4.0 * std::f64::consts::PI / 3.0);
    }

    #[test]
    fn test_sqrt_of_square_number() {
        assert_eq!(parse("sqrt(4)").simplify(), Expr::Const(2.0));
        let root_two = parse("sqrt(2)*sqrt(2)").simplify();
        assert_eq!(root_two, Expr::Const(2.0));
    }

    #[test]
    fn test_value_preserved() {
        let expr = parse("(x + 2*y)^3/(x*y) - sin(x)^2 + exp(x)/exp(y)");
        let simplified = expr.simplify();
        let (vars, values) = (["x", "y"], [0.7, 1.3]);
        assert_relative_eq!(
            expr.eval_expression(&vars, &values),
            simplified.eval_expression(&vars, &values),
            epsilon = 1e-10
        );
    }
}
