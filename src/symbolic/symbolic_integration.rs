use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_simplify::{
    Monomial, Polynomial, ZERO_TOLERANCE, canonical_cos, canonical_exp, canonical_sin,
};
use crate::symbolic::utils::{as_fraction, falling_factorial, is_integer};
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// sin^m(u) * cos^n(u) factors of a single monomial, all sharing one argument u
struct TrigProduct {
    key: String,
    arg: Polynomial,
    sin_power: i32,
    cos_power: i32,
}

/// The factors of a monomial that depend on the integration variable, sorted by kind.
#[derive(Default)]
struct Dependence {
    var_power: f64,
    trig: Option<TrigProduct>,
    exponential: Option<Polynomial>,
    /// `ln(v)` or `ln(|v|)`
    log_of_var: Option<Expr>,
    /// any other atom containing the variable, with its power
    other: Option<(Expr, f64)>,
}

impl Expr {
    /// SYMBOLIC INTEGRATION

    /// Indefinite integral with respect to `var` (without constant of integration).
    /// The expression is brought to canonical form and integrated term by term.
    ///
    /// Supported terms:
    /// - `v^p` (with `ln|v|` for p = -1)
    /// - `v^n * exp(a*v + b)`, `v^n * sin^k(a*v + b) * cos^m(a*v + b)` for integers n, k, m >= 0
    /// - `sin(u)/cos(u)`, `cos(u)/sin(u)`, `1/cos(u)^2`, `1/sin(u)^2` for linear u
    /// - `v^p * ln(v)`, `v^p * ln|v|`
    /// - `v^(m-1) * (a*v^m + b)^p` (substitution)
    ///
    /// Factors free of `var` are carried as constants. Anything else is an error.
    pub fn integrate(&self, var: &str) -> Result<Expr, String> {
        let canonical = Polynomial::from_expr(self);
        let mut result = Polynomial::zero();
        for monomial in canonical.terms.values() {
            result = result.add(&integrate_monomial(monomial, var)?);
        }
        Ok(result.to_expr())
    }

    /// ∫_lower^upper f d(var) = F(upper) - F(lower), simplified.
    /// Bounds may be expressions in the remaining variables.
    ///
    /// With numeric bounds every `|u(var)|` is split at the zeros of `u`, so that each
    /// piece is integrated with the right sign, and each piece is checked for poles: one
    /// inside (or a non-integrable one at an end) is an error.
    pub fn definite_integrate(&self, var: &str, lower: &Expr, upper: &Expr) -> Result<Expr, String> {
        let integrand = self.simplify();
        let (Some(a), Some(b)) = (lower.to_f64(), upper.to_f64()) else {
            return antiderivative_difference(&integrand, var, lower, upper);
        };
        let mut points = vec![(lower.clone(), a)];
        points.extend(abs_sign_changes(&integrand, var, a, b));
        points.push((upper.clone(), b));
        let mut total = Polynomial::zero();
        for piece in points.windows(2) {
            let ((lo, lo_value), (hi, hi_value)) = (&piece[0], &piece[1]);
            let resolved = resolve_abs(&integrand, var, (lo_value + hi_value) / 2.0);
            check_poles(&resolved, var, lo_value.min(*hi_value), lo_value.max(*hi_value))?;
            let value = antiderivative_difference(&resolved, var, lo, hi)?;
            total = total.add(&Polynomial::from_expr(&value));
        }
        Ok(total.to_expr())
    }
}

fn antiderivative_difference(integrand: &Expr, var: &str, lower: &Expr, upper: &Expr) -> Result<Expr, String> {
    let antiderivative = integrand.integrate(var)?;
    let value = antiderivative.substitute_variable(var, upper)
        - antiderivative.substitute_variable(var, lower);
    let value = Polynomial::from_expr(&value);
    if value.has_non_finite() {
        return Err(format!(
            "antiderivative {} is singular on [{}, {}]",
            antiderivative, lower, upper
        ));
    }
    Ok(value.to_expr())
}

/// samples taken when looking for zeros of a function of one variable
const ZERO_SEARCH_SAMPLES: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Zero {
    Endpoint(f64),
    Interior(f64),
}

/// `u` as a function of `var` alone; `None` when other variables are still free
fn univariate<'a>(u: &'a Expr, var: &'a str) -> Option<impl Fn(f64) -> f64 + 'a> {
    let variables = u.variables();
    (variables.len() == 1 && variables.contains(var)).then(|| move |t: f64| u.eval_expression(&[var], &[t]))
}

fn strip_abs(u: &Expr) -> &Expr {
    match u {
        Expr::Abs(inner) => strip_abs(inner),
        _ => u,
    }
}

/// Samples `u` on `[lo, hi]` and returns the sample points with their signs,
/// values within a relative 1e-9 of the largest one counting as zero.
fn sampled_signs(u: &dyn Fn(f64) -> f64, lo: f64, hi: f64) -> Vec<(f64, i8)> {
    let points: Vec<(f64, f64)> = (0..=ZERO_SEARCH_SAMPLES)
        .map(|i| {
            let t = if i == ZERO_SEARCH_SAMPLES {
                hi
            } else {
                lo + (hi - lo) * i as f64 / ZERO_SEARCH_SAMPLES as f64
            };
            (t, u(t))
        })
        .collect();
    let scale = points
        .iter()
        .map(|(_, v)| v.abs())
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max)
        .max(f64::MIN_POSITIVE);
    points
        .into_iter()
        .filter(|(_, v)| !v.is_nan())
        .map(|(t, v)| {
            let sign = if v.abs() <= 1e-9 * scale {
                0
            } else if v > 0.0 {
                1
            } else {
                -1
            };
            (t, sign)
        })
        .collect()
}

/// First zero of `u` on `[lo, hi]`, interior zeros reported before endpoint ones
fn find_zero(u: &Expr, var: &str, lo: f64, hi: f64) -> Option<Zero> {
    let f = univariate(u, var)?;
    let signs = sampled_signs(&f, lo, hi);
    for pair in signs.windows(2) {
        let ((t0, s0), (t1, s1)) = (pair[0], pair[1]);
        if s1 == 0 && t1 < hi {
            return Some(Zero::Interior(t1));
        }
        if s0 * s1 < 0 {
            return Some(Zero::Interior((t0 + t1) / 2.0));
        }
    }
    let at = |t: f64| signs.iter().any(|(s, sign)| *s == t && *sign == 0);
    if at(lo) {
        Some(Zero::Endpoint(lo))
    } else if at(hi) {
        Some(Zero::Endpoint(hi))
    } else {
        None
    }
}

/// Rejects a factor `g^p`, `p < 0`, whose base vanishes inside `[lo, hi]`, or at an end
/// when `p <= -1`. Bases that still hold other free variables are not checked.
fn check_poles(integrand: &Expr, var: &str, lo: f64, hi: f64) -> Result<(), String> {
    if lo == hi {
        return Ok(());
    }
    let canonical = Polynomial::from_expr(integrand);
    for monomial in canonical.terms.values() {
        for (base, power) in monomial.factors.values() {
            if *power >= 0.0 || !base.contains_variable(var) {
                continue;
            }
            let zero = match find_zero(strip_abs(base), var, lo, hi) {
                None => continue,
                Some(Zero::Endpoint(_)) if *power > -1.0 => continue,
                Some(Zero::Endpoint(t)) | Some(Zero::Interior(t)) => t,
            };
            return Err(format!(
                "integrand {} has a pole at {} = {} within [{}, {}]",
                integrand, var, zero, lo, hi
            ));
        }
    }
    Ok(())
}

/// arguments of `|u|` that depend on `var` alone, except those directly under `ln`
fn abs_arguments<'a>(expr: &'a Expr, var: &str, found: &mut Vec<&'a Expr>) {
    match expr {
        Expr::Ln(arg) if matches!(**arg, Expr::Abs(_)) => {
            if let Expr::Abs(inner) = &**arg {
                abs_arguments(inner, var, found);
            }
        }
        Expr::Abs(inner) => {
            abs_arguments(inner, var, found);
            if univariate(inner, var).is_some() {
                found.push(inner);
            }
        }
        _ => {
            for child in expr.children() {
                abs_arguments(child, var, found);
            }
        }
    }
}

/// Snaps a numerically found zero to a fraction or a fraction of π when that is exact
/// enough, so that the split point stays symbolic.
fn snap_zero(t: f64, u: &dyn Fn(f64) -> f64) -> Expr {
    let vanishes = |candidate: f64| u(candidate).abs() <= 1e-12;
    if let Some((p, q)) = as_fraction(t) {
        let candidate = p as f64 / q as f64;
        if vanishes(candidate) {
            return Polynomial::constant(candidate).to_expr();
        }
    }
    if let Some((p, q)) = as_fraction(t / PI) {
        if vanishes(p as f64 / q as f64 * PI) {
            return Polynomial::from_expr(&(Expr::Const(p as f64 / q as f64) * Expr::Pi)).to_expr();
        }
    }
    Expr::Const(t)
}

/// Interior points of `(a, b)`, in the direction from `a` to `b`, where the argument
/// of some `|u|` changes sign.
fn abs_sign_changes(integrand: &Expr, var: &str, a: f64, b: f64) -> Vec<(Expr, f64)> {
    let (lo, hi) = (a.min(b), a.max(b));
    if lo == hi {
        return Vec::new();
    }
    let mut arguments = Vec::new();
    abs_arguments(integrand, var, &mut arguments);
    let mut zeros: Vec<(Expr, f64)> = Vec::new();
    for argument in arguments {
        let Some(f) = univariate(argument, var) else { continue };
        let signs = sampled_signs(&f, lo, hi);
        for pair in signs.windows(2) {
            let ((t0, s0), (t1, s1)) = (pair[0], pair[1]);
            let t = if s1 == 0 && t1 > lo && t1 < hi {
                t1
            } else if s0 * s1 < 0 {
                bisect(&f, t0, t1)
            } else {
                continue;
            };
            if !zeros.iter().any(|(_, z)| (z - t).abs() <= 1e-9 * (hi - lo)) {
                zeros.push((snap_zero(t, &f), t));
            }
        }
    }
    zeros.sort_by(|x, y| x.1.total_cmp(&y.1));
    if a > b {
        zeros.reverse();
    }
    zeros
}

fn bisect(f: &dyn Fn(f64) -> f64, mut t0: f64, mut t1: f64) -> f64 {
    let negative_at_start = f(t0) < 0.0;
    for _ in 0..100 {
        let mid = (t0 + t1) / 2.0;
        if (f(mid) < 0.0) == negative_at_start {
            t0 = mid;
        } else {
            t1 = mid;
        }
    }
    (t0 + t1) / 2.0
}

/// Replaces each `|u|` that depends on `var` alone by `u` or `-u`, following the sign
/// of `u` at `at`. `ln|u|` is kept, it is integrated as it stands.
fn resolve_abs(expr: &Expr, var: &str, at: f64) -> Expr {
    match expr {
        Expr::Ln(arg) if matches!(**arg, Expr::Abs(_)) => {
            Expr::Ln(arg.map_children(|inner| resolve_abs(inner, var, at)).boxed())
        }
        Expr::Abs(inner) => {
            let inner = resolve_abs(inner, var, at);
            let value = univariate(&inner, var).map(|f| f(at));
            match value {
                Some(value) if value < 0.0 => -inner,
                Some(_) => inner,
                None => Expr::Abs(inner.boxed()),
            }
        }
        _ => expr.map_children(|child| resolve_abs(child, var, at)),
    }
}

fn no_closed_form(monomial: &Monomial, var: &str) -> String {
    format!(
        "no closed-form antiderivative of {} with respect to {}",
        monomial.to_expr(),
        var
    )
}

fn integrate_monomial(monomial: &Monomial, var: &str) -> Result<Polynomial, String> {
    let mut constant = Monomial::constant(monomial.coeff);
    let mut dependence = Dependence::default();
    for (base, power) in monomial.factors.values() {
        if !base.contains_variable(var) {
            constant = constant.mul(&Monomial::atom(base.clone(), *power));
            continue;
        }
        match base {
            Expr::Var(_) => dependence.var_power = *power,
            Expr::sin(arg) | Expr::cos(arg) if is_integer(*power) => {
                let arg_key = arg.to_string();
                let trig = dependence.trig.get_or_insert_with(|| TrigProduct {
                    key: arg_key.clone(),
                    arg: Polynomial::from_expr(arg),
                    sin_power: 0,
                    cos_power: 0,
                });
                if trig.key != arg_key {
                    return Err(no_closed_form(monomial, var));
                }
                if matches!(base, Expr::sin(_)) {
                    trig.sin_power += power.round() as i32;
                } else {
                    trig.cos_power += power.round() as i32;
                }
            }
            Expr::Exp(arg) if *power == 1.0 => {
                dependence.exponential = Some(Polynomial::from_expr(arg));
            }
            Expr::Ln(arg) if *power == 1.0 && is_var_or_its_abs(arg, var) => {
                dependence.log_of_var = Some((**arg).clone());
            }
            _ => {
                if dependence.other.is_some() {
                    return Err(no_closed_form(monomial, var));
                }
                dependence.other = Some((base.clone(), *power));
            }
        }
    }

    let Dependence {
        var_power,
        trig,
        exponential,
        log_of_var,
        other,
    } = dependence;
    let integral = match (trig, exponential, log_of_var, other) {
        (None, None, None, None) => Some(power_rule(var, var_power)),
        (None, None, Some(log_arg), None) => Some(log_rule(var, var_power, &log_arg)),
        (None, Some(arg), None, None) => non_negative_integer(var_power)
            .and_then(|n| power_times_exp(var, n, &arg)),
        (Some(trig), None, None, None) => {
            non_negative_integer(var_power).and_then(|n| power_times_trig(var, n, &trig))
        }
        (None, None, None, Some((base, power))) => substitution_rule(var, var_power, &base, power),
        _ => None,
    };
    integral
        .map(|integral| integral.mul_monomial(&constant))
        .ok_or_else(|| no_closed_form(monomial, var))
}

fn non_negative_integer(power: f64) -> Option<u32> {
    (is_integer(power) && power >= 0.0).then(|| power.round() as u32)
}

fn var_power(var: &str, power: f64) -> Polynomial {
    Polynomial::from_monomial(Monomial::atom(Expr::var(var), power))
}

fn reciprocal(p: &Polynomial) -> Polynomial {
    Polynomial::constant(1.0).divide(p)
}

fn is_var_or_its_abs(arg: &Expr, var: &str) -> bool {
    match arg {
        Expr::Var(name) => name == var,
        Expr::Abs(inner) => matches!(&**inner, Expr::Var(name) if name == var),
        _ => false,
    }
}

/// `ln(|u|)` in canonical form
fn ln_abs(u: Expr) -> Polynomial {
    Polynomial::from_expr(&Expr::Abs(u.boxed()).ln())
}

// ∫ v^p dv = v^(p+1)/(p+1), ∫ 1/v dv = ln|v|
fn power_rule(var: &str, power: f64) -> Polynomial {
    if (power + 1.0).abs() < ZERO_TOLERANCE {
        return ln_abs(Expr::var(var));
    }
    var_power(var, power + 1.0).scale(1.0 / (power + 1.0))
}

// ∫ v^p L dv = v^(p+1) L/(p+1) - v^(p+1)/(p+1)^2, ∫ L/v dv = L^2/2, with L = ln(v) or ln|v|
fn log_rule(var: &str, power: f64, log_arg: &Expr) -> Polynomial {
    let log = Polynomial::from_expr(&log_arg.clone().ln());
    if (power + 1.0).abs() < ZERO_TOLERANCE {
        return log.mul(&log).scale(0.5);
    }
    let n = power + 1.0;
    let raised = var_power(var, n);
    raised
        .mul(&log)
        .scale(1.0 / n)
        .add(&raised.scale(-1.0 / (n * n)))
}

/// `arg = a*v + b` with a, b free of `v`; returns `a`
fn linear_slope(arg: &Polynomial, var: &str) -> Option<Polynomial> {
    let var_key = Expr::var(var).to_string();
    let mut slope = Polynomial::zero();
    for monomial in arg.terms.values() {
        let depends = monomial
            .factors
            .values()
            .any(|(base, _)| base.contains_variable(var));
        if !depends {
            continue;
        }
        match monomial.factors.get(&var_key) {
            Some((_, power)) if *power == 1.0 => {
                let mut rest = monomial.clone();
                rest.factors.remove(&var_key);
                if rest.factors.values().any(|(base, _)| base.contains_variable(var)) {
                    return None;
                }
                slope = slope.add(&Polynomial::from_monomial(rest));
            }
            _ => return None,
        }
    }
    (!slope.is_zero()).then_some(slope)
}

/// `g = a*v^m + b`; returns (a, m)
fn single_power_term(g: &Polynomial, var: &str) -> Option<(Polynomial, f64)> {
    let var_key = Expr::var(var).to_string();
    let mut found = None;
    for monomial in g.terms.values() {
        let depends = monomial
            .factors
            .values()
            .any(|(base, _)| base.contains_variable(var));
        if !depends {
            continue;
        }
        if found.is_some() {
            return None;
        }
        let (_, m) = monomial.factors.get(&var_key)?;
        let mut rest = monomial.clone();
        rest.factors.remove(&var_key);
        if rest.factors.values().any(|(base, _)| base.contains_variable(var)) {
            return None;
        }
        found = Some((Polynomial::from_monomial(rest), *m));
    }
    found
}

// ∫ v^(m-1) g^p dv with g = a v^m + b:  g^(p+1) / (m a (p+1)),  ln|g|/(m a) for p = -1
fn substitution_rule(var: &str, var_power: f64, base: &Expr, power: f64) -> Option<Polynomial> {
    let g = Polynomial::from_expr(base);
    let (a, m) = single_power_term(&g, var)?;
    if (var_power - (m - 1.0)).abs() > ZERO_TOLERANCE {
        return None;
    }
    let scale = reciprocal(&a.scale(m));
    if (power + 1.0).abs() < ZERO_TOLERANCE {
        return Some(ln_abs(base.clone()).mul(&scale));
    }
    let raised = g.power(&Polynomial::constant(power + 1.0));
    Some(raised.mul(&scale).scale(1.0 / (power + 1.0)))
}

// ∫ v^n e^u dv = e^u Σ_k (-1)^k n!/(n-k)! v^(n-k) / a^(k+1),  u = a v + b
fn power_times_exp(var: &str, n: u32, arg: &Polynomial) -> Option<Polynomial> {
    let inverse_slope = reciprocal(&linear_slope(arg, var)?);
    let mut series = Polynomial::zero();
    let mut slope_power = inverse_slope.clone();
    for k in 0..=n {
        let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
        let term = var_power(var, (n - k) as f64)
            .mul(&slope_power)
            .scale(sign * falling_factorial(n, k));
        series = series.add(&term);
        slope_power = slope_power.mul(&inverse_slope);
    }
    Some(canonical_exp(arg).mul(&series))
}

/// sin^m(u) cos^n(u) as Σ_k C_k cos(k u) + S_k sin(k u)
fn linearize(sin_power: u32, cos_power: u32) -> BTreeMap<i32, (f64, f64)> {
    fn accumulate(series: &mut BTreeMap<i32, (f64, f64)>, k: i32, c: f64, s: f64) {
        // cos(-ku) = cos(ku), sin(-ku) = -sin(ku)
        let (k, s) = if k < 0 { (-k, -s) } else { (k, s) };
        let entry = series.entry(k).or_insert((0.0, 0.0));
        entry.0 += c;
        entry.1 += s;
    }

    let mut series = BTreeMap::from([(0, (1.0, 0.0))]);
    let factors = std::iter::repeat_n(true, sin_power as usize)
        .chain(std::iter::repeat_n(false, cos_power as usize));
    for by_sin in factors {
        let mut next = BTreeMap::new();
        for (k, (c, s)) in series {
            if by_sin {
                // cos(ku) sin(u) = [sin((k+1)u) - sin((k-1)u)]/2
                // sin(ku) sin(u) = [cos((k-1)u) - cos((k+1)u)]/2
                accumulate(&mut next, k + 1, -s / 2.0, c / 2.0);
                accumulate(&mut next, k - 1, s / 2.0, -c / 2.0);
            } else {
                // cos(ku) cos(u) = [cos((k+1)u) + cos((k-1)u)]/2
                // sin(ku) cos(u) = [sin((k+1)u) + sin((k-1)u)]/2
                accumulate(&mut next, k + 1, c / 2.0, s / 2.0);
                accumulate(&mut next, k - 1, c / 2.0, s / 2.0);
            }
        }
        series = next;
    }
    series.retain(|_, (c, s)| c.abs() > ZERO_TOLERANCE || s.abs() > ZERO_TOLERANCE);
    series
}

/// (∫ v^p cos(w) dv, ∫ v^p sin(w) dv) for w = α v + β, from the real and
/// imaginary parts of ∫ v^p e^(iw) dv = e^(iw) Σ_j (-1)^j p!/(p-j)! v^(p-j) / (iα)^(j+1)
fn power_times_harmonic(
    var: &str,
    p: u32,
    w: &Polynomial,
    inverse_alpha: &Polynomial,
) -> (Polynomial, Polynomial) {
    let sin_w = canonical_sin(w);
    let cos_w = canonical_cos(w);
    let mut cos_integral = Polynomial::zero();
    let mut sin_integral = Polynomial::zero();
    let mut alpha_power = inverse_alpha.clone();
    for j in 0..=p {
        let sign = if j % 2 == 0 { 1.0 } else { -1.0 };
        let coefficient = var_power(var, (p - j) as f64)
            .mul(&alpha_power)
            .scale(sign * falling_factorial(p, j));
        // e^(iw) (-i)^(j+1)
        let (real, imaginary) = match (j + 1) % 4 {
            1 => (sin_w.clone(), cos_w.scale(-1.0)),
            2 => (cos_w.scale(-1.0), sin_w.scale(-1.0)),
            3 => (sin_w.scale(-1.0), cos_w.clone()),
            _ => (cos_w.clone(), sin_w.clone()),
        };
        cos_integral = cos_integral.add(&coefficient.mul(&real));
        sin_integral = sin_integral.add(&coefficient.mul(&imaginary));
        alpha_power = alpha_power.mul(inverse_alpha);
    }
    (cos_integral, sin_integral)
}

fn power_times_trig(var: &str, p: u32, trig: &TrigProduct) -> Option<Polynomial> {
    let inverse_slope = reciprocal(&linear_slope(&trig.arg, var)?);
    let u = &trig.arg;
    if trig.sin_power < 0 || trig.cos_power < 0 {
        return (p == 0)
            .then(|| reciprocal_trig(u, trig.sin_power, trig.cos_power))
            .flatten()
            .map(|integral| integral.mul(&inverse_slope));
    }

    let mut result = Polynomial::zero();
    for (k, (c, s)) in linearize(trig.sin_power as u32, trig.cos_power as u32) {
        if k == 0 {
            result = result.add(&power_rule(var, p as f64).scale(c));
            continue;
        }
        let w = u.scale(k as f64);
        let inverse_alpha = inverse_slope.scale(1.0 / k as f64);
        let (cos_integral, sin_integral) = power_times_harmonic(var, p, &w, &inverse_alpha);
        result = result
            .add(&cos_integral.scale(c))
            .add(&sin_integral.scale(s));
    }
    Some(result)
}

/// antiderivatives in u of the supported quotients of sin and cos
fn reciprocal_trig(u: &Polynomial, sin_power: i32, cos_power: i32) -> Option<Polynomial> {
    let sin_u = canonical_sin(u);
    let cos_u = canonical_cos(u);
    let ln = |p: &Polynomial| ln_abs(p.to_expr());
    match (sin_power, cos_power) {
        // tan: -ln|cos u|
        (1, -1) => Some(ln(&cos_u).scale(-1.0)),
        // cot: ln|sin u|
        (-1, 1) => Some(ln(&sin_u)),
        // sec^2: tan u
        (0, -2) => Some(sin_u.divide(&cos_u)),
        // csc^2: -cot u
        (-2, 0) => Some(cos_u.divide(&sin_u).scale(-1.0)),
        _ => None,
    }
}

#[cfg(test)]
mod integration_tests {

    use crate::symbolic::symbolic_engine::Expr;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn parse(s: &str) -> Expr {
        Expr::parse_expression(s).unwrap()
    }

    /// F' must reproduce f at a sample point
    fn check_antiderivative(f: &str, var: &str, at: f64) {
        let f = parse(f);
        let antiderivative = f.integrate(var).unwrap();
        let derivative = antiderivative.diff(var);
        assert_relative_eq!(
            derivative.eval_expression(&[var], &[at]),
            f.eval_expression(&[var], &[at]),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_integrate_constant() {
        // ∫ 5 dx = 5x
        let result = Expr::Const(5.0).integrate("x").unwrap();
        assert_eq!(result, (Expr::Const(5.0) * Expr::var("x")).simplify());
    }

    #[test]
    fn test_integrate_variable() {
        // ∫ x dx = x²/2
        let result = Expr::var("x").integrate("x").unwrap();
        assert_eq!(result, (Expr::var("x").powf(2.0) / Expr::Const(2.0)).simplify());
    }

    #[test]
    fn test_integrate_different_variable() {
        // ∫ y dx = y*x (y is treated as constant)
        let result = Expr::var("y").integrate("x").unwrap();
        assert_eq!(result, (Expr::var("y") * Expr::var("x")).simplify());
    }

    #[test]
    fn test_integrate_reciprocal() {
        // ∫ 1/x dx = ln|x|
        let result = parse("1/x").integrate("x").unwrap();
        assert_eq!(result, parse("ln(abs(x))").simplify());
    }

    #[test]
    fn test_reciprocal_on_negative_interval() {
        // ∫_-2^-1 1/x dx = -ln(2)
        let result = parse("1/x")
            .definite_integrate("x", &Expr::Const(-2.0), &Expr::Const(-1.0))
            .unwrap();
        assert_relative_eq!(result.to_f64().unwrap(), -(2.0_f64.ln()), epsilon = 1e-12);
        // ∫_-1^0 1/(2x - 3) dx = ln(3/5)/2
        let result = parse("1/(2*x - 3)")
            .definite_integrate("x", &Expr::Const(-1.0), &Expr::Const(0.0))
            .unwrap();
        assert_relative_eq!(result.to_f64().unwrap(), (3.0_f64 / 5.0).ln() / 2.0, epsilon = 1e-12);
        check_antiderivative("ln(abs(x))", "x", -1.5);
    }

    #[test]
    fn test_pole_inside_interval_is_error() {
        for (f, lower, upper) in [("1/x^2", -1.0, 1.0), ("1/x", -1.0, 1.0), ("1/(x - 1/2)", 0.0, 1.0)] {
            let err = parse(f)
                .definite_integrate("x", &Expr::Const(lower), &Expr::Const(upper))
                .unwrap_err();
            assert!(err.contains("pole"), "{}: {}", f, err);
        }
        // tan has a pole at pi/2
        assert!(parse("tan(x)")
            .definite_integrate("x", &Expr::Const(0.0), &Expr::Const(2.0))
            .is_err());
        // integrable at the end of the interval
        let result = parse("1/sqrt(x)")
            .definite_integrate("x", &Expr::Const(0.0), &Expr::Const(4.0))
            .unwrap();
        assert_relative_eq!(result.to_f64().unwrap(), 4.0, epsilon = 1e-12);
        // the pole lies outside
        let result = parse("1/x^2")
            .definite_integrate("x", &Expr::Const(1.0), &Expr::Const(2.0))
            .unwrap();
        assert_relative_eq!(result.to_f64().unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_absolute_value_split_at_sign_change() {
        let definite = |f: &str, lower: Expr, upper: Expr| {
            parse(f).definite_integrate("x", &lower, &upper).unwrap()
        };
        // ∫_-1^1 |x| dx = 1
        assert_eq!(definite("sqrt(x^2)", Expr::Const(-1.0), Expr::Const(1.0)), Expr::Const(1.0));
        // ∫_0^3 |x - 1| dx = 1/2 + 2
        let value = definite("sqrt((x - 1)^2)", Expr::Const(0.0), Expr::Const(3.0));
        assert_relative_eq!(value.to_f64().unwrap(), 2.5, epsilon = 1e-12);
        // reversed limits flip the sign
        let value = definite("abs(x)", Expr::Const(1.0), Expr::Const(-1.0));
        assert_relative_eq!(value.to_f64().unwrap(), -1.0, epsilon = 1e-12);
        // ∫_0^2π |sin x| dx = 4, split at pi
        let value = definite("abs(sin(x))", Expr::Const(0.0), Expr::Const(2.0) * Expr::Pi);
        assert_eq!(value, Expr::Const(4.0));
    }

    #[test]
    fn test_antiderivatives_by_differentiation() {
        check_antiderivative("x^2 - 3*x + 1", "x", 1.7);
        check_antiderivative("x*exp(2*x)", "x", 0.3);
        check_antiderivative("x^2*sin(3*x + 1)", "x", 0.8);
        check_antiderivative("sin(x)^3", "x", 0.4);
        check_antiderivative("sin(x)^2*cos(x)^2", "x", 1.1);
        check_antiderivative("x*cos(x)^2", "x", 0.6);
        check_antiderivative("x^2*ln(x)", "x", 2.0);
        check_antiderivative("tan(x)", "x", 0.5);
        check_antiderivative("x*sqrt(1 - x^2)", "x", 0.5);
        check_antiderivative("1/(2*x + 1)", "x", 0.5);
        check_antiderivative("2^x", "x", 1.5);
    }

    #[test]
    fn test_definite_polynomial() {
        // ∫_0^1 x² dx = 1/3
        let result = parse("x^2").definite_integrate("x", &Expr::Const(0.0), &Expr::Const(1.0));
        assert_relative_eq!(result.unwrap().to_f64().unwrap(), 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_definite_trig_is_exact() {
        // ∫_0^π sin(φ) dφ = 2
        let result = parse("sin(phi)")
            .definite_integrate("phi", &Expr::Const(0.0), &Expr::Pi)
            .unwrap();
        assert_eq!(result, Expr::Const(2.0));
        // ∫_0^2π cos(θ)^2 dθ = π
        let result = parse("cos(theta)^2")
            .definite_integrate("theta", &Expr::Const(0.0), &(Expr::Const(2.0) * Expr::Pi))
            .unwrap();
        assert_eq!(result, Expr::Pi);
    }

    #[test]
    fn test_definite_with_symbolic_bound() {
        // ∫_0^x t dt = x²/2
        let result = parse("t")
            .definite_integrate("t", &Expr::Const(0.0), &Expr::var("x"))
            .unwrap();
        assert_eq!(result, parse("x^2/2").simplify());
    }

    #[test]
    fn test_singular_bound_is_error() {
        assert!(parse("1/x")
            .definite_integrate("x", &Expr::Const(0.0), &Expr::Const(1.0))
            .is_err());
    }

    #[test]
    fn test_unsupported_integrand() {
        assert!(parse("exp(x^2)").integrate("x").is_err());
        assert!(parse("sin(x)*exp(x)").integrate("x").is_err());
        assert!(parse("sqrt(1 - x^2)").integrate("x").is_err());
    }

    #[test]
    fn test_pi_in_result() {
        // ∫_0^2π 2/3 dθ = 4π/3
        let result = parse("2/3")
            .definite_integrate("theta", &Expr::Const(0.0), &(Expr::Const(2.0) * Expr::Pi))
            .unwrap();
        assert_relative_eq!(result.to_f64().unwrap(), 4.0 * PI / 3.0, epsilon = 1e-12);
        assert_eq!(result.to_string(), "4*pi/3");
    }
}
