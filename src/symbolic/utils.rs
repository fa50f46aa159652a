
// the collection of small numeric helpers used by the simplifier and the integrator

/// largest denominator tried when printing a coefficient as a fraction
pub const MAX_DENOMINATOR: i64 = 1000;

pub fn is_integer(x: f64) -> bool {
    x.is_finite() && (x - x.round()).abs() < 1e-9
}

/// Best rational approximation p/q of `x` with q <= MAX_DENOMINATOR, found with
/// continued fractions. Returns `None` when no such fraction reproduces `x`
/// to within a relative 1e-10.
pub fn as_fraction(x: f64) -> Option<(i64, i64)> {
    if !x.is_finite() || x.abs() > 1e12 {
        return None;
    }
    let tolerance = 1e-10 * x.abs().max(1.0);
    // convergents h/k
    let (mut h_prev, mut h) = (1i64, x.floor() as i64);
    let (mut k_prev, mut k) = (0i64, 1i64);
    let mut remainder = x - x.floor();
    loop {
        if (h as f64 / k as f64 - x).abs() <= tolerance {
            return Some((h, k));
        }
        if remainder.abs() < 1e-15 {
            return None;
        }
        let inverse = 1.0 / remainder;
        if inverse > MAX_DENOMINATOR as f64 {
            return None;
        }
        let a = inverse.floor() as i64;
        remainder = inverse - inverse.floor();
        let (h_next, k_next) = (a * h + h_prev, a * k + k_prev);
        if k_next > MAX_DENOMINATOR {
            return None;
        }
        (h_prev, h) = (h, h_next);
        (k_prev, k) = (k, k_next);
    }
}

/// true when `x` is an integer or a fraction with a small denominator
pub fn is_simple_rational(x: f64) -> bool {
    as_fraction(x).is_some()
}

/// n! / (n - k)!
pub fn falling_factorial(n: u32, k: u32) -> f64 {
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64)
}
