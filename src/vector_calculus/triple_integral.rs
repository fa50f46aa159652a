//! # Triple integrals
//!
//! The function is parsed, carried into the chosen coordinate system, multiplied by the
//! Jacobian and integrated one variable at a time (innermost first). The same nested
//! integration routine, [`integrate_iterated`], drives every theorem applier.
use crate::symbolic::symbolic_engine::Expr;
use crate::vector_calculus::coordinates::{CARTESIAN_VARIABLES, CoordinateSystem, PHI};
use crate::vector_calculus::errors::CalcError;
use crate::vector_calculus::trace::DerivationTrace;
use log::{info, warn};
use std::f64::consts::PI;

/// A pair of numeric limits. Always stored low-to-high, whatever order it was given in.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub lower: Expr,
    pub upper: Expr,
    lower_value: f64,
    upper_value: f64,
    swapped: bool,
}

impl Bounds {
    /// Both limits must evaluate to finite numbers (`pi`, `2*pi` are fine).
    pub fn new(lower: Expr, upper: Expr) -> Result<Self, CalcError> {
        let value_of = |e: &Expr| {
            e.to_f64()
                .filter(|v| v.is_finite())
                .ok_or_else(|| CalcError::InvalidBounds(format!("'{}' is not a finite number", e)))
        };
        let (a, b) = (value_of(&lower)?, value_of(&upper)?);
        if a <= b {
            Ok(Bounds {
                lower,
                upper,
                lower_value: a,
                upper_value: b,
                swapped: false,
            })
        } else {
            Ok(Bounds {
                lower: upper,
                upper: lower,
                lower_value: b,
                upper_value: a,
                swapped: true,
            })
        }
    }

    pub fn from_strs(lower: &str, upper: &str) -> Result<Self, CalcError> {
        let lower = Expr::parse_with_variables(lower, &[])?;
        let upper = Expr::parse_with_variables(upper, &[])?;
        Bounds::new(lower, upper)
    }

    pub fn from_values(lower: f64, upper: f64) -> Result<Self, CalcError> {
        Bounds::new(Expr::Const(lower), Expr::Const(upper))
    }

    pub fn values(&self) -> (f64, f64) {
        (self.lower_value, self.upper_value)
    }

    /// true when the pair was given high-to-low and has been sorted
    pub fn was_swapped(&self) -> bool {
        self.swapped
    }

    pub fn limit_for(&self, variable: &str) -> IntegrationLimit {
        IntegrationLimit::new(variable, self.lower.clone(), self.upper.clone())
    }
}

/// One step of a nested integral: `variable` runs from `lower` to `upper`. Limits may
/// depend on variables integrated later.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationLimit {
    pub variable: String,
    pub lower: Expr,
    pub upper: Expr,
}

impl IntegrationLimit {
    pub fn new(variable: &str, lower: Expr, upper: Expr) -> Self {
        IntegrationLimit {
            variable: variable.to_string(),
            lower,
            upper,
        }
    }

    /// Limit with numeric ends, e.g. `(r, 0, R)`
    pub fn numeric(variable: &str, lower: f64, upper: f64) -> Self {
        IntegrationLimit::new(variable, Expr::Const(lower), Expr::Const(upper))
    }

    /// `(theta, 0, 2*pi)`
    pub fn full_turn(variable: &str) -> Self {
        IntegrationLimit::new(variable, Expr::Const(0.0), Expr::Const(2.0) * Expr::Pi)
    }

    /// `(phi, 0, pi)`
    pub fn half_turn(variable: &str) -> Self {
        IntegrationLimit::new(variable, Expr::Const(0.0), Expr::Pi)
    }

    /// Parses `lower` and `upper`; they may use any of `allowed`.
    pub fn parse(variable: &str, lower: &str, upper: &str, allowed: &[&str]) -> Result<Self, CalcError> {
        Ok(IntegrationLimit::new(
            variable,
            Expr::parse_with_variables(lower, allowed)?,
            Expr::parse_with_variables(upper, allowed)?,
        ))
    }

    fn label(&self) -> String {
        format!("integrate d{} from {} to {}", self.variable, self.lower, self.upper)
    }
}

/// Integrates `integrand` over `limits`, taken innermost first. Every partial result
/// lands in the trace. `factor_for` may hand back a factor that multiplies the running
/// integrand right before its variable is integrated.
pub fn integrate_iterated_with<F>(
    integrand: &Expr,
    limits: &[IntegrationLimit],
    trace: &mut DerivationTrace,
    factor_for: F,
) -> Result<Expr, CalcError>
where
    F: Fn(&str) -> Option<Expr>,
{
    let mut current = integrand.clone();
    for (i, limit) in limits.iter().enumerate() {
        if let Some(factor) = factor_for(&limit.variable) {
            current = (current * factor).simplify();
            trace.push_expression(&format!("multiply by volume factor for {}", limit.variable), &current);
        }
        current = current
            .definite_integrate(&limit.variable, &limit.lower, &limit.upper)
            .map_err(|message| CalcError::IntegrationFailure {
                step: i + 1,
                variable: limit.variable.clone(),
                message,
            })?;
        trace.push_expression(&limit.label(), &current);
    }
    Ok(current.simplify())
}

pub fn integrate_iterated(
    integrand: &Expr,
    limits: &[IntegrationLimit],
    trace: &mut DerivationTrace,
) -> Result<Expr, CalcError> {
    integrate_iterated_with(integrand, limits, trace, |_| None)
}

/// Final symbolic result of a calculation and the derivation that led to it
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationResult {
    pub result: Expr,
    pub trace: DerivationTrace,
}

impl CalculationResult {
    /// numeric value when the result is closed (no free variables)
    pub fn value(&self) -> Option<f64> {
        self.result.to_f64()
    }
}

/// Rejects negative radii and polar angles outside `[0, pi]`.
fn check_native_range(system: CoordinateSystem, variable: &str, bounds: &Bounds) -> Result<(), CalcError> {
    let (lower, upper) = bounds.values();
    if system.radial_variable() == Some(variable) && lower < 0.0 {
        return Err(CalcError::InvalidBounds(format!(
            "radial coordinate {} cannot be negative (got {})",
            variable, lower
        )));
    }
    if system == CoordinateSystem::Spherical && variable == PHI && (lower < 0.0 || upper > PI + 1e-12) {
        return Err(CalcError::InvalidBounds(format!(
            "polar angle phi must stay within [0, pi] (got [{}, {}])",
            lower, upper
        )));
    }
    Ok(())
}

/// Triple integral of `function` over the box `bounds` given in the native variables of
/// `system`, in bound order (`x, y, z` / `r, theta, z` / `rho, phi, theta`).
///
/// The function may be written with Cartesian variables, native variables or both;
/// Cartesian ones are substituted before the Jacobian is multiplied in.
pub fn evaluate(
    function: &str,
    system: CoordinateSystem,
    bounds: [Bounds; 3],
) -> Result<CalculationResult, CalcError> {
    let mut allowed: Vec<&str> = CARTESIAN_VARIABLES.to_vec();
    allowed.extend(system.native_variables());
    let f = Expr::parse_with_variables(function, &allowed)?;
    info!("triple integral of {} in {} coordinates", f, system);

    let mut trace = DerivationTrace::new();
    trace.push_text("coordinate system", &system.to_string());
    trace.push_expression("function", &f);

    let natives = system.native_variables();
    for (variable, pair) in natives.iter().zip(bounds.iter()) {
        check_native_range(system, variable, pair)?;
        if pair.was_swapped() {
            warn!("bounds for {} given high-to-low, sorted", variable);
            trace.push_text(
                &format!("sorted bounds for {}", variable),
                &format!("[{}, {}]", pair.lower, pair.upper),
            );
        }
    }

    let integrand = if system == CoordinateSystem::Rectangular {
        f.simplify()
    } else {
        let transformed = system.transform(&f).simplify();
        trace.push_expression("function in native variables", &transformed);
        let jacobian = system.jacobian();
        trace.push_expression("jacobian", &jacobian);
        (transformed * jacobian).simplify()
    };
    trace.push_expression("integrand", &integrand);

    let limits: Vec<IntegrationLimit> = system
        .integration_order()
        .iter()
        .map(|variable| {
            let position = natives.iter().position(|v| v == variable).unwrap_or(0);
            bounds[position].limit_for(variable)
        })
        .collect();

    let result = integrate_iterated(&integrand, &limits, &mut trace)?;
    trace.push_expression("result", &result);
    info!("result: {}", result);
    Ok(CalculationResult { result, trace })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn b(lower: &str, upper: &str) -> Bounds {
        Bounds::from_strs(lower, upper).unwrap()
    }

    #[test]
    fn test_bounds_are_sorted() {
        let pair = b("1", "0");
        assert!(pair.was_swapped());
        assert_eq!(pair.values(), (0.0, 1.0));
        let pair = b("0", "2*pi");
        assert!(!pair.was_swapped());
        assert_relative_eq!(pair.values().1, 2.0 * PI);
    }

    #[test]
    fn test_bounds_must_be_numbers() {
        assert!(matches!(Bounds::from_strs("0", "x"), Err(CalcError::Parse(_))));
        assert!(matches!(
            Bounds::from_values(0.0, f64::INFINITY),
            Err(CalcError::InvalidBounds(_))
        ));
        assert!(matches!(Bounds::from_strs("1/0", "1"), Err(CalcError::InvalidBounds(_))));
    }

    #[test]
    fn test_polynomial_over_unit_cube() {
        let res = evaluate(
            "x^2 + y^2 + z^2",
            CoordinateSystem::Rectangular,
            [b("0", "1"), b("0", "1"), b("0", "1")],
        )
        .unwrap();
        assert_relative_eq!(res.value().unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(
            &res.trace.labels()[3..6],
            &[
                "integrate dz from 0 to 1",
                "integrate dy from 0 to 1",
                "integrate dx from 0 to 1"
            ]
        );
    }

    #[test]
    fn test_order_of_z_bounds_does_not_matter() {
        let forward = evaluate(
            "x*y + z",
            CoordinateSystem::Rectangular,
            [b("0", "2"), b("-1", "1"), b("0", "1")],
        )
        .unwrap();
        let backward = evaluate(
            "x*y + z",
            CoordinateSystem::Rectangular,
            [b("0", "2"), b("-1", "1"), b("1", "0")],
        )
        .unwrap();
        assert_eq!(forward.result, backward.result);
        assert!(backward.trace.labels().contains(&"sorted bounds for z"));
    }

    #[test]
    fn test_unit_ball_in_spherical() {
        let res = evaluate(
            "1",
            CoordinateSystem::Spherical,
            [b("0", "1"), b("0", "pi"), b("0", "2*pi")],
        )
        .unwrap();
        assert_relative_eq!(res.value().unwrap(), 4.0 * PI / 3.0, epsilon = 1e-12);
        assert_eq!(res.result.to_string(), "4*pi/3");
    }

    #[test]
    fn test_radial_function_in_cylindrical() {
        // x^2 + y^2 over the cylinder r <= 1, 0 <= z <= 1 is pi/2
        let res = evaluate(
            "x^2 + y^2",
            CoordinateSystem::Cylindrical,
            [b("0", "1"), b("0", "2*pi"), b("0", "1")],
        )
        .unwrap();
        assert_relative_eq!(res.value().unwrap(), PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_radial_distance_in_curvilinear_systems() {
        // distance to the z axis over the cylinder r <= 1, 0 <= z <= 1: 2*pi/3
        let cylinder = evaluate(
            "sqrt(x^2 + y^2)",
            CoordinateSystem::Cylindrical,
            [b("0", "1"), b("0", "2*pi"), b("0", "1")],
        )
        .unwrap();
        assert_relative_eq!(cylinder.value().unwrap(), 2.0 * PI / 3.0, epsilon = 1e-12);
        assert_eq!(cylinder.trace.steps()[2].content.to_string(), Expr::Abs(Expr::var("r").boxed()).to_string());

        // distance to the origin over the unit ball: pi
        let ball = evaluate(
            "sqrt(x^2 + y^2 + z^2)",
            CoordinateSystem::Spherical,
            [b("0", "1"), b("0", "pi"), b("0", "2*pi")],
        )
        .unwrap();
        assert_relative_eq!(ball.value().unwrap(), PI, epsilon = 1e-12);
    }

    #[test]
    fn test_sign_changing_integrand() {
        // |x| over [-1, 1] x [0, 1] x [0, 1]
        let res = evaluate(
            "sqrt(x^2)",
            CoordinateSystem::Rectangular,
            [b("-1", "1"), b("0", "1"), b("0", "1")],
        )
        .unwrap();
        assert_eq!(res.result, Expr::Const(1.0));
        let res = evaluate(
            "sqrt((z - 1)^2)",
            CoordinateSystem::Rectangular,
            [b("0", "1"), b("0", "1"), b("0", "3")],
        )
        .unwrap();
        assert_relative_eq!(res.value().unwrap(), 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_reciprocal_over_negative_box() {
        let res = evaluate(
            "1/x",
            CoordinateSystem::Rectangular,
            [b("-2", "-1"), b("0", "1"), b("0", "1")],
        )
        .unwrap();
        assert_relative_eq!(res.value().unwrap(), -(2.0_f64.ln()), epsilon = 1e-12);
    }

    #[test]
    fn test_pole_inside_box_is_failure() {
        let err = evaluate(
            "1/x^2",
            CoordinateSystem::Rectangular,
            [b("-1", "1"), b("0", "1"), b("0", "1")],
        )
        .unwrap_err();
        match err {
            CalcError::IntegrationFailure { step, variable, message } => {
                assert_eq!(step, 3);
                assert_eq!(variable, "x");
                assert!(message.contains("pole"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_negative_radius_rejected() {
        let err = evaluate(
            "1",
            CoordinateSystem::Cylindrical,
            [b("-1", "1"), b("0", "2*pi"), b("0", "1")],
        )
        .unwrap_err();
        assert!(matches!(err, CalcError::InvalidBounds(_)));
    }

    #[test]
    fn test_unknown_variable_is_a_parse_error() {
        let err = evaluate(
            "x + w",
            CoordinateSystem::Rectangular,
            [b("0", "1"), b("0", "1"), b("0", "1")],
        )
        .unwrap_err();
        match err {
            CalcError::Parse(e) => assert_eq!(e.fragment.as_deref(), Some("w")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_integration_failure_reports_step() {
        // exp(z^2) has no antiderivative in the table
        let err = evaluate(
            "exp(z^2)",
            CoordinateSystem::Rectangular,
            [b("0", "1"), b("0", "1"), b("0", "1")],
        )
        .unwrap_err();
        match err {
            CalcError::IntegrationFailure { step, variable, .. } => {
                assert_eq!(step, 1);
                assert_eq!(variable, "z");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
