use crate::symbolic::symbolic_engine::Expr;
use crate::vector_calculus::coordinates::{CoordinateSystem, R, THETA, X, Y};
use crate::vector_calculus::differential_operators::green_integrand;
use crate::vector_calculus::errors::CalcError;
use crate::vector_calculus::regions::{RegionDescriptor, ShapeTag};
use crate::vector_calculus::theorems::{
    HandlerRecord, RECTANGULAR_CYLINDRICAL, RECTANGULAR_ONLY, Theorem, find_handler, shifted,
};
use crate::vector_calculus::trace::DerivationTrace;
use crate::vector_calculus::triple_integral::{CalculationResult, IntegrationLimit, integrate_iterated};
use log::{info, warn};

type GreenHandler =
    fn(&Expr, &RegionDescriptor, CoordinateSystem, &mut DerivationTrace) -> Result<Expr, CalcError>;

pub const GREEN_HANDLERS: &[HandlerRecord<GreenHandler>] = &[
    HandlerRecord {
        shape: ShapeTag::Rectangle,
        systems: RECTANGULAR_CYLINDRICAL,
        handler: rectangle,
    },
    HandlerRecord {
        shape: ShapeTag::Disk,
        systems: RECTANGULAR_CYLINDRICAL,
        handler: disk,
    },
    HandlerRecord {
        shape: ShapeTag::Ellipse,
        systems: RECTANGULAR_ONLY,
        handler: ellipse,
    },
    HandlerRecord {
        shape: ShapeTag::Custom,
        systems: RECTANGULAR_CYLINDRICAL,
        handler: custom,
    },
];

/// Double integral of `dQ/dx - dP/dy` over the region (or `d(rQ)/dr - dP/dtheta` in
/// polar form, where `P`, `Q` are the radial and angular components).
pub fn apply(
    p: &Expr,
    q: &Expr,
    region: &RegionDescriptor,
    system: CoordinateSystem,
) -> Result<CalculationResult, CalcError> {
    let handler = find_handler(GREEN_HANDLERS, Theorem::Green, region.shape, system)?;
    region.warn_unknown_parameters();
    info!("Green's theorem over {} in {} coordinates", region.shape, system);

    let mut trace = DerivationTrace::new();
    trace.push_text("region", &region.shape.to_string());
    trace.push_text("coordinate system", &system.to_string());
    trace.push_expression("P", p);
    trace.push_expression("Q", q);
    let integrand = green_integrand(p, q, system)?;
    let label = if system == CoordinateSystem::Rectangular {
        "dQ/dx - dP/dy"
    } else {
        "d(rQ)/dr - dP/dtheta"
    };
    trace.push_expression(label, &integrand);

    let result = handler(&integrand, region, system, &mut trace)?;
    trace.push_expression("result", &result);
    info!("result: {}", result);
    Ok(CalculationResult { result, trace })
}

fn rectangle(
    integrand: &Expr,
    region: &RegionDescriptor,
    system: CoordinateSystem,
    trace: &mut DerivationTrace,
) -> Result<Expr, CalcError> {
    let params = &region.params;
    let limits = if system == CoordinateSystem::Rectangular {
        let unit = (Expr::Const(-1.0), Expr::Const(1.0));
        let (x0, x1) = params.range_or("x", unit.clone())?;
        let (y0, y1) = params.range_or("y", unit)?;
        vec![IntegrationLimit::new(Y, y0, y1), IntegrationLimit::new(X, x0, x1)]
    } else {
        let (r0, r1) = params.range_or("r", (Expr::Const(0.0), Expr::Const(1.0)))?;
        if r0.to_f64().is_some_and(|r| r < 0.0) {
            return Err(CalcError::InvalidBounds("r_min cannot be negative".to_string()));
        }
        let full = IntegrationLimit::full_turn(THETA);
        let (t0, t1) = params.range_or("theta", (full.lower, full.upper))?;
        vec![IntegrationLimit::new(R, r0, r1), IntegrationLimit::new(THETA, t0, t1)]
    };
    integrate_iterated(integrand, &limits, trace)
}

fn disk(
    integrand: &Expr,
    region: &RegionDescriptor,
    system: CoordinateSystem,
    trace: &mut DerivationTrace,
) -> Result<Expr, CalcError> {
    let params = &region.params;
    let radius = params.positive_or("radius", 1.0)?;
    let polar_integrand = if system == CoordinateSystem::Rectangular {
        let (x0, y0) = (params.get_or("x0", 0.0)?, params.get_or("y0", 0.0)?);
        let r = Expr::var(R);
        let theta = Expr::var(THETA);
        let substitution = [
            (X, shifted(x0, r.clone() * Expr::cos(theta.clone().boxed()))),
            (Y, shifted(y0, r.clone() * Expr::sin(theta.boxed()))),
        ];
        let mapped = (integrand.substitute_many(&substitution) * r).simplify();
        trace.push_expression("in polar coordinates, times r", &mapped);
        mapped
    } else {
        if params.contains("x0") || params.contains("y0") {
            warn!("a disk in polar coordinates is centred at the origin, x0/y0 ignored");
        }
        integrand.clone()
    };
    let limits = [
        IntegrationLimit::numeric(R, 0.0, radius),
        IntegrationLimit::full_turn(THETA),
    ];
    integrate_iterated(&polar_integrand, &limits, trace)
}

fn ellipse(
    integrand: &Expr,
    region: &RegionDescriptor,
    _system: CoordinateSystem,
    trace: &mut DerivationTrace,
) -> Result<Expr, CalcError> {
    let params = &region.params;
    let a = params.positive_or("semi_axis_x", 2.0)?;
    let b = params.positive_or("semi_axis_y", 1.0)?;
    let (x0, y0) = (params.get_or("x0", 0.0)?, params.get_or("y0", 0.0)?);
    let r = Expr::var(R);
    let theta = Expr::var(THETA);
    let substitution = [
        (X, shifted(x0, Expr::Const(a) * r.clone() * Expr::cos(theta.clone().boxed()))),
        (Y, shifted(y0, Expr::Const(b) * r.clone() * Expr::sin(theta.boxed()))),
    ];
    let jacobian = Expr::Const(a * b) * r;
    trace.push_expression("jacobian", &jacobian);
    let mapped = (integrand.substitute_many(&substitution) * jacobian).simplify();
    trace.push_expression("in elliptic coordinates, times jacobian", &mapped);
    let limits = [
        IntegrationLimit::numeric(R, 0.0, 1.0),
        IntegrationLimit::full_turn(THETA),
    ];
    integrate_iterated(&mapped, &limits, trace)
}

fn custom(
    integrand: &Expr,
    region: &RegionDescriptor,
    system: CoordinateSystem,
    trace: &mut DerivationTrace,
) -> Result<Expr, CalcError> {
    let variables = system.planar_variables().ok_or(CalcError::UnsupportedCombination {
        theorem: Theorem::Green,
        region: ShapeTag::Custom,
        system,
    })?;
    let limits = region.custom_limits(&variables)?;
    integrate_iterated(integrand, &limits, trace)
}
