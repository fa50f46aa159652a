use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_vectors::ExprVector;
use crate::vector_calculus::coordinates::{CoordinateSystem, PHI, R, RHO, THETA, X, Y, Z};
use crate::vector_calculus::differential_operators::curl;
use crate::vector_calculus::errors::CalcError;
use crate::vector_calculus::regions::{RegionDescriptor, ShapeTag};
use crate::vector_calculus::theorems::{
    ALL_SYSTEMS, HandlerRecord, RECTANGULAR_ONLY, Theorem, find_handler, shifted,
};
use crate::vector_calculus::trace::DerivationTrace;
use crate::vector_calculus::triple_integral::{IntegrationLimit, integrate_iterated};
use log::{info, warn};
use std::fmt;

/// Either the flux of the curl through the surface, or just the curl when the surface
/// has no integration rule. The latter is a valid outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum StokesOutcome {
    Flux(Expr),
    CurlOnly(ExprVector),
}

impl fmt::Display for StokesOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StokesOutcome::Flux(flux) => write!(f, "{}", flux),
            StokesOutcome::CurlOnly(curl) => write!(f, "curl F = {}", curl),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StokesResult {
    pub outcome: StokesOutcome,
    pub curl: ExprVector,
    pub trace: DerivationTrace,
}

impl StokesResult {
    pub fn flux(&self) -> Option<&Expr> {
        match &self.outcome {
            StokesOutcome::Flux(flux) => Some(flux),
            StokesOutcome::CurlOnly(_) => None,
        }
    }
}

type StokesHandler = fn(
    &ExprVector,
    &RegionDescriptor,
    CoordinateSystem,
    &mut DerivationTrace,
) -> Result<StokesOutcome, CalcError>;

pub const STOKES_HANDLERS: &[HandlerRecord<StokesHandler>] = &[
    HandlerRecord {
        shape: ShapeTag::Plane,
        systems: RECTANGULAR_ONLY,
        handler: plane,
    },
    HandlerRecord {
        shape: ShapeTag::Sphere,
        systems: ALL_SYSTEMS,
        handler: sphere,
    },
    HandlerRecord {
        shape: ShapeTag::Cylinder,
        systems: ALL_SYSTEMS,
        handler: curl_only,
    },
    HandlerRecord {
        shape: ShapeTag::Cone,
        systems: ALL_SYSTEMS,
        handler: curl_only,
    },
    HandlerRecord {
        shape: ShapeTag::Custom,
        systems: ALL_SYSTEMS,
        handler: curl_only,
    },
];

/// Flux of curl F through the surface, with F given in the components of `system`.
pub fn apply(
    field: &ExprVector,
    surface: &RegionDescriptor,
    system: CoordinateSystem,
) -> Result<StokesResult, CalcError> {
    let handler = find_handler(STOKES_HANDLERS, Theorem::Stokes, surface.shape, system)?;
    surface.warn_unknown_parameters();
    info!("Stokes' theorem over {} in {} coordinates", surface.shape, system);

    let mut trace = DerivationTrace::new();
    trace.push_text("surface", &surface.shape.to_string());
    trace.push_text("coordinate system", &system.to_string());
    trace.push_vector("F", field);
    let rot = curl(field, system)?;
    trace.push_vector("curl F", &rot);

    let outcome = handler(&rot, surface, system, &mut trace)?;
    match &outcome {
        StokesOutcome::Flux(flux) => {
            trace.push_expression("result", flux);
            info!("result: {}", flux);
        }
        StokesOutcome::CurlOnly(_) => info!("no surface integral for {}, curl returned", surface.shape),
    }
    Ok(StokesResult {
        outcome,
        curl: rot,
        trace,
    })
}

/// Surface `z = a x + b y + c` over a rectangle of the xy-plane.
/// With `N = (-a, -b, 1)`, `n dS = N dx dy`.
fn plane(
    rot: &ExprVector,
    surface: &RegionDescriptor,
    _system: CoordinateSystem,
    trace: &mut DerivationTrace,
) -> Result<StokesOutcome, CalcError> {
    let params = &surface.params;
    let (a, b, c) = (
        params.get_or("a", 0.0)?,
        params.get_or("b", 0.0)?,
        params.get_or("c", 0.0)?,
    );
    let height = shifted(c, Expr::Const(a) * Expr::var(X) + Expr::Const(b) * Expr::var(Y)).simplify();
    trace.push_expression("surface z", &height);
    let on_surface = rot.substitute(Z, &height);

    let area_factor = Expr::Const(1.0 + a * a + b * b).sqrt().simplify();
    let normal = ExprVector::new(vec![Expr::Const(-a), Expr::Const(-b), Expr::Const(1.0)]);
    let unit_normal = normal.scale(&(Expr::Const(1.0) / area_factor.clone()));
    trace.push_vector("unit normal", &unit_normal);
    trace.push_expression("surface element dS/(dx dy)", &area_factor);

    let integrand = on_surface.dot(&normal).map_err(CalcError::InvalidInput)?;
    trace.push_expression("curl F . n dS/(dx dy)", &integrand);

    let unit = (Expr::Const(-1.0), Expr::Const(1.0));
    let (x0, x1) = params.range_or("x", unit.clone())?;
    let (y0, y1) = params.range_or("y", unit)?;
    let limits = [IntegrationLimit::new(Y, y0, y1), IntegrationLimit::new(X, x0, x1)];
    integrate_iterated(&integrand, &limits, trace).map(StokesOutcome::Flux)
}

/// Sphere of radius R, outward normal. Components of the curl are read in the basis of
/// the active system.
fn sphere(
    rot: &ExprVector,
    surface: &RegionDescriptor,
    system: CoordinateSystem,
    trace: &mut DerivationTrace,
) -> Result<StokesOutcome, CalcError> {
    let params = &surface.params;
    let radius = params.positive_or("radius", 1.0)?;
    let (x0, y0, z0) = (
        params.get_or("x0", 0.0)?,
        params.get_or("y0", 0.0)?,
        params.get_or("z0", 0.0)?,
    );
    let big_r = Expr::Const(radius);
    let sin_phi = Expr::sin(Expr::var(PHI).boxed());
    let cos_phi = Expr::cos(Expr::var(PHI).boxed());
    let sin_theta = Expr::sin(Expr::var(THETA).boxed());
    let cos_theta = Expr::cos(Expr::var(THETA).boxed());

    let (on_surface, normal) = match system {
        CoordinateSystem::Rectangular => {
            let substitution = [
                (X, shifted(x0, big_r.clone() * sin_phi.clone() * cos_theta.clone())),
                (Y, shifted(y0, big_r.clone() * sin_phi.clone() * sin_theta.clone())),
                (Z, shifted(z0, big_r.clone() * cos_phi.clone())),
            ];
            let normal = vec![sin_phi.clone() * cos_theta, sin_phi.clone() * sin_theta, cos_phi];
            (rot.substitute_many(&substitution), normal)
        }
        CoordinateSystem::Cylindrical => {
            if x0 != 0.0 || y0 != 0.0 {
                warn!("sphere in cylindrical coordinates is centred on the z axis, x0/y0 ignored");
            }
            let substitution = [
                (R, big_r.clone() * sin_phi.clone()),
                (Z, shifted(z0, big_r.clone() * cos_phi.clone())),
            ];
            let normal = vec![sin_phi.clone(), Expr::Const(0.0), cos_phi];
            (rot.substitute_many(&substitution), normal)
        }
        CoordinateSystem::Spherical => {
            if x0 != 0.0 || y0 != 0.0 || z0 != 0.0 {
                warn!("sphere in spherical coordinates is centred at the origin, center ignored");
            }
            let normal = vec![Expr::Const(1.0), Expr::Const(0.0), Expr::Const(0.0)];
            (rot.substitute(RHO, &big_r), normal)
        }
    };
    let normal = ExprVector::new(normal);
    trace.push_vector("curl F on the sphere", &on_surface.simplify());
    trace.push_vector("outward unit normal", &normal);

    let area_element = Expr::Const(radius * radius) * sin_phi;
    trace.push_expression("surface element dS/(dphi dtheta)", &area_element);
    let integrand = (on_surface.dot(&normal).map_err(CalcError::InvalidInput)? * area_element).simplify();
    trace.push_expression("curl F . n dS/(dphi dtheta)", &integrand);

    let limits = [
        IntegrationLimit::full_turn(THETA),
        IntegrationLimit::half_turn(PHI),
    ];
    integrate_iterated(&integrand, &limits, trace).map(StokesOutcome::Flux)
}

fn curl_only(
    rot: &ExprVector,
    surface: &RegionDescriptor,
    _system: CoordinateSystem,
    trace: &mut DerivationTrace,
) -> Result<StokesOutcome, CalcError> {
    trace.push_text(
        "surface integral",
        &format!("not set up for a {}, the curl is the result", surface.shape),
    );
    Ok(StokesOutcome::CurlOnly(rot.clone()))
}
