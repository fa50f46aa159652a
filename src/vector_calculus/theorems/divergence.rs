use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_vectors::ExprVector;
use crate::vector_calculus::coordinates::{CoordinateSystem, PHI, R, RHO, THETA, X, Y, Z};
use crate::vector_calculus::differential_operators::divergence;
use crate::vector_calculus::errors::CalcError;
use crate::vector_calculus::regions::{RegionDescriptor, ShapeTag};
use crate::vector_calculus::theorems::{
    ALL_SYSTEMS, HandlerRecord, RECTANGULAR_CYLINDRICAL, RECTANGULAR_ONLY, Theorem, find_handler, shifted,
};
use crate::vector_calculus::trace::DerivationTrace;
use crate::vector_calculus::triple_integral::{
    CalculationResult, IntegrationLimit, integrate_iterated, integrate_iterated_with,
};
use log::{info, warn};

type DivergenceHandler =
    fn(&Expr, &RegionDescriptor, CoordinateSystem, &mut DerivationTrace) -> Result<Expr, CalcError>;

/// Region / coordinate system compatibility:
///
/// | region    | rectangular | cylindrical | spherical |
/// |-----------|-------------|-------------|-----------|
/// | cube      | yes         | no          | no        |
/// | sphere    | yes         | yes         | yes       |
/// | cylinder  | yes         | yes         | no        |
/// | ellipsoid | yes         | no          | no        |
/// | custom    | yes         | yes         | yes       |
pub const DIVERGENCE_HANDLERS: &[HandlerRecord<DivergenceHandler>] = &[
    HandlerRecord {
        shape: ShapeTag::Cube,
        systems: RECTANGULAR_ONLY,
        handler: cube,
    },
    HandlerRecord {
        shape: ShapeTag::Sphere,
        systems: ALL_SYSTEMS,
        handler: sphere,
    },
    HandlerRecord {
        shape: ShapeTag::Cylinder,
        systems: RECTANGULAR_CYLINDRICAL,
        handler: cylinder,
    },
    HandlerRecord {
        shape: ShapeTag::Ellipsoid,
        systems: RECTANGULAR_ONLY,
        handler: ellipsoid,
    },
    HandlerRecord {
        shape: ShapeTag::Custom,
        systems: ALL_SYSTEMS,
        handler: custom,
    },
];

/// Volume integral of div F over the region, with F given in the components of `system`.
pub fn apply(
    field: &ExprVector,
    region: &RegionDescriptor,
    system: CoordinateSystem,
) -> Result<CalculationResult, CalcError> {
    let handler = find_handler(DIVERGENCE_HANDLERS, Theorem::Divergence, region.shape, system)?;
    region.warn_unknown_parameters();
    info!("divergence theorem over {} in {} coordinates", region.shape, system);

    let mut trace = DerivationTrace::new();
    trace.push_text("region", &region.shape.to_string());
    trace.push_text("coordinate system", &system.to_string());
    trace.push_vector("F", field);
    let div = divergence(field, system)?;
    trace.push_expression("div F", &div);

    let result = handler(&div, region, system, &mut trace)?;
    trace.push_expression("result", &result);
    info!("result: {}", result);
    Ok(CalculationResult { result, trace })
}

/// Applies `substitution` to `div`, multiplies by `jacobian` and records both.
fn change_variables(
    div: &Expr,
    substitution: &[(&str, Expr)],
    jacobian: Expr,
    trace: &mut DerivationTrace,
) -> Expr {
    let mapped = if substitution.is_empty() {
        div.clone()
    } else {
        let mapped = div.substitute_many(substitution).simplify();
        trace.push_expression("div F in region coordinates", &mapped);
        mapped
    };
    trace.push_expression("jacobian", &jacobian);
    let integrand = (mapped * jacobian).simplify();
    trace.push_expression("integrand", &integrand);
    integrand
}

fn cube(
    div: &Expr,
    region: &RegionDescriptor,
    _system: CoordinateSystem,
    trace: &mut DerivationTrace,
) -> Result<Expr, CalcError> {
    let params = &region.params;
    let unit = (Expr::Const(-1.0), Expr::Const(1.0));
    let (x0, x1) = params.range_or("x", unit.clone())?;
    let (y0, y1) = params.range_or("y", unit.clone())?;
    let (z0, z1) = params.range_or("z", unit)?;
    let limits = [
        IntegrationLimit::new(Z, z0, z1),
        IntegrationLimit::new(Y, y0, y1),
        IntegrationLimit::new(X, x0, x1),
    ];
    integrate_iterated(div, &limits, trace)
}

fn sphere(
    div: &Expr,
    region: &RegionDescriptor,
    system: CoordinateSystem,
    trace: &mut DerivationTrace,
) -> Result<Expr, CalcError> {
    let params = &region.params;
    let radius = params.positive_or("radius", 1.0)?;
    let (x0, y0, z0) = (
        params.get_or("x0", 0.0)?,
        params.get_or("y0", 0.0)?,
        params.get_or("z0", 0.0)?,
    );
    let rho = Expr::var(RHO);
    let sin_phi = Expr::sin(Expr::var(PHI).boxed());
    let cos_phi = Expr::cos(Expr::var(PHI).boxed());
    let substitution = match system {
        CoordinateSystem::Rectangular => vec![
            (X, shifted(x0, rho.clone() * sin_phi.clone() * Expr::cos(Expr::var(THETA).boxed()))),
            (Y, shifted(y0, rho.clone() * sin_phi.clone() * Expr::sin(Expr::var(THETA).boxed()))),
            (Z, shifted(z0, rho.clone() * cos_phi)),
        ],
        CoordinateSystem::Cylindrical => {
            if x0 != 0.0 || y0 != 0.0 {
                warn!("sphere in cylindrical coordinates is centred on the z axis, x0/y0 ignored");
            }
            vec![
                (R, rho.clone() * sin_phi.clone()),
                (Z, shifted(z0, rho.clone() * cos_phi)),
            ]
        }
        CoordinateSystem::Spherical => {
            if x0 != 0.0 || y0 != 0.0 || z0 != 0.0 {
                warn!("sphere in spherical coordinates is centred at the origin, center ignored");
            }
            Vec::new()
        }
    };
    let integrand = change_variables(div, &substitution, CoordinateSystem::Spherical.jacobian(), trace);
    let limits = [
        IntegrationLimit::numeric(RHO, 0.0, radius),
        IntegrationLimit::half_turn(PHI),
        IntegrationLimit::full_turn(THETA),
    ];
    integrate_iterated(&integrand, &limits, trace)
}

/// Cylinder around the z axis, `z` from `-height/2` to `height/2`.
fn cylinder(
    div: &Expr,
    region: &RegionDescriptor,
    system: CoordinateSystem,
    trace: &mut DerivationTrace,
) -> Result<Expr, CalcError> {
    let params = &region.params;
    let radius = params.positive_or("radius", 1.0)?;
    let height = params.positive_or("height", 2.0)?;
    let (x0, y0) = (params.get_or("x0", 0.0)?, params.get_or("y0", 0.0)?);
    let substitution = if system == CoordinateSystem::Rectangular {
        let r = Expr::var(R);
        vec![
            (X, shifted(x0, r.clone() * Expr::cos(Expr::var(THETA).boxed()))),
            (Y, shifted(y0, r * Expr::sin(Expr::var(THETA).boxed()))),
        ]
    } else {
        if x0 != 0.0 || y0 != 0.0 {
            warn!("cylinder in cylindrical coordinates lies on the z axis, x0/y0 ignored");
        }
        Vec::new()
    };
    let integrand = change_variables(div, &substitution, CoordinateSystem::Cylindrical.jacobian(), trace);
    let limits = [
        IntegrationLimit::numeric(R, 0.0, radius),
        IntegrationLimit::full_turn(THETA),
        IntegrationLimit::numeric(Z, -height / 2.0, height / 2.0),
    ];
    integrate_iterated(&integrand, &limits, trace)
}

/// `(x, y, z) = (a r sin(phi) cos(theta), b r sin(phi) sin(theta), c r cos(phi))`,
/// `r` from 0 to 1.
fn ellipsoid(
    div: &Expr,
    region: &RegionDescriptor,
    _system: CoordinateSystem,
    trace: &mut DerivationTrace,
) -> Result<Expr, CalcError> {
    let params = &region.params;
    let a = params.positive_or("semi_axis_x", 2.0)?;
    let b = params.positive_or("semi_axis_y", 1.5)?;
    let c = params.positive_or("semi_axis_z", 1.0)?;
    let r = Expr::var(R);
    let sin_phi = Expr::sin(Expr::var(PHI).boxed());
    let substitution = [
        (X, Expr::Const(a) * r.clone() * sin_phi.clone() * Expr::cos(Expr::var(THETA).boxed())),
        (Y, Expr::Const(b) * r.clone() * sin_phi.clone() * Expr::sin(Expr::var(THETA).boxed())),
        (Z, Expr::Const(c) * r.clone() * Expr::cos(Expr::var(PHI).boxed())),
    ];
    let jacobian = Expr::Const(a * b * c) * r.powf(2.0) * sin_phi;
    let integrand = change_variables(div, &substitution, jacobian, trace);
    let limits = [
        IntegrationLimit::numeric(R, 0.0, 1.0),
        IntegrationLimit::half_turn(PHI),
        IntegrationLimit::full_turn(THETA),
    ];
    integrate_iterated(&integrand, &limits, trace)
}

/// Explicit limits in the native variables. The volume element is built while
/// integrating: `r` for cylindrical `r`, `rho^2` and `sin(phi)` for spherical.
fn custom(
    div: &Expr,
    region: &RegionDescriptor,
    system: CoordinateSystem,
    trace: &mut DerivationTrace,
) -> Result<Expr, CalcError> {
    let limits = region.custom_limits(&system.native_variables())?;
    integrate_iterated_with(div, &limits, trace, |variable| system.incremental_factor(variable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_calculus::regions::ShapeParameters;
    use crate::vector_calculus::theorems::{compatibility, parse_field};
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn cartesian(components: [&str; 3]) -> ExprVector {
        parse_field(&components, &["x", "y", "z"]).unwrap()
    }

    fn value(res: &CalculationResult) -> f64 {
        res.value().unwrap()
    }

    #[test]
    fn test_radial_field_over_unit_sphere() {
        let res = apply(
            &cartesian(["x", "y", "z"]),
            &RegionDescriptor::new(ShapeTag::Sphere),
            CoordinateSystem::Rectangular,
        )
        .unwrap();
        assert_eq!(res.trace.steps()[3].content.to_string(), "3");
        assert_relative_eq!(value(&res), 4.0 * PI, epsilon = 1e-12);
        assert_eq!(res.result.to_string(), "4*pi");
    }

    #[test]
    fn test_shifted_sphere() {
        // div (x^2, 0, 0) = 2x, over a ball centred at x0 = 1 this is 2 * volume
        let params = ShapeParameters::new().with("x0", 1.0);
        let res = apply(
            &cartesian(["x^2", "0", "0"]),
            &RegionDescriptor::new(ShapeTag::Sphere).with_params(params),
            CoordinateSystem::Rectangular,
        )
        .unwrap();
        assert_relative_eq!(value(&res), 8.0 * PI / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sphere_from_cylindrical_and_spherical_components() {
        let cyl = parse_field(&["r", "0", "z"], &["r", "theta", "z"]).unwrap();
        let res = apply(&cyl, &RegionDescriptor::new(ShapeTag::Sphere), CoordinateSystem::Cylindrical).unwrap();
        assert_relative_eq!(value(&res), 4.0 * PI, epsilon = 1e-12);

        let sph = parse_field(&["rho", "0", "0"], &["rho", "phi", "theta"]).unwrap();
        let res = apply(&sph, &RegionDescriptor::new(ShapeTag::Sphere), CoordinateSystem::Spherical).unwrap();
        assert_relative_eq!(value(&res), 4.0 * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_cylinder_agrees_across_systems() {
        let rect = apply(
            &cartesian(["x", "y", "0"]),
            &RegionDescriptor::new(ShapeTag::Cylinder),
            CoordinateSystem::Rectangular,
        )
        .unwrap();
        let cyl = apply(
            &parse_field(&["r", "0", "0"], &["r", "theta", "z"]).unwrap(),
            &RegionDescriptor::new(ShapeTag::Cylinder),
            CoordinateSystem::Cylindrical,
        )
        .unwrap();
        assert_relative_eq!(value(&rect), 4.0 * PI, epsilon = 1e-12);
        assert_relative_eq!(value(&rect), value(&cyl), epsilon = 1e-12);
    }

    #[test]
    fn test_cube_and_ellipsoid() {
        let res = apply(
            &cartesian(["x", "y", "z"]),
            &RegionDescriptor::new(ShapeTag::Cube),
            CoordinateSystem::Rectangular,
        )
        .unwrap();
        assert_relative_eq!(value(&res), 24.0, epsilon = 1e-12);

        let res = apply(
            &cartesian(["x", "y", "z"]),
            &RegionDescriptor::new(ShapeTag::Ellipsoid),
            CoordinateSystem::Rectangular,
        )
        .unwrap();
        // 3 * (4/3) pi * 2 * 1.5 * 1
        assert_relative_eq!(value(&res), 12.0 * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_custom_ball_in_cylindrical() {
        let region = RegionDescriptor::custom(vec![
            IntegrationLimit::full_turn("theta"),
            IntegrationLimit::numeric("r", 0.0, 1.0),
            IntegrationLimit::new(
                "z",
                Expr::parse_expression("-sqrt(1 - r^2)").unwrap(),
                Expr::parse_expression("sqrt(1 - r^2)").unwrap(),
            ),
        ]);
        // div (0, 0, z) = 1: the volume of the unit ball
        let field = parse_field(&["0", "0", "z"], &["r", "theta", "z"]).unwrap();
        let res = apply(&field, &region, CoordinateSystem::Cylindrical).unwrap();
        assert_relative_eq!(value(&res), 4.0 * PI / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_custom_ball_in_spherical() {
        let region = RegionDescriptor::custom(vec![
            IntegrationLimit::full_turn("theta"),
            IntegrationLimit::half_turn("phi"),
            IntegrationLimit::numeric("rho", 0.0, 1.0),
        ]);
        let field = parse_field(&["rho", "0", "0"], &["rho", "phi", "theta"]).unwrap();
        let res = apply(&field, &region, CoordinateSystem::Spherical).unwrap();
        assert_relative_eq!(value(&res), 4.0 * PI, epsilon = 1e-12);
        assert!(res
            .trace
            .labels()
            .contains(&"multiply by volume factor for phi"));
    }

    #[test]
    fn test_cube_in_spherical_is_rejected() {
        let region = RegionDescriptor::new(ShapeTag::from_name("cubo", Theorem::Divergence).unwrap());
        let system = CoordinateSystem::from_name("esfericas").unwrap();
        let err = apply(&cartesian(["x", "y", "z"]), &region, system).unwrap_err();
        assert_eq!(
            err,
            CalcError::UnsupportedCombination {
                theorem: Theorem::Divergence,
                region: ShapeTag::Cube,
                system: CoordinateSystem::Spherical,
            }
        );
    }

    #[test]
    fn test_compatibility_table() {
        use CoordinateSystem::*;
        let table = compatibility(DIVERGENCE_HANDLERS);
        let allowed = |shape: ShapeTag, system: CoordinateSystem| {
            table
                .iter()
                .any(|(s, systems)| *s == shape && systems.contains(&system))
        };
        let expected = [
            (ShapeTag::Cube, [true, false, false]),
            (ShapeTag::Sphere, [true, true, true]),
            (ShapeTag::Cylinder, [true, true, false]),
            (ShapeTag::Ellipsoid, [true, false, false]),
            (ShapeTag::Custom, [true, true, true]),
        ];
        for (shape, row) in expected {
            for (system, ok) in [Rectangular, Cylindrical, Spherical].into_iter().zip(row) {
                assert_eq!(allowed(shape, system), ok, "{} in {}", shape, system);
            }
        }
        assert!(!allowed(ShapeTag::Plane, Rectangular));
    }
}
