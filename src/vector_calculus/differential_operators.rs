//! Curl and divergence of a three-component field, with the scale factors of each
//! coordinate system. Components are read in the basis of the system:
//! `(F_x, F_y, F_z)`, `(F_r, F_theta, F_z)` or `(F_rho, F_phi, F_theta)`.
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_vectors::ExprVector;
use crate::vector_calculus::coordinates::{CoordinateSystem, PHI, R, RHO, THETA, X, Y, Z};
use crate::vector_calculus::errors::CalcError;

fn check_three_components(field: &ExprVector) -> Result<(), CalcError> {
    if field.len() == 3 {
        Ok(())
    } else {
        Err(CalcError::InvalidInput(format!(
            "a vector field needs 3 components, got {}",
            field.len()
        )))
    }
}

fn d(expr: &Expr, var: &str) -> Expr {
    expr.diff(var)
}

fn sin_phi() -> Expr {
    Expr::sin(Expr::var(PHI).boxed())
}

pub fn curl(field: &ExprVector, system: CoordinateSystem) -> Result<ExprVector, CalcError> {
    check_three_components(field)?;
    let (f1, f2, f3) = (&field[0], &field[1], &field[2]);
    let components = match system {
        CoordinateSystem::Rectangular => vec![
            d(f3, Y) - d(f2, Z),
            d(f1, Z) - d(f3, X),
            d(f2, X) - d(f1, Y),
        ],
        CoordinateSystem::Cylindrical => {
            let r = Expr::var(R);
            vec![
                d(f3, THETA) / r.clone() - d(f2, Z),
                d(f1, Z) - d(f3, R),
                (d(&(r.clone() * f2.clone()), R) - d(f1, THETA)) / r,
            ]
        }
        CoordinateSystem::Spherical => {
            let rho = Expr::var(RHO);
            vec![
                (d(&(sin_phi() * f3.clone()), PHI) - d(f2, THETA)) / (rho.clone() * sin_phi()),
                (d(f1, THETA) / sin_phi() - d(&(rho.clone() * f3.clone()), RHO)) / rho.clone(),
                (d(&(rho.clone() * f2.clone()), RHO) - d(f1, PHI)) / rho,
            ]
        }
    };
    Ok(ExprVector::new(components).simplify())
}

pub fn divergence(field: &ExprVector, system: CoordinateSystem) -> Result<Expr, CalcError> {
    check_three_components(field)?;
    let (f1, f2, f3) = (&field[0], &field[1], &field[2]);
    let div = match system {
        CoordinateSystem::Rectangular => d(f1, X) + d(f2, Y) + d(f3, Z),
        CoordinateSystem::Cylindrical => {
            let r = Expr::var(R);
            d(&(r.clone() * f1.clone()), R) / r.clone() + d(f2, THETA) / r + d(f3, Z)
        }
        CoordinateSystem::Spherical => {
            let rho = Expr::var(RHO);
            let rho_sin_phi = rho.clone() * sin_phi();
            d(&(rho.clone().powf(2.0) * f1.clone()), RHO) / rho.powf(2.0)
                + d(&(sin_phi() * f2.clone()), PHI) / rho_sin_phi.clone()
                + d(f3, THETA) / rho_sin_phi
        }
    };
    Ok(div.simplify())
}

/// Integrand of Green's theorem: `dQ/dx - dP/dy` in the plane, `d(rQ)/dr - dP/dtheta`
/// in polar form. The polar form already carries the area element `r`.
pub fn green_integrand(p: &Expr, q: &Expr, system: CoordinateSystem) -> Result<Expr, CalcError> {
    let integrand = match system {
        CoordinateSystem::Rectangular => d(q, X) - d(p, Y),
        CoordinateSystem::Cylindrical => d(&(Expr::var(R) * q.clone()), R) - d(p, THETA),
        CoordinateSystem::Spherical => {
            return Err(CalcError::InvalidInput(
                "Green's theorem works in the plane, use rectangular or polar coordinates"
                    .to_string(),
            ));
        }
    };
    Ok(integrand.simplify())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn field(components: [&str; 3]) -> ExprVector {
        ExprVector::new(
            components
                .iter()
                .map(|c| Expr::parse_expression(c).unwrap())
                .collect(),
        )
    }

    #[test]
    fn test_curl_of_gradient_field_vanishes() {
        let c = curl(&field(["y", "x", "0"]), CoordinateSystem::Rectangular).unwrap();
        assert!(c.is_zero());
        assert_eq!(c.to_strings(), vec!["0", "0", "0"]);
    }

    #[test]
    fn test_rectangular_curl_of_rotation() {
        let c = curl(&field(["-y", "x", "0"]), CoordinateSystem::Rectangular).unwrap();
        assert_eq!(c, ExprVector::new(vec![Expr::Const(0.0), Expr::Const(0.0), Expr::Const(2.0)]));
    }

    #[test]
    fn test_radial_field_divergence() {
        let div = divergence(&field(["x", "y", "z"]), CoordinateSystem::Rectangular).unwrap();
        assert_eq!(div, Expr::Const(3.0));
        // the same field written in cylindrical and spherical components
        let div = divergence(&field(["r", "0", "z"]), CoordinateSystem::Cylindrical).unwrap();
        assert_eq!(div, Expr::Const(3.0));
        let div = divergence(&field(["rho", "0", "0"]), CoordinateSystem::Spherical).unwrap();
        assert_eq!(div, Expr::Const(3.0));
    }

    #[test]
    fn test_cylindrical_curl_of_swirl() {
        // F = r e_theta is the rotation (-y, x, 0): curl is 2 e_z
        let c = curl(&field(["0", "r", "0"]), CoordinateSystem::Cylindrical).unwrap();
        assert_eq!(c, ExprVector::new(vec![Expr::Const(0.0), Expr::Const(0.0), Expr::Const(2.0)]));
    }

    #[test]
    fn test_spherical_curl() {
        // F = rho*sin(phi) e_theta is again the rotation (-y, x, 0):
        // curl = 2 e_z = 2 cos(phi) e_rho - 2 sin(phi) e_phi
        let c = curl(&field(["0", "0", "rho*sin(phi)"]), CoordinateSystem::Spherical).unwrap();
        let at = |i: usize| c[i].eval_expression(&["rho", "phi", "theta"], &[1.3, 0.4, 2.0]);
        assert_relative_eq!(at(0), 2.0 * 0.4_f64.cos(), epsilon = 1e-12);
        assert_relative_eq!(at(1), -2.0 * 0.4_f64.sin(), epsilon = 1e-12);
        assert_relative_eq!(at(2), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_spherical_divergence_with_angles() {
        // div(sin(phi) e_phi) = 2 cos(phi) / rho
        let div = divergence(&field(["0", "sin(phi)", "0"]), CoordinateSystem::Spherical).unwrap();
        assert_relative_eq!(
            div.eval_expression(&["rho", "phi", "theta"], &[2.0, 0.3, 0.0]),
            0.3_f64.cos(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_green_integrands() {
        let p = Expr::parse_expression("-y").unwrap();
        let q = Expr::parse_expression("x").unwrap();
        assert_eq!(
            green_integrand(&p, &q, CoordinateSystem::Rectangular).unwrap(),
            Expr::Const(2.0)
        );
        // same field in polar components: P = 0 along r, Q = r along theta
        let polar = green_integrand(
            &Expr::Const(0.0),
            &Expr::var("r"),
            CoordinateSystem::Cylindrical,
        )
        .unwrap();
        assert_eq!(polar.simplify(), Expr::parse_expression("2*r").unwrap().simplify());
        assert!(green_integrand(&p, &q, CoordinateSystem::Spherical).is_err());
    }

    #[test]
    fn test_wrong_component_count() {
        let v = ExprVector::from_variables(&["x", "y"]);
        assert!(matches!(
            curl(&v, CoordinateSystem::Rectangular),
            Err(CalcError::InvalidInput(_))
        ));
    }
}
