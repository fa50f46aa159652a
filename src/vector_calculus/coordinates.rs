//! # Coordinate system catalogue
//!
//! For each supported system: the native variable names, the mapping of Cartesian
//! `(x, y, z)` onto the native variables, the Jacobian of the volume element and the
//! order in which nested integrals are taken. Variables are built fresh on every call,
//! nothing is shared between calculations.
use crate::symbolic::symbolic_engine::Expr;
use crate::vector_calculus::errors::CalcError;
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};

pub const X: &str = "x";
pub const Y: &str = "y";
pub const Z: &str = "z";
pub const R: &str = "r";
pub const THETA: &str = "theta";
pub const PHI: &str = "phi";
pub const RHO: &str = "rho";

pub const CARTESIAN_VARIABLES: [&str; 3] = [X, Y, Z];

/// Accepts English and Spanish names; "polar" is the cylindrical system restricted to
/// the plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum CoordinateSystem {
    #[strum(
        to_string = "rectangular",
        serialize = "cartesian",
        serialize = "cartesianas",
        serialize = "cartesiano",
        serialize = "rectangulares"
    )]
    Rectangular,
    #[strum(
        to_string = "cylindrical",
        serialize = "cilindricas",
        serialize = "cilíndricas",
        serialize = "cilindrica",
        serialize = "polar",
        serialize = "polares"
    )]
    Cylindrical,
    #[strum(
        to_string = "spherical",
        serialize = "esfericas",
        serialize = "esféricas",
        serialize = "esferica"
    )]
    Spherical,
}

/// `x = r cos(theta)` and `y = r sin(theta)`, the planar part of every polar map
fn polar_pair(radius: Expr, angle: Expr) -> (Expr, Expr) {
    let x = radius.clone() * Expr::cos(angle.clone().boxed());
    let y = radius * Expr::sin(angle.boxed());
    (x, y)
}

impl CoordinateSystem {
    /// Parses a system name, mapping failure onto `UnsupportedCoordinateSystem`.
    pub fn from_name(name: &str) -> Result<Self, CalcError> {
        CoordinateSystem::from_str(name.trim())
            .map_err(|_| CalcError::UnsupportedCoordinateSystem(name.trim().to_string()))
    }

    /// Native variables in bound order: the i-th bound pair of a triple integral belongs
    /// to the i-th variable.
    pub fn native_variables(&self) -> [&'static str; 3] {
        match self {
            CoordinateSystem::Rectangular => [X, Y, Z],
            CoordinateSystem::Cylindrical => [R, THETA, Z],
            CoordinateSystem::Spherical => [RHO, PHI, THETA],
        }
    }

    /// Innermost first
    pub fn integration_order(&self) -> [&'static str; 3] {
        match self {
            CoordinateSystem::Rectangular => [Z, Y, X],
            CoordinateSystem::Cylindrical => [Z, R, THETA],
            CoordinateSystem::Spherical => [RHO, PHI, THETA],
        }
    }

    /// Variables of the planar (Green) form of the system
    pub fn planar_variables(&self) -> Option<[&'static str; 2]> {
        match self {
            CoordinateSystem::Rectangular => Some([X, Y]),
            CoordinateSystem::Cylindrical => Some([R, THETA]),
            CoordinateSystem::Spherical => None,
        }
    }

    /// radial variable, whose lower bound may not be negative
    pub fn radial_variable(&self) -> Option<&'static str> {
        match self {
            CoordinateSystem::Rectangular => None,
            CoordinateSystem::Cylindrical => Some(R),
            CoordinateSystem::Spherical => Some(RHO),
        }
    }

    pub fn is_native(&self, variable: &str) -> bool {
        self.native_variables().contains(&variable)
    }

    /// Cartesian variables expressed through the native ones. Empty for rectangular.
    pub fn cartesian_substitution(&self) -> Vec<(&'static str, Expr)> {
        match self {
            CoordinateSystem::Rectangular => Vec::new(),
            CoordinateSystem::Cylindrical => {
                let (x, y) = polar_pair(Expr::var(R), Expr::var(THETA));
                vec![(X, x), (Y, y)]
            }
            CoordinateSystem::Spherical => {
                let rho = Expr::var(RHO);
                let phi = Expr::var(PHI);
                let planar_radius = rho.clone() * Expr::sin(phi.clone().boxed());
                let (x, y) = polar_pair(planar_radius, Expr::var(THETA));
                vec![(X, x), (Y, y), (Z, rho * Expr::cos(phi.boxed()))]
            }
        }
    }

    /// Substitution rewriting expressions in the variables of `self` into the variables
    /// of `target`. `None` when the catalogue has no such map (spherical to cylindrical).
    pub fn substitution_into(&self, target: CoordinateSystem) -> Option<Vec<(&'static str, Expr)>> {
        use CoordinateSystem::*;
        match (self, target) {
            (from, to) if *from == to => Some(Vec::new()),
            (Rectangular, to) => Some(to.cartesian_substitution()),
            (Cylindrical, Spherical) => {
                let rho = Expr::var(RHO);
                let phi = Expr::var(PHI);
                Some(vec![
                    (R, rho.clone() * Expr::sin(phi.clone().boxed())),
                    (Z, rho * Expr::cos(phi.boxed())),
                ])
            }
            _ => None,
        }
    }

    /// Replaces every Cartesian variable of `expr` by its expression in this system.
    /// Identity for rectangular.
    pub fn transform(&self, expr: &Expr) -> Expr {
        let substitution = self.cartesian_substitution();
        if substitution.is_empty() {
            expr.clone()
        } else {
            expr.substitute_many(&substitution)
        }
    }

    /// Volume element scale factor: `1`, `r`, `rho^2*sin(phi)`
    pub fn jacobian(&self) -> Expr {
        match self {
            CoordinateSystem::Rectangular => Expr::Const(1.0),
            CoordinateSystem::Cylindrical => Expr::var(R),
            CoordinateSystem::Spherical => {
                Expr::var(RHO).powf(2.0) * Expr::sin(Expr::var(PHI).boxed())
            }
        }
    }

    /// Factor multiplied in just before integrating `variable`, so that the full
    /// Jacobian builds up one variable at a time (`r`, `rho^2`, `sin(phi)`).
    pub fn incremental_factor(&self, variable: &str) -> Option<Expr> {
        match (self, variable) {
            (CoordinateSystem::Cylindrical, R) => Some(Expr::var(R)),
            (CoordinateSystem::Spherical, RHO) => Some(Expr::var(RHO).powf(2.0)),
            (CoordinateSystem::Spherical, PHI) => Some(Expr::sin(Expr::var(PHI).boxed())),
            _ => None,
        }
    }
}
