//! # Theorem appliers
//!
//! Green, Stokes and Divergence each keep a table mapping a shape tag to a handler and
//! the coordinate systems the handler accepts. Dispatch is a single lookup:
//! a shape missing from the table is `UnsupportedRegion`, a shape present without the
//! requested system is `UnsupportedCombination`.
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_vectors::ExprVector;
use crate::vector_calculus::coordinates::CoordinateSystem;
use crate::vector_calculus::errors::CalcError;
use crate::vector_calculus::regions::ShapeTag;
use strum_macros::{Display, EnumIter, EnumString};

/// Green's theorem over plane regions
pub mod green;
/// Stokes' theorem over surfaces, or the curl when no closed form is set up
pub mod stokes;
/// Divergence theorem over solid regions
pub mod divergence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum Theorem {
    Green,
    Stokes,
    #[strum(to_string = "Divergence", serialize = "gauss")]
    Divergence,
}

/// One row of a dispatch table
pub struct HandlerRecord<H: 'static> {
    pub shape: ShapeTag,
    pub systems: &'static [CoordinateSystem],
    pub handler: H,
}

pub(crate) const ALL_SYSTEMS: &[CoordinateSystem] = &[
    CoordinateSystem::Rectangular,
    CoordinateSystem::Cylindrical,
    CoordinateSystem::Spherical,
];
pub(crate) const RECTANGULAR_CYLINDRICAL: &[CoordinateSystem] =
    &[CoordinateSystem::Rectangular, CoordinateSystem::Cylindrical];
pub(crate) const RECTANGULAR_ONLY: &[CoordinateSystem] = &[CoordinateSystem::Rectangular];

pub fn find_handler<H: Copy>(
    table: &[HandlerRecord<H>],
    theorem: Theorem,
    shape: ShapeTag,
    system: CoordinateSystem,
) -> Result<H, CalcError> {
    let record = table
        .iter()
        .find(|record| record.shape == shape)
        .ok_or_else(|| CalcError::UnsupportedRegion {
            theorem,
            region: shape.to_string(),
        })?;
    if record.systems.contains(&system) {
        Ok(record.handler)
    } else {
        Err(CalcError::UnsupportedCombination {
            theorem,
            region: shape,
            system,
        })
    }
}

/// Fails exactly as the theorem's `apply` would when no handler covers the pair.
pub fn check_supported(
    theorem: Theorem,
    shape: ShapeTag,
    system: CoordinateSystem,
) -> Result<(), CalcError> {
    match theorem {
        Theorem::Green => find_handler(green::GREEN_HANDLERS, theorem, shape, system).map(|_| ()),
        Theorem::Stokes => find_handler(stokes::STOKES_HANDLERS, theorem, shape, system).map(|_| ()),
        Theorem::Divergence => {
            find_handler(divergence::DIVERGENCE_HANDLERS, theorem, shape, system).map(|_| ())
        }
    }
}

/// `(shape, accepted systems)` rows of a table
pub fn compatibility<H>(table: &[HandlerRecord<H>]) -> Vec<(ShapeTag, Vec<CoordinateSystem>)> {
    table
        .iter()
        .map(|record| (record.shape, record.systems.to_vec()))
        .collect()
}

/// Parses the components of a vector field; each may use any of `variables`.
pub fn parse_field<S: AsRef<str>>(components: &[S], variables: &[&str]) -> Result<ExprVector, CalcError> {
    if components.len() != 3 {
        return Err(CalcError::InvalidInput(format!(
            "a vector field needs 3 components, got {}",
            components.len()
        )));
    }
    let data = components
        .iter()
        .map(|c| Expr::parse_with_variables(c.as_ref(), variables))
        .collect::<Result<Vec<Expr>, _>>()?;
    Ok(ExprVector::new(data))
}

/// `center + offset`, leaving `offset` alone for a zero center
pub(crate) fn shifted(center: f64, offset: Expr) -> Expr {
    if center == 0.0 {
        offset
    } else {
        Expr::Const(center) + offset
    }
}
