//! # Vector calculus
//! triple integrals in rectangular, cylindrical and spherical coordinates, curl and divergence,
//! Green's, Stokes' and the divergence theorem over a catalogue of regions, Gram-Schmidt.
//! Every calculation returns its result together with a derivation trace.
/// error taxonomy shared by every calculation
pub mod errors;
/// ordered, labelled derivation steps and their table rendering
pub mod trace;
/// coordinate systems: native variables, Cartesian substitution, Jacobian
///# Example#
/// ```
/// use RustedVectorCalc::vector_calculus::coordinates::CoordinateSystem;
/// let system = CoordinateSystem::from_name("esfericas").unwrap();
/// assert_eq!(system, CoordinateSystem::Spherical);
/// let j = system.jacobian().eval_expression(&["rho", "phi"], &[2.0, std::f64::consts::FRAC_PI_2]);
/// assert_eq!(j, 4.0);
/// ```
pub mod coordinates;
/// nested definite integrals over boxes in native variables
///# Example#
/// ```
/// use RustedVectorCalc::vector_calculus::coordinates::CoordinateSystem;
/// use RustedVectorCalc::vector_calculus::triple_integral::{Bounds, evaluate};
/// let bounds = [
///     Bounds::from_strs("0", "1").unwrap(),
///     Bounds::from_strs("0", "2*pi").unwrap(),
///     Bounds::from_strs("0", "1").unwrap(),
/// ];
/// let res = evaluate("1", CoordinateSystem::Cylindrical, bounds).unwrap();
/// assert!((res.value().unwrap() - std::f64::consts::PI).abs() < 1e-12);
/// ```
pub mod triple_integral;
/// curl and divergence per coordinate system
pub mod differential_operators;
/// shape tags, shape parameters, custom limits
pub mod regions;
/// Green, Stokes and divergence theorem appliers
///# Example#
/// ```
/// use RustedVectorCalc::symbolic::symbolic_engine::Expr;
/// use RustedVectorCalc::vector_calculus::coordinates::CoordinateSystem;
/// use RustedVectorCalc::vector_calculus::regions::{RegionDescriptor, ShapeTag};
/// use RustedVectorCalc::vector_calculus::theorems::green;
/// let p = Expr::parse_expression("-y").unwrap();
/// let q = Expr::parse_expression("x").unwrap();
/// let res = green::apply(&p, &q, &RegionDescriptor::new(ShapeTag::Disk), CoordinateSystem::Rectangular).unwrap();
/// assert_eq!(res.result.to_string(), "2*pi");
/// ```
pub mod theorems;
/// Gram-Schmidt orthogonalisation with every projection traced
pub mod gram_schmidt;
/// calculations described by raw text, task files
pub mod request;
/// the report on display, background calculations
pub mod session;
