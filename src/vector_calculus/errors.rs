use crate::symbolic::parse_expr::ParseError;
use crate::vector_calculus::coordinates::CoordinateSystem;
use crate::vector_calculus::regions::ShapeTag;
use crate::vector_calculus::theorems::Theorem;
use std::fmt;

/// Every failure a calculation can end with. Errors coming from the symbolic layer are
/// wrapped together with the step at which they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum CalcError {
    /// malformed input expression
    Parse(ParseError),
    UnsupportedCoordinateSystem(String),
    /// region or surface name unknown to the theorem
    UnsupportedRegion { theorem: Theorem, region: String },
    /// valid region and valid coordinate system with no rule connecting them
    UnsupportedCombination {
        theorem: Theorem,
        region: ShapeTag,
        system: CoordinateSystem,
    },
    /// the integrator found no closed form; `step` is 1-based inside the nested chain
    IntegrationFailure {
        step: usize,
        variable: String,
        message: String,
    },
    InvalidBounds(String),
    /// Gram-Schmidt met a vector spanned by the previous ones (0-based index)
    LinearlyDependent { index: usize },
    /// a request is missing a field or carries one of the wrong shape
    InvalidInput(String),
    /// a background calculation did not return
    Worker(String),
}

impl fmt::Display for CalcError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CalcError::Parse(err) => write!(f, "Parse error: {}", err),
            CalcError::UnsupportedCoordinateSystem(name) => {
                write!(f, "Unsupported coordinate system '{}'", name)
            }
            CalcError::UnsupportedRegion { theorem, region } => {
                write!(f, "{} theorem: unsupported region '{}'", theorem, region)
            }
            CalcError::UnsupportedCombination {
                theorem,
                region,
                system,
            } => write!(
                f,
                "{} theorem: region '{}' cannot be used with {} coordinates",
                theorem, region, system
            ),
            CalcError::IntegrationFailure {
                step,
                variable,
                message,
            } => write!(
                f,
                "Integration failed at step {} (d{}): {}",
                step, variable, message
            ),
            CalcError::InvalidBounds(msg) => write!(f, "Invalid bounds: {}", msg),
            CalcError::LinearlyDependent { index } => write!(
                f,
                "Vector v{} is linearly dependent on the previous vectors",
                index + 1
            ),
            CalcError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            CalcError::Worker(msg) => write!(f, "Background calculation failed: {}", msg),
        }
    }
}

impl std::error::Error for CalcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CalcError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ParseError> for CalcError {
    fn from(err: ParseError) -> Self {
        CalcError::Parse(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_combination() {
        let err = CalcError::UnsupportedCombination {
            theorem: Theorem::Divergence,
            region: ShapeTag::Cube,
            system: CoordinateSystem::Spherical,
        };
        assert_eq!(
            err.to_string(),
            "Divergence theorem: region 'cube' cannot be used with spherical coordinates"
        );
    }

    #[test]
    fn test_parse_error_is_wrapped() {
        let parse_err = ParseError::new("unknown function", Some("foo(x)"));
        let err: CalcError = parse_err.clone().into();
        assert_eq!(err, CalcError::Parse(parse_err));
        assert!(std::error::Error::source(&err).is_some());
    }
}
