//! Region and surface catalogue: shape tags, their named parameters with defaults, and
//! explicit limit lists for custom regions.
use crate::symbolic::symbolic_engine::Expr;
use crate::vector_calculus::coordinates::CoordinateSystem;
use crate::vector_calculus::errors::CalcError;
use crate::vector_calculus::theorems::Theorem;
use crate::vector_calculus::triple_integral::IntegrationLimit;
use log::warn;
use std::collections::BTreeMap;
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum ShapeTag {
    #[strum(to_string = "rectangle", serialize = "rectangulo", serialize = "rectángulo")]
    Rectangle,
    #[strum(to_string = "disk", serialize = "circle", serialize = "circulo", serialize = "círculo", serialize = "disco")]
    Disk,
    #[strum(to_string = "ellipse", serialize = "elipse")]
    Ellipse,
    #[strum(to_string = "cube", serialize = "box", serialize = "cubo")]
    Cube,
    #[strum(to_string = "sphere", serialize = "esfera")]
    Sphere,
    #[strum(to_string = "cylinder", serialize = "cilindro")]
    Cylinder,
    #[strum(to_string = "ellipsoid", serialize = "elipsoide")]
    Ellipsoid,
    #[strum(to_string = "plane", serialize = "plano")]
    Plane,
    #[strum(to_string = "cone", serialize = "cono")]
    Cone,
    #[strum(to_string = "custom", serialize = "personalizada", serialize = "personalizado")]
    Custom,
}

impl ShapeTag {
    /// Parses a shape name. An unknown name is reported against the theorem asking for it.
    pub fn from_name(name: &str, theorem: Theorem) -> Result<Self, CalcError> {
        ShapeTag::from_str(name.trim()).map_err(|_| CalcError::UnsupportedRegion {
            theorem,
            region: name.trim().to_string(),
        })
    }

    /// parameter names the shape understands
    pub fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            ShapeTag::Rectangle => &[
                "x_min", "x_max", "y_min", "y_max", "r_min", "r_max", "theta_min", "theta_max",
            ],
            ShapeTag::Disk => &["radius", "x0", "y0"],
            ShapeTag::Ellipse => &["semi_axis_x", "semi_axis_y", "x0", "y0"],
            ShapeTag::Cube => &["x_min", "x_max", "y_min", "y_max", "z_min", "z_max"],
            ShapeTag::Sphere => &["radius", "x0", "y0", "z0"],
            ShapeTag::Cylinder => &["radius", "height", "x0", "y0"],
            ShapeTag::Ellipsoid => &["semi_axis_x", "semi_axis_y", "semi_axis_z"],
            ShapeTag::Plane => &["a", "b", "c", "x_min", "x_max", "y_min", "y_max"],
            ShapeTag::Cone => &["radius", "height"],
            ShapeTag::Custom => &[],
        }
    }
}

/// Named numeric parameters of a shape. Values are expressions that must evaluate to
/// finite numbers (`2*pi` is fine); a missing name falls back to the caller's default.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapeParameters {
    values: BTreeMap<String, Expr>,
}

impl ShapeParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.values.insert(name.to_string(), Expr::Const(value));
        self
    }

    pub fn insert(&mut self, name: &str, value: Expr) {
        self.values.insert(name.to_string(), value);
    }

    /// Parses every `(name, text)` pair; the text may not contain variables.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, CalcError> {
        let mut params = ShapeParameters::new();
        for (name, text) in pairs {
            params.insert(name, Expr::parse_with_variables(text, &[])?);
        }
        Ok(params)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    /// Value of `name` as an expression, or `default` when it was not given. The value
    /// must evaluate to a finite number.
    pub fn expr_or(&self, name: &str, default: Expr) -> Result<Expr, CalcError> {
        match self.values.get(name) {
            None => Ok(default),
            Some(expr) => match expr.to_f64() {
                Some(v) if v.is_finite() => Ok(expr.clone()),
                _ => Err(CalcError::InvalidBounds(format!(
                    "parameter {} = {} is not a finite number",
                    name, expr
                ))),
            },
        }
    }

    pub fn get_or(&self, name: &str, default: f64) -> Result<f64, CalcError> {
        let expr = self.expr_or(name, Expr::Const(default))?;
        Ok(expr.to_f64().unwrap_or(default))
    }

    /// Same as [`get_or`](Self::get_or) for lengths, which must be strictly positive.
    pub fn positive_or(&self, name: &str, default: f64) -> Result<f64, CalcError> {
        let value = self.get_or(name, default)?;
        if value > 0.0 {
            Ok(value)
        } else {
            Err(CalcError::InvalidBounds(format!("{} must be positive, got {}", name, value)))
        }
    }

    /// `(<prefix>_min, <prefix>_max)`, sorted low-to-high.
    pub fn range_or(&self, prefix: &str, default: (Expr, Expr)) -> Result<(Expr, Expr), CalcError> {
        let lower = self.expr_or(&format!("{}_min", prefix), default.0)?;
        let upper = self.expr_or(&format!("{}_max", prefix), default.1)?;
        let value = |e: &Expr| e.to_f64().unwrap_or(0.0);
        if value(&lower) > value(&upper) {
            warn!("{}_min > {}_max, swapping", prefix, prefix);
            Ok((upper, lower))
        } else {
            Ok((lower, upper))
        }
    }
}

/// Shape tag plus everything needed to place it: parameters, and for custom regions the
/// explicit limits, outermost first.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionDescriptor {
    pub shape: ShapeTag,
    pub params: ShapeParameters,
    pub limits: Vec<IntegrationLimit>,
}

impl RegionDescriptor {
    pub fn new(shape: ShapeTag) -> Self {
        RegionDescriptor {
            shape,
            params: ShapeParameters::new(),
            limits: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: ShapeParameters) -> Self {
        self.params = params;
        self
    }

    /// Custom region from limits listed outermost first
    pub fn custom(limits: Vec<IntegrationLimit>) -> Self {
        RegionDescriptor {
            shape: ShapeTag::Custom,
            params: ShapeParameters::new(),
            limits,
        }
    }

    /// Logs and ignores parameters the shape does not know.
    pub fn warn_unknown_parameters(&self) {
        let known = self.shape.parameter_names();
        for name in self.params.names() {
            if !known.contains(&name) {
                warn!("parameter '{}' is not used by shape '{}', ignored", name, self.shape);
            }
        }
    }

    /// Custom limits in integration order (innermost first), checked against the
    /// variables the integrand lives in.
    pub fn custom_limits(&self, variables: &[&str]) -> Result<Vec<IntegrationLimit>, CalcError> {
        if self.limits.is_empty() {
            return Err(CalcError::InvalidBounds(
                "a custom region needs at least one limit".to_string(),
            ));
        }
        let mut seen: Vec<&str> = Vec::new();
        for limit in &self.limits {
            if !variables.contains(&limit.variable.as_str()) {
                return Err(CalcError::InvalidBounds(format!(
                    "variable '{}' is not one of {:?}",
                    limit.variable, variables
                )));
            }
            if seen.contains(&limit.variable.as_str()) {
                return Err(CalcError::InvalidBounds(format!(
                    "variable '{}' is limited twice",
                    limit.variable
                )));
            }
            seen.push(&limit.variable);
        }
        Ok(self.limits.iter().rev().cloned().collect())
    }
}

/// Reads a flat `lower, upper, variable, lower, upper, variable, ...` list, outermost
/// limit first. Limits may use any variable native to `system`.
pub fn parse_limit_list(items: &[String], system: CoordinateSystem) -> Result<Vec<IntegrationLimit>, CalcError> {
    if items.len() % 3 != 0 {
        return Err(CalcError::InvalidBounds(format!(
            "limits come in triples (lower, upper, variable), got {} items",
            items.len()
        )));
    }
    let natives = system.native_variables();
    items
        .chunks(3)
        .map(|chunk| {
            let variable = Expr::parse_expression(&chunk[2])?;
            let Expr::Var(name) = variable else {
                return Err(CalcError::InvalidBounds(format!(
                    "'{}' is not a variable name",
                    chunk[2]
                )));
            };
            IntegrationLimit::parse(&name, &chunk[0], &chunk[1], &natives)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_shape_aliases() {
        assert_eq!(ShapeTag::from_name("cubo", Theorem::Divergence).unwrap(), ShapeTag::Cube);
        assert_eq!(ShapeTag::from_name("Circle", Theorem::Green).unwrap(), ShapeTag::Disk);
        assert_eq!(ShapeTag::from_name("esfera", Theorem::Stokes).unwrap(), ShapeTag::Sphere);
        assert_eq!(
            ShapeTag::from_name("torus", Theorem::Stokes),
            Err(CalcError::UnsupportedRegion {
                theorem: Theorem::Stokes,
                region: "torus".to_string()
            })
        );
        for shape in ShapeTag::iter() {
            assert_eq!(ShapeTag::from_name(&shape.to_string(), Theorem::Green).unwrap(), shape);
        }
    }

    #[test]
    fn test_parameters_with_defaults() {
        let params = ShapeParameters::from_pairs(&[
            ("radius".to_string(), "2".to_string()),
            ("theta_max".to_string(), "pi".to_string()),
        ])
        .unwrap();
        assert_eq!(params.get_or("radius", 1.0).unwrap(), 2.0);
        assert_eq!(params.get_or("height", 2.0).unwrap(), 2.0);
        let (lower, upper) = params
            .range_or("theta", (Expr::Const(0.0), Expr::Const(0.5)))
            .unwrap();
        assert_eq!(lower, Expr::Const(0.0));
        assert_eq!(upper, Expr::Pi);
        let swapped = ShapeParameters::new().with("x_min", 3.0);
        let (lower, upper) = swapped
            .range_or("x", (Expr::Const(-1.0), Expr::Const(1.0)))
            .unwrap();
        assert_eq!((lower, upper), (Expr::Const(1.0), Expr::Const(3.0)));
        assert!(ShapeParameters::from_pairs(&[("radius".to_string(), "a".to_string())]).is_err());
        let zero = ShapeParameters::new().with("radius", 0.0);
        assert!(matches!(zero.positive_or("radius", 1.0), Err(CalcError::InvalidBounds(_))));
    }

    #[test]
    fn test_limit_list() {
        let items: Vec<String> = ["0", "2*pi", "theta", "0", "1", "r", "-sqrt(1 - r^2)", "sqrt(1 - r^2)", "z"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let limits = parse_limit_list(&items, CoordinateSystem::Cylindrical).unwrap();
        assert_eq!(limits.len(), 3);
        assert_eq!(limits[0].variable, "theta");
        let region = RegionDescriptor::custom(limits);
        let ordered = region.custom_limits(&["r", "theta", "z"]).unwrap();
        assert_eq!(ordered[0].variable, "z");
        assert!(region.custom_limits(&["x", "y", "z"]).is_err());

        let bad = vec!["0".to_string(), "1".to_string()];
        assert!(parse_limit_list(&bad, CoordinateSystem::Rectangular).is_err());
        let bad_var: Vec<String> = ["0", "1", "x+y"].iter().map(|s| s.to_string()).collect();
        assert!(parse_limit_list(&bad_var, CoordinateSystem::Rectangular).is_err());
    }
}
