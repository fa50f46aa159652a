//! # Calculation requests
//!
//! A request holds the raw text a user typed (function, field components, bounds, shape
//! name, parameters) and turns it into typed calculator input only when it runs, so every
//! problem with the input surfaces as a `CalcError` from [`CalculationRequest::run`].
//!
//! Requests are usually read from a task document (see `Utils::task_parser`):
//! ```text
//! logging
//!   level: info
//! divergence
//!   field: x, y, z
//!   region: sphere; radius: 2
//! integral_2
//!   function: x*y*z
//!   system: rectangular
//!   bounds1: 0, 1; bounds2: 0, 1; bounds3: 0, 1
//! ```
use crate::Utils::logger::{LoggingSettings, level_from_str};
use crate::Utils::task_parser::{SectionMap, Value, parse_document};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_vectors::ExprVector;
use crate::vector_calculus::coordinates::{CoordinateSystem, X, Y};
use crate::vector_calculus::errors::CalcError;
use crate::vector_calculus::gram_schmidt::gram_schmidt;
use crate::vector_calculus::regions::{
    RegionDescriptor, ShapeParameters, ShapeTag, parse_limit_list,
};
use crate::vector_calculus::theorems::stokes::StokesOutcome;
use crate::vector_calculus::theorems::{
    Theorem, check_supported, divergence, green, parse_field, stokes,
};
use crate::vector_calculus::trace::DerivationTrace;
use crate::vector_calculus::triple_integral::{self, Bounds};
use log::{info, warn};
use std::fmt;
use std::fs;
use std::path::Path;

/// Region part shared by the three theorem requests
#[derive(Debug, Clone, PartialEq)]
pub struct RegionInput {
    pub shape: String,
    pub system: String,
    /// `(parameter name, value text)`
    pub params: Vec<(String, String)>,
    /// flat `lower, upper, variable, ...` list, only read for custom regions
    pub limits: Vec<String>,
}

impl RegionInput {
    pub fn new(shape: &str, system: &str) -> Self {
        RegionInput {
            shape: shape.to_string(),
            system: system.to_string(),
            params: Vec::new(),
            limits: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_limits(mut self, limits: &[&str]) -> Self {
        self.limits = limits.iter().map(|s| s.to_string()).collect();
        self
    }

    fn resolve(&self, theorem: Theorem) -> Result<(RegionDescriptor, CoordinateSystem), CalcError> {
        let system = CoordinateSystem::from_name(&self.system)?;
        let shape = ShapeTag::from_name(&self.shape, theorem)?;
        check_supported(theorem, shape, system)?;
        let params = ShapeParameters::from_pairs(&self.params)?;
        let region = if shape == ShapeTag::Custom {
            RegionDescriptor::custom(parse_limit_list(&self.limits, system)?).with_params(params)
        } else {
            if !self.limits.is_empty() {
                warn!("limits are only read for custom regions, ignored for {}", shape);
            }
            RegionDescriptor::new(shape).with_params(params)
        };
        Ok((region, system))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalculationRequest {
    TripleIntegral {
        function: String,
        system: String,
        /// `(lower, upper)` per native variable, in bound order
        bounds: [(String, String); 3],
    },
    Green {
        p: String,
        q: String,
        region: RegionInput,
    },
    Stokes {
        field: Vec<String>,
        surface: RegionInput,
    },
    Divergence {
        field: Vec<String>,
        region: RegionInput,
    },
    GramSchmidt {
        vectors: Vec<Vec<String>>,
        normalize: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportResult {
    Scalar(Expr),
    /// Stokes over a surface without an integration rule
    Curl(ExprVector),
    Basis(Vec<ExprVector>),
}

impl ReportResult {
    pub fn scalar(&self) -> Option<&Expr> {
        match self {
            ReportResult::Scalar(expr) => Some(expr),
            _ => None,
        }
    }
}

impl fmt::Display for ReportResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReportResult::Scalar(expr) => write!(f, "{}", expr),
            ReportResult::Curl(curl) => write!(f, "curl F = {}", curl),
            ReportResult::Basis(basis) => {
                let rows: Vec<String> = basis
                    .iter()
                    .enumerate()
                    .map(|(k, u)| format!("u{} = {}", k + 1, u))
                    .collect();
                write!(f, "{}", rows.join(", "))
            }
        }
    }
}

/// Result and derivation of one successful request
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationReport {
    pub kind: &'static str,
    pub result: ReportResult,
    pub trace: DerivationTrace,
}

impl CalculationRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            CalculationRequest::TripleIntegral { .. } => "integral",
            CalculationRequest::Green { .. } => "green",
            CalculationRequest::Stokes { .. } => "stokes",
            CalculationRequest::Divergence { .. } => "divergence",
            CalculationRequest::GramSchmidt { .. } => "gram_schmidt",
        }
    }

    pub fn run(&self) -> Result<CalculationReport, CalcError> {
        info!("running {} request", self.kind());
        let (result, trace) = match self {
            CalculationRequest::TripleIntegral {
                function,
                system,
                bounds,
            } => {
                let system = CoordinateSystem::from_name(system)?;
                let [b1, b2, b3] = bounds;
                let bounds = [
                    Bounds::from_strs(&b1.0, &b1.1)?,
                    Bounds::from_strs(&b2.0, &b2.1)?,
                    Bounds::from_strs(&b3.0, &b3.1)?,
                ];
                let res = triple_integral::evaluate(function, system, bounds)?;
                (ReportResult::Scalar(res.result), res.trace)
            }
            CalculationRequest::Green { p, q, region } => {
                let (region, system) = region.resolve(Theorem::Green)?;
                let variables = system.planar_variables().unwrap_or([X, Y]);
                let p = Expr::parse_with_variables(p, &variables)?;
                let q = Expr::parse_with_variables(q, &variables)?;
                let res = green::apply(&p, &q, &region, system)?;
                (ReportResult::Scalar(res.result), res.trace)
            }
            CalculationRequest::Stokes { field, surface } => {
                let (surface, system) = surface.resolve(Theorem::Stokes)?;
                let field = parse_field(field, &system.native_variables())?;
                let res = stokes::apply(&field, &surface, system)?;
                let result = match res.outcome {
                    StokesOutcome::Flux(flux) => ReportResult::Scalar(flux),
                    StokesOutcome::CurlOnly(curl) => ReportResult::Curl(curl),
                };
                (result, res.trace)
            }
            CalculationRequest::Divergence { field, region } => {
                let (region, system) = region.resolve(Theorem::Divergence)?;
                let field = parse_field(field, &system.native_variables())?;
                let res = divergence::apply(&field, &region, system)?;
                (ReportResult::Scalar(res.result), res.trace)
            }
            CalculationRequest::GramSchmidt { vectors, normalize } => {
                let parsed = vectors
                    .iter()
                    .map(|components| {
                        components
                            .iter()
                            .map(|c| Expr::parse_expression(c))
                            .collect::<Result<Vec<Expr>, _>>()
                            .map(ExprVector::new)
                    })
                    .collect::<Result<Vec<ExprVector>, _>>()?;
                let res = gram_schmidt(&parsed, *normalize)?;
                (ReportResult::Basis(res.basis), res.trace)
            }
        };
        Ok(CalculationReport {
            kind: self.kind(),
            result,
            trace,
        })
    }

    /// Builds a request from one task-document section. The title may carry a numeric
    /// suffix (`green_2`) to tell several sections of the same kind apart.
    pub fn from_section(title: &str, section: &SectionMap) -> Result<Self, CalcError> {
        let reader = SectionReader { title, section };
        match section_kind(title) {
            "integral" => {
                reader.warn_unused(&["function", "system", "bounds1", "bounds2", "bounds3"]);
                Ok(CalculationRequest::TripleIntegral {
                    function: reader.single("function")?,
                    system: reader.single_or("system", "rectangular")?,
                    bounds: [
                        reader.bounds("bounds1")?,
                        reader.bounds("bounds2")?,
                        reader.bounds("bounds3")?,
                    ],
                })
            }
            "green" => Ok(CalculationRequest::Green {
                p: reader.single("p")?,
                q: reader.single("q")?,
                region: reader.region(&["p", "q"], "region")?,
            }),
            "stokes" => Ok(CalculationRequest::Stokes {
                field: reader.list("field")?,
                surface: reader.region(&["field"], "surface")?,
            }),
            "divergence" => Ok(CalculationRequest::Divergence {
                field: reader.list("field")?,
                region: reader.region(&["field"], "region")?,
            }),
            "gram_schmidt" => reader.gram_schmidt(),
            other => Err(CalcError::InvalidInput(format!(
                "unknown section '{}' ({})",
                title, other
            ))),
        }
    }
}

/// `integral_2` -> `integral`; titles without a numeric suffix are returned as they are
pub fn section_kind(title: &str) -> &str {
    match title.rsplit_once('_') {
        Some((kind, suffix))
            if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) =>
        {
            kind
        }
        _ => title,
    }
}

struct SectionReader<'a> {
    title: &'a str,
    section: &'a SectionMap,
}

impl SectionReader<'_> {
    fn values(&self, key: &str) -> Option<&[Value]> {
        self.section.get(key).and_then(|v| v.as_deref())
    }

    fn missing(&self, key: &str) -> CalcError {
        CalcError::InvalidInput(format!("section '{}' needs '{}'", self.title, key))
    }

    fn list(&self, key: &str) -> Result<Vec<String>, CalcError> {
        let values = self.values(key).ok_or_else(|| self.missing(key))?;
        Ok(values.iter().map(Value::to_string_value).collect())
    }

    fn single(&self, key: &str) -> Result<String, CalcError> {
        let mut list = self.list(key)?;
        if list.len() != 1 {
            return Err(CalcError::InvalidInput(format!(
                "'{}' in section '{}' takes one value, got {}",
                key,
                self.title,
                list.len()
            )));
        }
        Ok(list.remove(0))
    }

    fn single_or(&self, key: &str, default: &str) -> Result<String, CalcError> {
        if self.values(key).is_some() {
            self.single(key)
        } else {
            Ok(default.to_string())
        }
    }

    fn bounds(&self, key: &str) -> Result<(String, String), CalcError> {
        let list = self.list(key)?;
        match list.as_slice() {
            [lower, upper] => Ok((lower.clone(), upper.clone())),
            _ => Err(CalcError::InvalidBounds(format!(
                "{} needs exactly two values (lower, upper), got {}",
                key,
                list.len()
            ))),
        }
    }

    /// Shape name, system, limits; every other key not in `taken` is a shape parameter.
    fn region(&self, taken: &[&str], shape_key: &str) -> Result<RegionInput, CalcError> {
        let mut region = RegionInput::new(
            &self.single(shape_key)?,
            &self.single_or("system", "rectangular")?,
        );
        if self.values("limits").is_some() {
            region.limits = self.list("limits")?;
        }
        let mut keys: Vec<&String> = self.section.keys().collect();
        keys.sort();
        for key in keys {
            let key = key.as_str();
            if taken.contains(&key) || [shape_key, "system", "limits"].contains(&key) {
                continue;
            }
            region.params.push((key.to_string(), self.single(key)?));
        }
        Ok(region)
    }

    fn gram_schmidt(&self) -> Result<CalculationRequest, CalcError> {
        let normalize = match self.values("normalize") {
            None => false,
            Some([value]) => value.as_boolean().ok_or_else(|| {
                CalcError::InvalidInput(format!("normalize must be true or false, got {}", value))
            })?,
            Some(_) => return Err(CalcError::InvalidInput("normalize takes one value".to_string())),
        };
        let mut numbered: Vec<(usize, &String)> = Vec::new();
        for key in self.section.keys() {
            match key.strip_prefix('v').and_then(|n| n.parse::<usize>().ok()) {
                Some(index) => numbered.push((index, key)),
                None if key == "normalize" => {}
                None => warn!("key '{}' in section '{}' ignored", key, self.title),
            }
        }
        numbered.sort();
        let vectors = numbered
            .into_iter()
            .map(|(_, key)| self.list(key))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CalculationRequest::GramSchmidt { vectors, normalize })
    }

    fn warn_unused(&self, known: &[&str]) {
        for key in self.section.keys() {
            if !known.contains(&key.as_str()) {
                warn!("key '{}' in section '{}' ignored", key, self.title);
            }
        }
    }
}

/// One calculation section of a task file; a section that cannot be turned into a
/// request keeps its error so the remaining sections still run.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskEntry {
    pub title: String,
    pub request: Result<CalculationRequest, CalcError>,
}

/// A parsed task file: logging settings and the calculation sections sorted by title
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFile {
    pub logging: LoggingSettings,
    pub entries: Vec<TaskEntry>,
}

impl TaskFile {
    pub fn parse(text: &str) -> Result<Self, CalcError> {
        let document = parse_document(text).map_err(CalcError::InvalidInput)?;
        let mut titles: Vec<&String> = document.keys().collect();
        titles.sort();

        let mut logging = LoggingSettings::default();
        let mut entries = Vec::new();
        for title in titles {
            let section = &document[title];
            if title == "logging" {
                logging = logging_settings(section)?;
                continue;
            }
            entries.push(TaskEntry {
                title: title.clone(),
                request: CalculationRequest::from_section(title, section),
            });
        }
        Ok(TaskFile { logging, entries })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CalcError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            CalcError::InvalidInput(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&text)
    }
}

fn logging_settings(section: &SectionMap) -> Result<LoggingSettings, CalcError> {
    let reader = SectionReader {
        title: "logging",
        section,
    };
    reader.warn_unused(&["level", "file"]);
    let mut settings = LoggingSettings::default();
    if reader.values("level").is_some() {
        let name = reader.single("level")?;
        settings.level = level_from_str(&name)
            .ok_or_else(|| CalcError::InvalidInput(format!("unknown log level '{}'", name)))?;
    }
    if reader.values("file").is_some() {
        settings.file = Some(reader.single("file")?);
    }
    Ok(settings)
}
