use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_vectors::ExprVector;
use log::debug;
use std::fmt;
use tabled::{builder::Builder, settings::Style};

/// What a derivation step shows
#[derive(Debug, Clone, PartialEq)]
pub enum StepContent {
    Expression(Expr),
    Vector(ExprVector),
    Text(String),
}

impl fmt::Display for StepContent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StepContent::Expression(expr) => write!(f, "{}", expr),
            StepContent::Vector(vector) => write!(f, "{}", vector),
            StepContent::Text(text) => write!(f, "{}", text),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraceStep {
    pub label: String,
    pub content: StepContent,
}

/// Ordered, append-only list of labeled steps produced while a calculation runs.
/// Calculations only write to it; results are never read back from it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DerivationTrace {
    steps: Vec<TraceStep>,
}

impl DerivationTrace {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn push_expression(&mut self, label: &str, expr: &Expr) {
        self.push(label, StepContent::Expression(expr.clone()));
    }

    pub fn push_vector(&mut self, label: &str, vector: &ExprVector) {
        self.push(label, StepContent::Vector(vector.clone()));
    }

    pub fn push_text(&mut self, label: &str, text: &str) {
        self.push(label, StepContent::Text(text.to_string()));
    }

    fn push(&mut self, label: &str, content: StepContent) {
        debug!("{}: {}", label, content);
        self.steps.push(TraceStep {
            label: label.to_string(),
            content,
        });
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// labels in order, handy for checking the shape of a derivation
    pub fn labels(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.label.as_str()).collect()
    }

    /// Renders the trace as a table: step number, label, content
    pub fn to_table(&self) -> String {
        let mut rows: Vec<Vec<String>> = vec![vec![
            "#".to_string(),
            "step".to_string(),
            "content".to_string(),
        ]];
        for (i, step) in self.steps.iter().enumerate() {
            rows.push(vec![
                (i + 1).to_string(),
                step.label.clone(),
                step.content.to_string(),
            ]);
        }
        let mut table = Builder::from(rows).build();
        table.with(Style::modern_rounded());
        table.to_string()
    }
}

impl fmt::Display for DerivationTrace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_table())
    }
}
