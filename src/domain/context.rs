//! Per-render context
//!
//! A render context carries the variable scope for one render pass and is the
//! only way compiled tags touch variables or render nested bodies.

use super::expression::Expression;
use super::tags::{render_steps, RenderStep};
use super::value::Value;
use crate::error::{Result, TagflowError};
use std::collections::HashMap;
use std::io::Write;

/// Loop signal returned by every render step
///
/// `Break` and `Continue` travel up through enclosing branch bodies until the
/// loop engine that governs them consumes the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    #[default]
    Normal,
    Break,
    Continue,
}

impl Flow {
    pub fn is_interrupted(self) -> bool {
        self != Flow::Normal
    }
}

/// Operations compiled tags need from the renderer
pub trait RenderContext {
    /// Evaluate an expression against the current scope
    fn evaluate(&mut self, expr: &Expression) -> Result<Value>;

    /// Render a branch body to `out`
    ///
    /// On failure nothing from the body must reach `out`.
    fn render_branch(&mut self, out: &mut dyn Write, body: &[RenderStep]) -> Result<Flow>;

    /// Bind a variable in the enclosing scope, replacing any previous binding
    fn set(&mut self, name: &str, value: Value);

    /// Render a body into an isolated buffer and return its text
    fn capture_inner(&mut self, body: &[RenderStep]) -> Result<(String, Flow)>;

    /// Render a `cycle` tag; only a loop engine can do this
    fn cycle(&mut self, _out: &mut dyn Write, parameters: &str) -> Result<()> {
        Err(TagflowError::UnsupportedTag(format!(
            "cycle {} requires a loop engine",
            parameters.trim()
        )))
    }
}

/// Default render context backed by a variable map
#[derive(Debug, Clone, Default)]
pub struct Context {
    variables: HashMap<String, Value>,
    strict_variables: bool,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context seeded with variables
    pub fn with_variables(variables: impl IntoIterator<Item = (String, Value)>) -> Self {
        Context {
            variables: variables.into_iter().collect(),
            strict_variables: false,
        }
    }

    /// Treat references to undefined variables as render errors
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_variables = strict;
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Render a body off to the side so a failing body writes nothing.
    ///
    /// Nested branches each buffer, so their output is copied once per level.
    fn render_to_buffer(&mut self, body: &[RenderStep]) -> Result<(Vec<u8>, Flow)> {
        let mut buffer = Vec::new();
        let flow = render_steps(body, &mut buffer, self)?;
        Ok((buffer, flow))
    }
}

impl RenderContext for Context {
    fn evaluate(&mut self, expr: &Expression) -> Result<Value> {
        expr.evaluate(&self.variables, self.strict_variables)
    }

    fn render_branch(&mut self, out: &mut dyn Write, body: &[RenderStep]) -> Result<Flow> {
        let (buffer, flow) = self.render_to_buffer(body)?;
        out.write_all(&buffer)?;
        Ok(flow)
    }

    fn set(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_string(), value);
    }

    fn capture_inner(&mut self, body: &[RenderStep]) -> Result<(String, Flow)> {
        let (buffer, flow) = self.render_to_buffer(body)?;
        let text = String::from_utf8(buffer)
            .map_err(|e| TagflowError::Render(format!("captured text is not UTF-8: {}", e)))?;
        Ok((text, flow))
    }
}
