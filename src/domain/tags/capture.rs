//! `capture` - render a body into a variable instead of the output

use super::compiler::{Compiler, RenderStep};
use crate::domain::context::{Flow, RenderContext};
use crate::domain::template::TagNode;
use crate::domain::value::Value;
use crate::error::{Result, TagflowError};

/// Compiled `capture` tag
#[derive(Debug)]
pub struct CaptureStep {
    name: String,
    body: Vec<RenderStep>,
}

impl CaptureStep {
    /// Variable the captured text is bound to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind the rendered body text; writes nothing to the output
    pub fn render(&self, ctx: &mut dyn RenderContext) -> Result<Flow> {
        let (text, flow) = ctx.capture_inner(&self.body)?;
        ctx.set(&self.name, Value::String(text));
        Ok(flow)
    }
}

/// Compile a `capture` tag
///
/// The parameters are the target variable name, taken as written.
pub fn compile_capture(tag: &TagNode, compiler: &Compiler<'_>) -> Result<RenderStep> {
    let name = tag.parameters.trim();
    if name.is_empty() {
        return Err(TagflowError::Syntax(
            "'capture' requires a variable name".to_string(),
        ));
    }

    Ok(RenderStep::Capture(CaptureStep {
        name: name.to_string(),
        body: compiler.compile_body(&tag.body)?,
    }))
}
