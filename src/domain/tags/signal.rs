//! Loop signal tags - `break`, `continue` and `cycle`
//!
//! These are only legal inside a loop tag. The loop engine owns what the
//! signals mean; here they only report themselves through [`Flow`].

use crate::domain::context::{Flow, RenderContext};
use crate::error::Result;
use std::io::Write;

/// Tags that loop tags govern
pub const LOOP_TAGS: &[&str] = &["break", "continue", "cycle"];

/// `break` - stop the enclosing loop
pub fn break_tag(
    _out: &mut dyn Write,
    _ctx: &mut dyn RenderContext,
    _params: &str,
) -> Result<Flow> {
    Ok(Flow::Break)
}

/// `continue` - skip to the next iteration
pub fn continue_tag(
    _out: &mut dyn Write,
    _ctx: &mut dyn RenderContext,
    _params: &str,
) -> Result<Flow> {
    Ok(Flow::Continue)
}

/// `cycle` - delegated to the loop engine through the context
pub fn cycle_tag(
    out: &mut dyn Write,
    ctx: &mut dyn RenderContext,
    params: &str,
) -> Result<Flow> {
    ctx.cycle(out, params)?;
    Ok(Flow::Normal)
}
