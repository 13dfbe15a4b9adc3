//! The standard tag set

use super::branch::{compile_case, compile_if, compile_unless};
use super::capture::compile_capture;
use super::registry::TagRegistry;
use super::signal::{break_tag, continue_tag, cycle_tag, LOOP_TAGS};
use crate::error::Result;

impl TagRegistry {
    /// Registry holding the standard tags
    ///
    /// `for` and `tablerow` are declared so that loop signals can be validated,
    /// but compiling them needs a loop engine's compiler.
    pub fn standard() -> Result<Self> {
        let mut registry = TagRegistry::new();

        registry.define_simple_tag("break", break_tag)?;
        registry.define_simple_tag("continue", continue_tag)?;
        registry.define_simple_tag("cycle", cycle_tag)?;

        registry
            .define_block_tag("capture")
            .with_compiler(compile_capture)
            .define()?;
        registry
            .define_block_tag("case")
            .branch("when")
            .branches_only()
            .with_compiler(compile_case)
            .define()?;
        registry.define_block_tag("comment").skips_body().define()?;
        registry.define_block_tag("for").governs(LOOP_TAGS).define()?;
        registry
            .define_block_tag("if")
            .branch("else")
            .branch("elsif")
            .with_compiler(compile_if)
            .define()?;
        registry.define_block_tag("raw").verbatim_body().define()?;
        registry
            .define_block_tag("tablerow")
            .governs(LOOP_TAGS)
            .define()?;
        registry
            .define_block_tag("unless")
            .same_syntax_as("if")
            .with_compiler(compile_unless)
            .define()?;

        Ok(registry)
    }
}
