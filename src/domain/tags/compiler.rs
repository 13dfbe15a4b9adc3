//! Template compilation - structural validation and render steps
//!
//! Validation checks a parsed tree against the registry before anything is
//! compiled. Compilation then resolves every node into a closed [`RenderStep`],
//! so rendering never dispatches on tag names.

use super::branch::{render_conditional, CaseStep, CompiledBranch};
use super::capture::CaptureStep;
use super::registry::{BlockBehavior, SimpleTagFn, TagKind, TagRegistry};
use crate::domain::context::{Flow, RenderContext};
use crate::domain::expression::Expression;
use crate::domain::template::{Node, TagNode};
use crate::error::{Result, TagflowError};
use std::fmt;
use std::io::Write;

/// Executable form of one node, produced once and rendered on every pass
pub enum RenderStep {
    /// Literal text
    Text(String),
    /// `{{ expr }}`
    Output(Expression),
    /// `if`/`unless` chains
    Conditional(Vec<CompiledBranch>),
    /// `case`/`when` selection
    Case(CaseStep),
    /// `capture` into a variable
    Capture(CaptureStep),
    /// A simple tag with its raw parameters
    Simple {
        name: String,
        render: SimpleTagFn,
        parameters: String,
    },
}

impl RenderStep {
    /// Render this step
    pub fn render(&self, out: &mut dyn Write, ctx: &mut dyn RenderContext) -> Result<Flow> {
        match self {
            RenderStep::Text(text) => {
                out.write_all(text.as_bytes())?;
                Ok(Flow::Normal)
            }
            RenderStep::Output(expr) => {
                let value = ctx.evaluate(expr)?;
                write!(out, "{}", value)?;
                Ok(Flow::Normal)
            }
            RenderStep::Conditional(branches) => render_conditional(branches, out, ctx),
            RenderStep::Case(case) => case.render(out, ctx),
            RenderStep::Capture(capture) => capture.render(ctx),
            RenderStep::Simple {
                render, parameters, ..
            } => (*render)(out, ctx, parameters.as_str()),
        }
    }
}

impl fmt::Debug for RenderStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderStep::Text(text) => f.debug_tuple("Text").field(text).finish(),
            RenderStep::Output(expr) => f.debug_tuple("Output").field(expr).finish(),
            RenderStep::Conditional(branches) => {
                f.debug_tuple("Conditional").field(branches).finish()
            }
            RenderStep::Case(case) => f.debug_tuple("Case").field(case).finish(),
            RenderStep::Capture(capture) => f.debug_tuple("Capture").field(capture).finish(),
            RenderStep::Simple {
                name, parameters, ..
            } => f
                .debug_struct("Simple")
                .field("name", name)
                .field("parameters", parameters)
                .finish(),
        }
    }
}

/// Render steps in order, stopping early on a loop signal
pub fn render_steps(
    steps: &[RenderStep],
    out: &mut dyn Write,
    ctx: &mut dyn RenderContext,
) -> Result<Flow> {
    for step in steps {
        let flow = step.render(out, ctx)?;
        if flow.is_interrupted() {
            return Ok(flow);
        }
    }
    Ok(Flow::Normal)
}

/// Validates and compiles template trees against a registry
pub struct Compiler<'r> {
    registry: &'r TagRegistry,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r TagRegistry) -> Self {
        Compiler { registry }
    }

    pub fn registry(&self) -> &'r TagRegistry {
        self.registry
    }

    /// Check tag names, branch names and nesting rules for a whole tree
    pub fn validate(&self, nodes: &[Node]) -> Result<()> {
        let mut ancestors = Vec::new();
        self.validate_nodes(nodes, &mut ancestors)
    }

    fn validate_nodes<'n>(&self, nodes: &'n [Node], ancestors: &mut Vec<&'n str>) -> Result<()> {
        for node in nodes {
            if let Node::Tag(tag) = node {
                self.validate_tag(tag, ancestors)?;
            }
        }
        Ok(())
    }

    fn validate_tag<'n>(&self, tag: &'n TagNode, ancestors: &mut Vec<&'n str>) -> Result<()> {
        let definition = self
            .registry
            .get(&tag.name)
            .ok_or_else(|| TagflowError::Syntax(format!("unknown tag '{}'", tag.name)))?;

        let governors = self.registry.governors_of(&tag.name);
        if !governors.is_empty() && !ancestors.iter().any(|a| governors.contains(a)) {
            return Err(TagflowError::Syntax(format!(
                "'{}' used outside of {}",
                tag.name,
                governors.join(" or ")
            )));
        }

        match definition.kind() {
            TagKind::Simple(_) => {
                if !tag.body.is_empty() || !tag.branches.is_empty() {
                    return Err(TagflowError::Syntax(format!(
                        "'{}' is a simple tag and cannot have a body",
                        tag.name
                    )));
                }
                return Ok(());
            }
            // Nothing inside a skipped body is ever compiled
            TagKind::Block(BlockBehavior::SkipBody) => return Ok(()),
            TagKind::Block(BlockBehavior::VerbatimBody) => {
                if tag.body.iter().any(|n| !matches!(n, Node::Text(_))) {
                    return Err(TagflowError::Syntax(format!(
                        "'{}' body may only contain text",
                        tag.name
                    )));
                }
            }
            TagKind::Block(_) => {}
        }

        if definition.branches_only() && tag.body.iter().any(|n| !is_blank(n)) {
            return Err(TagflowError::Syntax(format!(
                "'{}' may only contain whitespace before its first branch",
                tag.name
            )));
        }

        for branch in &tag.branches {
            if !definition.has_branch(&branch.name) {
                return Err(TagflowError::Syntax(format!(
                    "'{}' is not a branch of '{}'",
                    branch.name, tag.name
                )));
            }
            if !branch.branches.is_empty() {
                return Err(TagflowError::Syntax(format!(
                    "branch '{}' of '{}' cannot have branches of its own",
                    branch.name, tag.name
                )));
            }
        }

        ancestors.push(&tag.name);
        let result = self.validate_nodes(&tag.body, ancestors).and_then(|_| {
            tag.branches
                .iter()
                .try_for_each(|branch| self.validate_nodes(&branch.body, ancestors))
        });
        ancestors.pop();
        result
    }

    /// Compile a sequence of nodes into render steps
    pub fn compile_body(&self, nodes: &[Node]) -> Result<Vec<RenderStep>> {
        let mut steps = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Text(text) => steps.push(RenderStep::Text(text.clone())),
                Node::Output(expr) => steps.push(RenderStep::Output(Expression::parse(expr)?)),
                Node::Tag(tag) => {
                    if let Some(step) = self.compile_tag(tag)? {
                        steps.push(step);
                    }
                }
            }
        }
        Ok(steps)
    }

    /// Compile one tag occurrence; `None` when the tag renders nothing
    pub fn compile_tag(&self, tag: &TagNode) -> Result<Option<RenderStep>> {
        let definition = self
            .registry
            .get(&tag.name)
            .ok_or_else(|| TagflowError::Syntax(format!("unknown tag '{}'", tag.name)))?;

        match definition.kind() {
            TagKind::Simple(render) => Ok(Some(RenderStep::Simple {
                name: tag.name.clone(),
                render,
                parameters: tag.parameters.clone(),
            })),
            TagKind::Block(BlockBehavior::Compiled(compile)) => compile(tag, self).map(Some),
            TagKind::Block(BlockBehavior::SkipBody) => Ok(None),
            TagKind::Block(BlockBehavior::VerbatimBody) => {
                let mut text = String::new();
                for node in &tag.body {
                    match node {
                        Node::Text(t) => text.push_str(t),
                        _ => {
                            return Err(TagflowError::Syntax(format!(
                                "'{}' body may only contain text",
                                tag.name
                            )))
                        }
                    }
                }
                Ok(Some(RenderStep::Text(text)))
            }
            TagKind::Block(BlockBehavior::External) => Err(TagflowError::UnsupportedTag(format!(
                "'{}' has no compiler registered",
                tag.name
            ))),
        }
    }
}

fn is_blank(node: &Node) -> bool {
    matches!(node, Node::Text(text) if text.trim().is_empty())
}
