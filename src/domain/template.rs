//! Parsed template trees and compiled templates
//!
//! A template arrives here already parsed into [`Node`]s. Compilation checks
//! the tree against a [`TagRegistry`] and turns every tag occurrence into a
//! [`RenderStep`].

use super::context::RenderContext;
use super::tags::{render_steps, Compiler, RenderStep, TagRegistry};
use crate::error::{Result, TagflowError};
use serde::Deserialize;
use std::io::Write;

/// A node of a parsed template
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Node {
    /// Literal text
    Text(String),
    /// An output expression, `{{ expr }}`
    Output(String),
    /// A tag occurrence, `{% name parameters %}`
    Tag(TagNode),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn output(expr: impl Into<String>) -> Self {
        Node::Output(expr.into())
    }
}

impl From<TagNode> for Node {
    fn from(tag: TagNode) -> Self {
        Node::Tag(tag)
    }
}

/// A parsed tag occurrence
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagNode {
    /// Tag keyword (e.g., "if")
    pub name: String,

    /// Raw, unparsed argument text
    #[serde(default)]
    pub parameters: String,

    /// Child nodes directly under the tag
    #[serde(default)]
    pub body: Vec<Node>,

    /// Secondary clauses (elsif/else under if, when under case)
    #[serde(default)]
    pub branches: Vec<TagNode>,
}

impl TagNode {
    pub fn new(name: impl Into<String>, parameters: impl Into<String>) -> Self {
        TagNode {
            name: name.into(),
            parameters: parameters.into(),
            ..Default::default()
        }
    }

    /// Append a child node to the body
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.body.push(node.into());
        self
    }

    /// Append a secondary clause
    pub fn branch(mut self, branch: TagNode) -> Self {
        self.branches.push(branch);
        self
    }
}

/// Serialized form of a parsed template
///
/// ```
/// use tagflow::domain::TemplateSource;
///
/// let source = TemplateSource::from_toml(
///     r#"
///     [[body]]
///     text = "Hello "
///
///     [[body]]
///     output = "name"
///     "#,
/// )
/// .unwrap();
/// assert_eq!(source.body.len(), 2);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateSource {
    #[serde(default)]
    pub body: Vec<Node>,
}

impl TemplateSource {
    /// Parse a template tree from TOML
    pub fn from_toml(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }
}

/// A validated, compiled template
#[derive(Debug)]
pub struct Template {
    steps: Vec<RenderStep>,
}

impl Template {
    /// Validate and compile a template tree
    pub fn compile(registry: &TagRegistry, nodes: &[Node]) -> Result<Self> {
        let compiler = Compiler::new(registry);
        compiler.validate(nodes)?;
        Ok(Template {
            steps: compiler.compile_body(nodes)?,
        })
    }

    pub fn steps(&self) -> &[RenderStep] {
        &self.steps
    }

    /// Render the whole template to a writer
    pub fn render_to(&self, out: &mut dyn Write, ctx: &mut dyn RenderContext) -> Result<()> {
        // Loop signals cannot escape a validated template; nothing consumes them here.
        render_steps(&self.steps, out, ctx)?;
        Ok(())
    }

    /// Render the whole template to a string
    pub fn render(&self, ctx: &mut dyn RenderContext) -> Result<String> {
        let mut buffer = Vec::new();
        self.render_to(&mut buffer, ctx)?;
        String::from_utf8(buffer)
            .map_err(|e| TagflowError::Render(format!("output is not UTF-8: {}", e)))
    }
}
