//! Tag registry
//!
//! Maps tag names to their definitions: whether a tag is simple or a block,
//! which secondary clauses (branches) a block accepts, which tags are only legal
//! inside it, and how an occurrence is compiled.
//!
//! A registry is built once at startup and only read afterwards.
//!
//! # Examples
//!
//! ```
//! use tagflow::domain::tags::TagRegistry;
//!
//! let mut registry = TagRegistry::new();
//! registry.define_block_tag("comment").skips_body().define().unwrap();
//! registry
//!     .define_block_tag("loop")
//!     .governs(&["stop"])
//!     .define()
//!     .unwrap();
//!
//! assert!(registry.get("comment").unwrap().is_block());
//! assert_eq!(registry.governors_of("stop"), vec!["loop"]);
//! ```

use super::compiler::{Compiler, RenderStep};
use crate::domain::context::{Flow, RenderContext};
use crate::domain::template::TagNode;
use crate::error::{Result, TagflowError};
use std::collections::BTreeMap;
use std::io::Write;

/// Turns one block tag occurrence into a render step
pub type CompileFn = fn(&TagNode, &Compiler<'_>) -> Result<RenderStep>;

/// Renders a simple tag given its raw parameters
pub type SimpleTagFn = fn(&mut dyn Write, &mut dyn RenderContext, &str) -> Result<Flow>;

/// How a block tag's occurrences are turned into render steps
#[derive(Debug, Clone, Copy)]
pub enum BlockBehavior {
    /// Compiled by a tag-specific function
    Compiled(CompileFn),
    /// Body is dropped (e.g., `comment`)
    SkipBody,
    /// Body text is emitted as-is (e.g., `raw`)
    VerbatimBody,
    /// Needs a compiler supplied by another engine (e.g., loop tags)
    External,
}

/// Kind of a registered tag
#[derive(Debug, Clone, Copy)]
pub enum TagKind {
    Simple(SimpleTagFn),
    Block(BlockBehavior),
}

/// Registry entry for one tag name
#[derive(Debug, Clone)]
pub struct TagDefinition {
    name: String,
    kind: TagKind,
    branches: Vec<String>,
    governs: Vec<String>,
    syntax_alias: Option<String>,
    branches_only: bool,
}

impl TagDefinition {
    fn new(name: &str, kind: TagKind) -> Self {
        TagDefinition {
            name: name.to_string(),
            kind,
            branches: Vec::new(),
            governs: Vec::new(),
            syntax_alias: None,
            branches_only: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }

    pub fn is_block(&self) -> bool {
        matches!(self.kind, TagKind::Block(_))
    }

    /// Secondary clause names, in order of first declaration
    pub fn branches(&self) -> &[String] {
        &self.branches
    }

    pub fn has_branch(&self, name: &str) -> bool {
        self.branches.iter().any(|b| b == name)
    }

    /// Tags that are only legal inside this tag
    pub fn governed_tags(&self) -> &[String] {
        &self.governs
    }

    pub fn governs(&self, name: &str) -> bool {
        self.governs.iter().any(|g| g == name)
    }

    /// Name of the tag whose branch/governance shape this one reuses
    pub fn syntax_alias(&self) -> Option<&str> {
        self.syntax_alias.as_deref()
    }

    /// Whether only whitespace may appear before the first branch
    pub fn branches_only(&self) -> bool {
        self.branches_only
    }
}

/// Name-keyed table of tag definitions
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    definitions: BTreeMap<String, TagDefinition>,
}

impl TagRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a non-block tag with a fixed render function
    pub fn define_simple_tag(&mut self, name: &str, render: SimpleTagFn) -> Result<()> {
        self.insert(TagDefinition::new(name, TagKind::Simple(render)))
    }

    /// Start registering a block tag
    ///
    /// Nothing is registered until [`BlockTagBuilder::define`] is called.
    pub fn define_block_tag(&mut self, name: &str) -> BlockTagBuilder<'_> {
        BlockTagBuilder {
            registry: self,
            definition: TagDefinition::new(name, TagKind::Block(BlockBehavior::External)),
        }
    }

    /// Look up a definition by tag name
    pub fn get(&self, name: &str) -> Option<&TagDefinition> {
        self.definitions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// All definitions, sorted by name
    pub fn definitions(&self) -> impl Iterator<Item = &TagDefinition> {
        self.definitions.values()
    }

    /// Names of the tags that govern `name`
    ///
    /// Empty when `name` may appear anywhere.
    pub fn governors_of(&self, name: &str) -> Vec<&str> {
        self.definitions
            .values()
            .filter(|def| def.governs(name))
            .map(|def| def.name())
            .collect()
    }

    fn insert(&mut self, definition: TagDefinition) -> Result<()> {
        if definition.name.trim().is_empty() {
            return Err(TagflowError::Registry("tag name cannot be empty".to_string()));
        }
        if self.definitions.contains_key(&definition.name) {
            return Err(TagflowError::Registry(format!(
                "tag '{}' is already defined",
                definition.name
            )));
        }
        self.definitions.insert(definition.name.clone(), definition);
        Ok(())
    }
}

/// Builder for a block tag definition
#[must_use = "a block tag is only registered once define() is called"]
pub struct BlockTagBuilder<'r> {
    registry: &'r mut TagRegistry,
    definition: TagDefinition,
}

impl BlockTagBuilder<'_> {
    /// Declare a secondary clause name (repeatable, order preserved)
    pub fn branch(mut self, name: &str) -> Self {
        if !self.definition.has_branch(name) {
            self.definition.branches.push(name.to_string());
        }
        self
    }

    /// Declare tags that are only legal inside this block
    pub fn governs(mut self, names: &[&str]) -> Self {
        for name in names {
            if !self.definition.governs(name) {
                self.definition.governs.push(name.to_string());
            }
        }
        self
    }

    /// Reuse the branch and governance shape of an already registered tag
    pub fn same_syntax_as(mut self, name: &str) -> Self {
        self.definition.syntax_alias = Some(name.to_string());
        self
    }

    /// Supply the function that compiles occurrences of this tag
    pub fn with_compiler(mut self, compile: CompileFn) -> Self {
        self.definition.kind = TagKind::Block(BlockBehavior::Compiled(compile));
        self
    }

    /// Render nothing for this tag's body
    pub fn skips_body(mut self) -> Self {
        self.definition.kind = TagKind::Block(BlockBehavior::SkipBody);
        self
    }

    /// Emit this tag's body text unchanged
    pub fn verbatim_body(mut self) -> Self {
        self.definition.kind = TagKind::Block(BlockBehavior::VerbatimBody);
        self
    }

    /// Only allow whitespace before the first branch
    pub fn branches_only(mut self) -> Self {
        self.definition.branches_only = true;
        self
    }

    /// Register the definition
    ///
    /// Fails when the name is already taken or the syntax alias is unknown.
    pub fn define(self) -> Result<()> {
        let BlockTagBuilder {
            registry,
            mut definition,
        } = self;

        if let Some(alias) = &definition.syntax_alias {
            let source = registry.get(alias).ok_or_else(|| {
                TagflowError::Registry(format!(
                    "tag '{}' copies the syntax of undefined tag '{}'",
                    definition.name, alias
                ))
            })?;
            let mut branches = source.branches.clone();
            let mut governs = source.governs.clone();
            let branches_only = source.branches_only;
            for name in definition.branches.drain(..) {
                if !branches.contains(&name) {
                    branches.push(name);
                }
            }
            for name in definition.governs.drain(..) {
                if !governs.contains(&name) {
                    governs.push(name);
                }
            }
            definition.branches = branches;
            definition.governs = governs;
            definition.branches_only |= branches_only;
        }

        registry.insert(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut dyn Write, _: &mut dyn RenderContext, _: &str) -> Result<Flow> {
        Ok(Flow::Normal)
    }

    #[test]
    fn test_define_simple_tag() {
        let mut registry = TagRegistry::new();
        registry.define_simple_tag("stop", noop).unwrap();
        let def = registry.get("stop").unwrap();
        assert!(!def.is_block());
        assert!(def.branches().is_empty());
        assert!(matches!(def.kind(), TagKind::Simple(_)));
    }

    #[test]
    fn test_branches_keep_first_declaration_order() {
        let mut registry = TagRegistry::new();
        registry
            .define_block_tag("if")
            .branch("else")
            .branch("elsif")
            .branch("else")
            .define()
            .unwrap();
        assert_eq!(registry.get("if").unwrap().branches(), ["else", "elsif"]);
    }

    #[test]
    fn test_duplicate_definition_fails() {
        let mut registry = TagRegistry::new();
        registry.define_block_tag("if").define().unwrap();
        let err = registry.define_block_tag("if").define().unwrap_err();
        assert!(matches!(err, TagflowError::Registry(_)));
        assert!(err.to_string().contains("already defined"));

        let err = registry.define_simple_tag("if", noop).unwrap_err();
        assert!(matches!(err, TagflowError::Registry(_)));
    }

    #[test]
    fn test_empty_name_fails() {
        let mut registry = TagRegistry::new();
        assert!(registry.define_simple_tag(" ", noop).is_err());
    }

    #[test]
    fn test_same_syntax_as_copies_shape() {
        let mut registry = TagRegistry::new();
        registry
            .define_block_tag("if")
            .branch("else")
            .branch("elsif")
            .define()
            .unwrap();
        registry
            .define_block_tag("unless")
            .same_syntax_as("if")
            .define()
            .unwrap();

        let unless = registry.get("unless").unwrap();
        assert_eq!(unless.branches(), ["else", "elsif"]);
        assert_eq!(unless.syntax_alias(), Some("if"));
    }

    #[test]
    fn test_same_syntax_as_unknown_tag_fails() {
        let mut registry = TagRegistry::new();
        let err = registry
            .define_block_tag("unless")
            .same_syntax_as("if")
            .define()
            .unwrap_err();
        assert!(err.to_string().contains("undefined tag 'if'"));
        assert!(!registry.contains("unless"));
    }

    #[test]
    fn test_governors_of() {
        let mut registry = TagRegistry::new();
        registry
            .define_block_tag("for")
            .governs(&["break", "continue"])
            .define()
            .unwrap();
        registry
            .define_block_tag("tablerow")
            .governs(&["break"])
            .define()
            .unwrap();

        assert_eq!(registry.governors_of("break"), vec!["for", "tablerow"]);
        assert_eq!(registry.governors_of("continue"), vec!["for"]);
        assert!(registry.governors_of("if").is_empty());
    }

    #[test]
    fn test_block_without_compiler_is_external() {
        let mut registry = TagRegistry::new();
        registry.define_block_tag("for").define().unwrap();
        assert!(matches!(
            registry.get("for").unwrap().kind(),
            TagKind::Block(BlockBehavior::External)
        ));
    }
}
