//! List tags use case

use crate::domain::tags::{BlockBehavior, TagDefinition, TagKind, TagRegistry};

/// Summary of one registered tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSummary {
    pub name: String,
    pub kind: &'static str,
    pub branches: Vec<String>,
    pub governs: Vec<String>,
    pub governed_by: Vec<String>,
}

/// Service for listing registered tags
pub struct ListTagsService<'r> {
    registry: &'r TagRegistry,
}

impl<'r> ListTagsService<'r> {
    /// Create a new list tags service
    pub fn new(registry: &'r TagRegistry) -> Self {
        Self { registry }
    }

    /// Summaries of every registered tag, sorted by name
    pub fn execute(&self) -> Vec<TagSummary> {
        self.registry
            .definitions()
            .map(|def| TagSummary {
                name: def.name().to_string(),
                kind: kind_label(def),
                branches: def.branches().to_vec(),
                governs: def.governed_tags().to_vec(),
                governed_by: self
                    .registry
                    .governors_of(def.name())
                    .into_iter()
                    .map(String::from)
                    .collect(),
            })
            .collect()
    }
}

fn kind_label(def: &TagDefinition) -> &'static str {
    match def.kind() {
        TagKind::Simple(_) => "simple",
        TagKind::Block(BlockBehavior::Compiled(_)) => "block",
        TagKind::Block(BlockBehavior::SkipBody) => "block (skips body)",
        TagKind::Block(BlockBehavior::VerbatimBody) => "block (verbatim)",
        TagKind::Block(BlockBehavior::External) => "block (external)",
    }
}
