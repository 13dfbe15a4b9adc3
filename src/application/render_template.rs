//! Render template use case
//!
//! Loads a template tree and its variables, compiles the tree against the
//! registry and renders it once.

use crate::domain::tags::TagRegistry;
use crate::domain::{Context, Template};
use crate::error::Result;
use crate::infrastructure::{Config, TemplateRepository};
use std::path::PathBuf;

/// Options for rendering
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Template tree file
    pub template: PathBuf,

    /// Variables file (None = the one from config, if any)
    pub variables: Option<PathBuf>,

    /// Strict variables (None = use config)
    pub strict: Option<bool>,
}

/// Service for rendering templates
pub struct RenderTemplateService<'r, R: TemplateRepository> {
    repository: R,
    registry: &'r TagRegistry,
}

impl<'r, R: TemplateRepository> RenderTemplateService<'r, R> {
    /// Create a new render service
    pub fn new(repository: R, registry: &'r TagRegistry) -> Self {
        RenderTemplateService {
            repository,
            registry,
        }
    }

    /// Execute the render and return the output
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The template or variables file cannot be read
    /// - The template fails validation or compilation
    /// - Rendering fails (e.g., an undefined variable in strict mode)
    pub fn execute(&self, options: &RenderOptions, config: &Config) -> Result<String> {
        // 1. Load and compile the template
        let source = self.repository.load_template(&options.template)?;
        let template = Template::compile(self.registry, &source.body)?;

        // 2. Load variables
        let variables = match options.variables.as_ref().or(config.variables.as_ref()) {
            Some(path) => self.repository.load_variables(path)?,
            None => Default::default(),
        };

        // 3. Render
        let strict = options.strict.unwrap_or(config.strict_variables);
        let mut ctx = Context::with_variables(variables).strict(strict);
        template.render(&mut ctx)
    }
}
