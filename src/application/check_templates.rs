//! Check templates use case

use crate::domain::tags::TagRegistry;
use crate::domain::Template;
use crate::error::Result;
use crate::infrastructure::TemplateRepository;
use std::path::{Path, PathBuf};

/// Outcome of checking one template file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub path: PathBuf,
    /// None when the template compiled cleanly
    pub error: Option<String>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Service for validating and compiling templates without rendering them
pub struct CheckTemplatesService<'r, R: TemplateRepository> {
    repository: R,
    registry: &'r TagRegistry,
}

impl<'r, R: TemplateRepository> CheckTemplatesService<'r, R> {
    /// Create a new check service
    pub fn new(repository: R, registry: &'r TagRegistry) -> Self {
        CheckTemplatesService {
            repository,
            registry,
        }
    }

    /// Check one file or every template under a directory
    ///
    /// Per-template failures are reported, not returned; only failing to find
    /// templates at all is an error.
    pub fn execute(&self, path: &Path) -> Result<Vec<CheckReport>> {
        let templates = self.repository.find_templates(path)?;

        Ok(templates
            .into_iter()
            .map(|path| {
                let error = self.check_one(&path).err().map(|e| e.to_string());
                CheckReport { path, error }
            })
            .collect())
    }

    fn check_one(&self, path: &Path) -> Result<()> {
        let source = self.repository.load_template(path)?;
        Template::compile(self.registry, &source.body)?;
        Ok(())
    }
}
