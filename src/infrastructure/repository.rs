//! File system access for templates and variables

use crate::domain::{TemplateSource, Value};
use crate::error::{Result, TagflowError};
use crate::infrastructure::config::CONFIG_FILE;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Abstract source of template trees and variable files
pub trait TemplateRepository {
    /// Load a parsed template tree
    fn load_template(&self, path: &Path) -> Result<TemplateSource>;

    /// Load top-level variables
    fn load_variables(&self, path: &Path) -> Result<HashMap<String, Value>>;

    /// List template files at a path (a single file, or a directory tree)
    fn find_templates(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// File system implementation of TemplateRepository
///
/// Template trees and variables are stored as TOML documents.
#[derive(Debug, Clone, Default)]
pub struct FileSystemRepository;

impl FileSystemRepository {
    pub fn new() -> Self {
        FileSystemRepository
    }

    fn read(path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TagflowError::TemplateNotFound(path.to_path_buf())
            } else {
                TagflowError::Io(e)
            }
        })
    }

    fn is_template_file(path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "toml")
            && path.file_name().is_some_and(|name| name != CONFIG_FILE)
    }
}

impl TemplateRepository for FileSystemRepository {
    fn load_template(&self, path: &Path) -> Result<TemplateSource> {
        TemplateSource::from_toml(&Self::read(path)?)
    }

    fn load_variables(&self, path: &Path) -> Result<HashMap<String, Value>> {
        let contents = fs::read_to_string(path).map_err(|e| {
            TagflowError::Config(format!(
                "Failed to read variables file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(toml::from_str(&contents)?)
    }

    fn find_templates(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if path.is_file() {
            return Ok(vec![path.to_path_buf()]);
        }
        if !path.is_dir() {
            return Err(TagflowError::TemplateNotFound(path.to_path_buf()));
        }

        let walker = WalkDir::new(path).into_iter().filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            entry
                .file_name()
                .to_str()
                .is_none_or(|name| !name.starts_with('.'))
        });

        let mut templates = Vec::new();
        for entry in walker {
            let Ok(entry) = entry else {
                continue;
            };
            if entry.file_type().is_file() && Self::is_template_file(entry.path()) {
                templates.push(entry.into_path());
            }
        }

        templates.sort();
        Ok(templates)
    }
}
