//! Error types for tagflow

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tagflow
#[derive(Debug, Error)]
pub enum TagflowError {
    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Invalid expression '{text}': {reason}")]
    Expression { text: String, reason: String },

    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("Unsupported tag: {0}")]
    UnsupportedTag(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),
}

impl TagflowError {
    /// Build an expression error for the given source text
    pub fn expression(text: &str, reason: impl Into<String>) -> Self {
        TagflowError::Expression {
            text: text.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error was raised while compiling rather than rendering
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            TagflowError::Syntax(_)
                | TagflowError::Expression { .. }
                | TagflowError::UnsupportedTag(_)
        )
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            TagflowError::Registry(_) => 70,
            TagflowError::Syntax(_)
            | TagflowError::Expression { .. }
            | TagflowError::UnsupportedTag(_) => 2,
            TagflowError::UndefinedVariable(_) | TagflowError::Render(_) => 3,
            TagflowError::TemplateNotFound(_) => 4,
            _ => 1,
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn display_with_suggestions(&self) -> String {
        match self {
            TagflowError::TemplateNotFound(path) => {
                format!(
                    "Template not found: {}\n\n\
                    Suggestions:\n\
                    • Check the path passed to 'tagflow render'\n\
                    • Templates are TOML documents with a top-level [[body]] array",
                    path.display()
                )
            }
            TagflowError::UndefinedVariable(name) => {
                format!(
                    "Undefined variable: '{}'\n\n\
                    Suggestions:\n\
                    • Define it in the variables file (--vars vars.toml)\n\
                    • Drop --strict (or set strict_variables = false in tagflow.toml) \
                    to treat undefined variables as nil",
                    name
                )
            }
            TagflowError::Syntax(msg) => {
                if msg.contains("outside") {
                    format!(
                        "{}\n\n\
                        Loop tags (break, continue, cycle) are only valid inside for or tablerow.\n\
                        Run 'tagflow tags' to see which tags govern which.",
                        self
                    )
                } else if msg.contains("is not a branch of") {
                    format!(
                        "{}\n\n\
                        Valid branches: if/unless take elsif and else, case takes when.\n\
                        Note: case does not support else.",
                        self
                    )
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        }
    }
}

/// Result type using TagflowError
pub type Result<T> = std::result::Result<T, TagflowError>;
