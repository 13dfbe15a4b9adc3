//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tagflow")]
#[command(about = "Compile and render control-flow tags in parsed templates", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a template tree
    Render {
        /// Template tree file (TOML)
        template: PathBuf,

        /// Variables file (TOML)
        #[arg(long, value_name = "FILE")]
        vars: Option<PathBuf>,

        /// Treat undefined variables as errors
        #[arg(long)]
        strict: bool,
    },

    /// Validate and compile templates without rendering
    Check {
        /// Template file or directory of templates
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// List registered tags
    Tags,
}
