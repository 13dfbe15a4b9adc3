//! Application layer - Use cases and orchestration

pub mod check_templates;
pub mod list_tags;
pub mod render_template;

pub use check_templates::{CheckReport, CheckTemplatesService};
pub use list_tags::{ListTagsService, TagSummary};
pub use render_template::{RenderOptions, RenderTemplateService};
