//! Domain layer - Values, expressions, templates and tags

pub mod context;
pub mod expression;
pub mod tags;
pub mod template;
pub mod value;

pub use context::{Context, Flow, RenderContext};
pub use expression::Expression;
pub use template::{Node, TagNode, Template, TemplateSource};
pub use value::Value;
