//! tagflow - control-flow tags for a Liquid-style template language
//!
//! Registers block and simple tags, validates parsed template trees against
//! that registry, compiles `if`/`unless`, `case`/`when` and `capture` into
//! render steps, and evaluates them against a per-render context.

pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::TagflowError;
