//! Control-flow tags

pub mod branch;
pub mod capture;
pub mod compiler;
pub mod registry;
pub mod signal;
pub mod standard;

// Re-export main types
pub use branch::{BranchTest, CaseStep, CompiledBranch};
pub use capture::CaptureStep;
pub use compiler::{render_steps, Compiler, RenderStep};
pub use registry::{
    BlockBehavior, BlockTagBuilder, CompileFn, SimpleTagFn, TagDefinition, TagKind, TagRegistry,
};
pub use signal::LOOP_TAGS;
