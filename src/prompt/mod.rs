// src/prompt/mod.rs
// Instruction text composition: section builders, the ordering table and the joiner

pub mod compose;
pub mod pipeline;
pub mod sections;

pub use compose::{SECTION_SEPARATOR, compose};
pub use pipeline::{
    CompositionInput, CompositionMode, SectionKind, ToolHint, compose_for_mode, section_plan,
};
