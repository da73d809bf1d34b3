// Prompt assembly and the HTTP operations that drive the template engine.

pub mod assembler;
pub mod handlers;

pub use assembler::{assemble, PromptParts};
