//! Token-budgeted prompt construction.

mod assembler;
mod template;

pub use assembler::{estimate_tokens, render_line, AssemblerConfig, PromptAssembler};
pub use template::{Template, CURRENT_TIME_FORMAT};
