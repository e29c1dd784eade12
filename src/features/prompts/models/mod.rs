pub mod prompt;
pub mod prompt_row;

pub use prompt::{LocalizedContent, Prompt, PromptVariable, PromptVariant, VariantId};
pub use prompt_row::PromptRow;
