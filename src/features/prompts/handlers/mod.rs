pub mod prompt_handler;

pub use prompt_handler::{
    __path_create_prompt_issue, __path_get_prompts, __path_sync_prompts, create_prompt_issue,
    get_prompts, sync_prompts,
};
