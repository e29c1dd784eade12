pub mod prompt_dto;

pub use prompt_dto::{
    PromptDraft, PromptListItemDto, PromptPageDto, PromptSubmission, SubmissionResponseDto,
    SyncResponseDto,
};
