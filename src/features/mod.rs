pub mod notifications;
pub mod prompts;
pub mod settings;
