pub mod catalog_service;
pub mod pull_request;
pub mod repository;
pub mod submission_service;
pub mod sync_service;

pub use catalog_service::{CatalogService, GitHubCatalog, PostgresCatalog, PromptCatalog, PromptListing};
pub use repository::PromptRepository;
pub use submission_service::SubmissionService;
pub use sync_service::SyncService;
