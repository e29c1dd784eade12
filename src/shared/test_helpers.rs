//! Full application wired to in-memory GitHub and Telegram fakes.

use axum_test::TestServer;
use std::sync::Arc;

use crate::core::config::{
    AppConfig, AppEnvironment, PublicConfig, SubmissionMode, SwaggerConfig, TelegramConfig,
};
use crate::core::router::{build_router, AppServices};
use crate::features::notifications::NotificationService;
use crate::features::prompts::services::{
    CatalogService, GitHubCatalog, PromptRepository, SubmissionService, SyncService,
};
use crate::modules::github::memory::InMemoryGitHost;
use crate::modules::telegram::recording::RecordingNotifier;

pub const ALLOWED_ORIGIN: &str = "https://prompt-hub.example.com";
pub const API_SECRET: &str = "test-secret";

pub struct TestApp {
    pub server: TestServer,
    pub host: Arc<InMemoryGitHost>,
    pub notifier: Arc<RecordingNotifier>,
}

fn app_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: AppEnvironment::Production,
        cors_allowed_origins: vec![ALLOWED_ORIGIN.to_string()],
        api_secret_key: Some(API_SECRET.to_string()),
        max_request_body_size: 64 * 1024,
    }
}

fn swagger_config() -> SwaggerConfig {
    SwaggerConfig {
        username: None,
        password: None,
        title: "Prompt Hub API".to_string(),
        version: "test".to_string(),
        description: "test".to_string(),
    }
}

/// Repository with one published prompt on `main`
pub fn seeded_host() -> Arc<InMemoryGitHost> {
    let host = Arc::new(InMemoryGitHost::new("acme", "prompt-library", "main"));
    host.seed(&[(
        "prompts/writing/0b6d7a8e-2f7c-4a55-9d0e-5b1f3c2a4e61.json",
        r#"{
  "id": "0b6d7a8e-2f7c-4a55-9d0e-5b1f3c2a4e61",
  "title": "Seeded prompt",
  "version": "1.0.0",
  "category": "writing",
  "status": "active",
  "content": {"en": "Write a haiku"},
  "created_at": "2024-05-01T10:00:00Z"
}
"#,
    )]);
    host
}

pub fn test_app() -> TestApp {
    let host = seeded_host();
    let notifier = Arc::new(RecordingNotifier::default());
    let app = app_config();
    let expose = app.expose_error_details();

    let services = AppServices {
        submission: Arc::new(SubmissionService::new(
            PromptRepository::new(host.clone(), "main"),
            SubmissionMode::CreateOrEdit,
            expose,
        )),
        catalog: Arc::new(CatalogService::new(Arc::new(GitHubCatalog::new(
            PromptRepository::new(host.clone(), "main"),
            expose,
        )))),
        sync: Arc::new(SyncService::new(
            PromptRepository::new(host.clone(), "main"),
            None,
            expose,
        )),
        notifications: Arc::new(NotificationService::new(
            notifier.clone(),
            TelegramConfig {
                bot_token: Some("123:abc".to_string()),
                chat_id: Some("-100200".to_string()),
                api_base_url: "https://api.telegram.org".to_string(),
            },
            expose,
        )),
        public_config: Arc::new(PublicConfig {
            public_key: None,
            constructor_enabled: false,
        }),
    };

    let router = build_router(services, &app, &swagger_config());
    let server = TestServer::new(router).expect("test server");

    TestApp {
        server,
        host,
        notifier,
    }
}
