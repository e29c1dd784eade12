mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::{Config, PromptSource};
use crate::core::database;
use crate::core::router::{build_router, AppServices};
use crate::features::notifications::NotificationService;
use crate::features::prompts::services::{
    CatalogService, GitHubCatalog, PostgresCatalog, PromptCatalog, PromptRepository,
    SubmissionService, SyncService,
};
use crate::modules::github::{GitHost, GitHubClient};
use crate::modules::telegram::TelegramClient;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );

    tracing::info!(
        "Configuration loaded successfully (environment: {:?})",
        config.app.environment
    );
    let expose = config.app.expose_error_details();

    // Optional Postgres mirror
    let pool = match &config.database {
        Some(db) => {
            let pool = database::connect(db).await?;
            tracing::info!("Database connection pool created");
            Some(pool)
        }
        None => {
            tracing::info!("DATABASE_URL not set, database features disabled");
            None
        }
    };

    // GitHub client shared by every prompt service
    let github: Arc<dyn GitHost> = Arc::new(
        GitHubClient::new(&config.github)
            .map_err(|e| anyhow::anyhow!("Failed to create GitHub client: {}", e))?,
    );
    let repository = || PromptRepository::new(Arc::clone(&github), config.github.main_branch.clone());
    tracing::info!(
        "GitHub client initialized for {}/{} (branch: {}, mode: {:?})",
        config.github.owner,
        config.github.repo,
        config.github.main_branch,
        config.github.submission_mode
    );

    let submission_service = Arc::new(SubmissionService::new(
        repository(),
        config.github.submission_mode,
        expose,
    ));

    let catalog: Arc<dyn PromptCatalog> = match (config.catalog.source, &pool) {
        (PromptSource::Database, Some(pool)) => Arc::new(PostgresCatalog::new(pool.clone())),
        (PromptSource::Database, None) => {
            anyhow::bail!("PROMPT_SOURCE=database requires DATABASE_URL")
        }
        (PromptSource::GitHub, _) => Arc::new(GitHubCatalog::new(repository(), expose)),
    };
    let catalog_service = Arc::new(CatalogService::new(catalog));
    tracing::info!("Prompt catalog initialized (source: {:?})", config.catalog.source);

    let sync_service = Arc::new(SyncService::new(repository(), pool.clone(), expose));

    // Telegram relay
    if config.telegram.bot_token.is_none() || config.telegram.chat_id.is_none() {
        tracing::warn!("Telegram secrets are not configured; feedback and notices will fail");
    }
    let notifier = Arc::new(TelegramClient::new(&config.telegram.api_base_url));
    let notification_service = Arc::new(NotificationService::new(
        notifier,
        config.telegram.clone(),
        expose,
    ));

    let services = AppServices {
        submission: submission_service,
        catalog: catalog_service,
        sync: sync_service,
        notifications: notification_service,
        public_config: Arc::new(config.public.clone()),
    };

    let app = build_router(services, &config.app, &config.swagger);

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
