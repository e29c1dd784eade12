use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: Option<DatabaseConfig>,
    pub github: GitHubConfig,
    pub telegram: TelegramConfig,
    pub public: PublicConfig,
    pub catalog: CatalogConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: AppEnvironment,
    pub cors_allowed_origins: Vec<String>,
    pub api_secret_key: Option<String>,
    pub max_request_body_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Target repository for prompt files and pull requests
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub main_branch: String,
    pub api_base_url: String,
    pub timeout: Duration,
    pub submission_mode: SubmissionMode,
}

/// Whether a submission for an id that already exists is rejected or treated as an edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionMode {
    CreateOnly,
    CreateOrEdit,
}

/// Telegram Bot API settings. Both secrets are optional at startup; the relay
/// endpoints answer with a configuration error when they are missing.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub api_base_url: String,
}

/// Values exposed to the browser through `/api/config`
#[derive(Debug, Clone)]
pub struct PublicConfig {
    pub public_key: Option<String>,
    pub constructor_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptSource {
    GitHub,
    Database,
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub source: PromptSource,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Reads an optional variable, treating an empty value as unset
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn required_var(name: &str) -> Result<String, String> {
    optional_var(name).ok_or_else(|| format!("{} environment variable is required", name))
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        let catalog = CatalogConfig::from_env()?;
        let database = DatabaseConfig::from_env()?;

        if catalog.source == PromptSource::Database && database.is_none() {
            return Err("PROMPT_SOURCE=database requires DATABASE_URL".to_string());
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database,
            github: GitHubConfig::from_env()?,
            telegram: TelegramConfig::from_env(),
            public: PublicConfig::from_env(),
            catalog,
            swagger: SwaggerConfig::from_env(),
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024; // 1MB
    const DEV_ORIGIN: &'static str = "http://localhost:3000";

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let environment = AppEnvironment::parse(
            &env::var("APP_ENV").unwrap_or_else(|_| "production".to_string()),
        );

        let vercel_url = env::var("VERCEL_URL").unwrap_or_else(|_| "localhost:3000".to_string());
        let cors_allowed_origins = Self::build_allowed_origins(
            &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default(),
            &vercel_url,
            environment,
        );

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        Ok(Self {
            host,
            port,
            environment,
            cors_allowed_origins,
            api_secret_key: optional_var("API_SECRET_KEY"),
            max_request_body_size,
        })
    }

    /// Comma-separated origins, plus the deployment URL and the local dev origin
    pub fn build_allowed_origins(
        raw: &str,
        vercel_url: &str,
        environment: AppEnvironment,
    ) -> Vec<String> {
        let mut origins: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let deployment = format!("https://{}", vercel_url.trim_end_matches('/'));
        if !origins.contains(&deployment) {
            origins.push(deployment);
        }

        if environment == AppEnvironment::Development
            && !origins.iter().any(|o| o == Self::DEV_ORIGIN)
        {
            origins.push(Self::DEV_ORIGIN.to_string());
        }

        origins
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Upstream diagnostics are only returned to clients outside production
    pub fn expose_error_details(&self) -> bool {
        self.environment == AppEnvironment::Development
    }
}

impl AppEnvironment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => AppEnvironment::Development,
            _ => AppEnvironment::Production,
        }
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    const DEFAULT_MIN_CONNECTIONS: u32 = 0;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    /// Returns `None` when no database is configured
    pub fn from_env() -> Result<Option<Self>, String> {
        let Some(url) = optional_var("DATABASE_URL") else {
            return Ok(None);
        };

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Some(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        }))
    }
}

impl GitHubConfig {
    const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub fn from_env() -> Result<Self, String> {
        let token = required_var("GITHUB_TOKEN")?;
        let owner = required_var("GITHUB_REPO_OWNER")?;
        let repo = required_var("GITHUB_REPO_NAME")?;
        let main_branch = optional_var("GITHUB_MAIN_BRANCH").unwrap_or_else(|| "main".to_string());
        let api_base_url = optional_var("GITHUB_API_URL")
            .unwrap_or_else(|| "https://api.github.com".to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs = env::var("GITHUB_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "GITHUB_TIMEOUT_SECS must be a valid number".to_string())?;

        let submission_mode = SubmissionMode::parse(
            &env::var("SUBMISSION_MODE").unwrap_or_else(|_| "create_or_edit".to_string()),
        )?;

        Ok(Self {
            token,
            owner,
            repo,
            main_branch,
            api_base_url,
            timeout: Duration::from_secs(timeout_secs),
            submission_mode,
        })
    }
}

impl SubmissionMode {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "create_only" | "create-only" => Ok(SubmissionMode::CreateOnly),
            "create_or_edit" | "create-or-edit" | "" => Ok(SubmissionMode::CreateOrEdit),
            other => Err(format!(
                "SUBMISSION_MODE must be 'create_only' or 'create_or_edit', got '{}'",
                other
            )),
        }
    }
}

impl TelegramConfig {
    pub fn from_env() -> Self {
        Self {
            bot_token: optional_var("TELEGRAM_BOT_TOKEN"),
            chat_id: optional_var("TELEGRAM_CHAT_ID"),
            api_base_url: optional_var("TELEGRAM_API_URL")
                .unwrap_or_else(|| "https://api.telegram.org".to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

impl PublicConfig {
    pub fn from_env() -> Self {
        let flag = optional_var("ENABLE_CONSTRUCTOR")
            .or_else(|| optional_var("NEXT_PUBLIC_ENABLE_CONSTRUCTOR"))
            .unwrap_or_default();

        Self {
            public_key: optional_var("PUBLIC_API_KEY"),
            constructor_enabled: flag == "true",
        }
    }
}

impl CatalogConfig {
    pub fn from_env() -> Result<Self, String> {
        let source = match optional_var("PROMPT_SOURCE")
            .unwrap_or_else(|| "github".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "github" => PromptSource::GitHub,
            "database" | "supabase" => PromptSource::Database,
            other => {
                return Err(format!(
                    "PROMPT_SOURCE must be 'github' or 'database', got '{}'",
                    other
                ))
            }
        };

        Ok(Self { source })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Self {
        Self {
            username: optional_var("SWAGGER_USERNAME"),
            password: optional_var("SWAGGER_PASSWORD"),
            title: env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Prompt Hub API".to_string()),
            version: env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string()),
            description: env::var("SWAGGER_DESCRIPTION").unwrap_or_else(|_| {
                "Prompt submissions, listing and notification relay".to_string()
            }),
        }
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}
