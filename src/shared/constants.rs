/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Version of the prompt document schema accepted by every entry point
pub const PROMPT_SCHEMA_VERSION: u32 = 1;

/// Root directory of prompt files inside the target repository
pub const PROMPTS_ROOT: &str = "prompts";

/// Status assigned to synced prompts that carry none
pub const DEFAULT_PROMPT_STATUS: &str = "draft";

/// Statuses a synced prompt may carry; files with any other status are skipped
pub const SYNC_STATUSES: &[&str] = &[
    "active",
    "public",
    "draft",
    "private",
    "archived",
    "pending_review",
];

/// Status that makes a database row publicly listed
pub const PUBLIC_PROMPT_STATUS: &str = "active";

/// Header carrying the shared secret for non-browser clients
pub const API_KEY_HEADER: &str = "x-api-key";

pub const PROMPTS_CACHE_CONTROL: &str = "s-maxage=600, stale-while-revalidate=60";
pub const CONFIG_CACHE_CONTROL: &str = "s-maxage=3600, stale-while-revalidate=60";
