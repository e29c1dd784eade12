use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::config::PublicConfig;

/// Client configuration read by the browser at startup
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfigDto {
    pub public_key: Option<String>,
    pub constructor_enabled: bool,
}

impl From<&PublicConfig> for PublicConfigDto {
    fn from(config: &PublicConfig) -> Self {
        Self {
            public_key: config.public_key.clone(),
            constructor_enabled: config.constructor_enabled,
        }
    }
}
