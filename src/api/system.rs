use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiResult;

/// Backend identity reported by `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub app_name: String,
    pub app_version: String,
}

pub async fn health(client: &ApiClient) -> ApiResult<HealthStatus> {
    client.get("/health", &[]).await
}
