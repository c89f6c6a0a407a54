use serde::{Deserialize, Serialize};

// GET /
#[derive(Debug, Default, Deserialize)]
pub struct IndexParams {
    pub error: Option<String>,
}

// GET /callback
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
}

// Health check
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
