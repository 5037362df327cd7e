//! Server-level configuration (bind address, CORS), read from the
//! environment the way `RagConfig::from_env` does: typed fields, explicit
//! defaults, no panics on a missing optional var.

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Allowed CORS origins; empty means permissive (any origin).
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: "0.0.0.0:8080".to_string(), cors_origins: Vec::new() }
    }
}

impl ServerConfig {
    /// Reads `QP_BIND_ADDR` (default `0.0.0.0:8080`) and `QP_CORS_ORIGINS`
    /// (comma-separated, default permissive).
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("QP_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let cors_origins = std::env::var("QP_CORS_ORIGINS")
            .ok()
            .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        Self { bind_addr, cors_origins }
    }
}
