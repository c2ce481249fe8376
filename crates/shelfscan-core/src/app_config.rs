use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub static_dir: PathBuf,
    /// Origin of the marketplace, e.g. `https://www.amazon.com.br`.
    pub site_url: String,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub scraper_max_redirects: usize,
    pub scraper_max_attempts: u32,
    pub scraper_retry_jitter_min_ms: u64,
    pub scraper_retry_jitter_max_ms: u64,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window_secs: u64,
}
