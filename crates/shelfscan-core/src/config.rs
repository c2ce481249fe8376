use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Desktop Chrome on Windows. Search pages served to unrecognised agents are
/// far more likely to be a captcha interstitial.
pub(crate) const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("SHELFSCAN_ENV", "development"))?;
    let bind_addr = parse_addr("SHELFSCAN_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("SHELFSCAN_LOG_LEVEL", "info");
    let static_dir = PathBuf::from(or_default("SHELFSCAN_STATIC_DIR", "./public"));

    let site_url = or_default("SHELFSCAN_SITE_URL", "https://www.amazon.com.br");
    let parsed_site =
        url::Url::parse(&site_url).map_err(|e| invalid("SHELFSCAN_SITE_URL", e.to_string()))?;
    if parsed_site.host_str().is_none() {
        return Err(invalid(
            "SHELFSCAN_SITE_URL",
            "URL must include a host".to_string(),
        ));
    }

    let scraper_request_timeout_secs = parse_u64("SHELFSCAN_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default("SHELFSCAN_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let scraper_max_redirects = parse_usize("SHELFSCAN_SCRAPER_MAX_REDIRECTS", "5")?;

    let scraper_max_attempts = parse_u32("SHELFSCAN_SCRAPER_MAX_ATTEMPTS", "3")?;
    if scraper_max_attempts == 0 {
        return Err(invalid(
            "SHELFSCAN_SCRAPER_MAX_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }

    let scraper_retry_jitter_min_ms = parse_u64("SHELFSCAN_SCRAPER_RETRY_JITTER_MIN_MS", "1000")?;
    let scraper_retry_jitter_max_ms = parse_u64("SHELFSCAN_SCRAPER_RETRY_JITTER_MAX_MS", "3000")?;
    if scraper_retry_jitter_max_ms < scraper_retry_jitter_min_ms {
        return Err(invalid(
            "SHELFSCAN_SCRAPER_RETRY_JITTER_MAX_MS",
            format!("must be >= SHELFSCAN_SCRAPER_RETRY_JITTER_MIN_MS ({scraper_retry_jitter_min_ms})"),
        ));
    }

    let rate_limit_max_requests = parse_usize("SHELFSCAN_RATE_LIMIT_MAX_REQUESTS", "100")?;
    let rate_limit_window_secs = parse_u64("SHELFSCAN_RATE_LIMIT_WINDOW_SECS", "900")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        static_dir,
        site_url,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_redirects,
        scraper_max_attempts,
        scraper_retry_jitter_min_ms,
        scraper_retry_jitter_max_ms,
        rate_limit_max_requests,
        rate_limit_window_secs,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SHELFSCAN_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
