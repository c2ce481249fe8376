mod app_config;
mod config;
pub mod error;
pub mod listing;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, ValidationError};
pub use listing::{validate_all, Listing};
