pub mod app;
pub mod components;
pub mod error;
pub mod loader;

pub use app::{AlertConfig, AppConfig, ServerConfig, SnmpConfig, TrapConfig, UserObjectConfig};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_CONFIG_PATH, ENV_PREFIX};
