use std::path::PathBuf;

use relay_core::RelayError;
use relay_snmp::SnmpError;
use thiserror::Error;

/// 配置错误，启动阶段即终止
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read template {path}: {source}")]
    Template {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Snmp(#[from] SnmpError),
}
