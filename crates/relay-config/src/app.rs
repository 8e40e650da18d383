use std::path::PathBuf;

use relay_logging::LoggingOptions;
use relay_snmp::{AuthProtocol, PrivProtocol, SnmpVersion};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const REDACTED: &str = "<secret>";

/// 应用配置
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingOptions,

    #[serde(default)]
    pub alert: AlertConfig,

    #[serde(default)]
    pub trap: TrapConfig,

    #[serde(default)]
    pub snmp: SnmpConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
}

/// 严重级别相关配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AlertConfig {
    #[serde(default = "default_severity_label")]
    pub severity_label: String,

    /// 按优先级从高到低
    #[serde(default = "default_severities")]
    pub severities: Vec<String>,

    #[serde(default = "default_severity")]
    pub default_severity: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TrapConfig {
    #[serde(default = "default_trap_oid")]
    pub default_oid: String,

    #[serde(default = "default_oid_label")]
    pub oid_label: String,

    #[serde(default)]
    pub resolution_default_oid: Option<String>,

    #[serde(default)]
    pub resolution_oid_label: Option<String>,

    /// trap 类型为 `oid.1`，对象位于 `oid.2` 下
    #[serde(default)]
    pub legacy_objects: bool,

    #[serde(default = "default_objects_base_oid")]
    pub default_objects_base_oid: String,

    #[serde(default = "default_user_objects_base_oid")]
    pub user_objects_base_oid: String,

    /// 描述模板文件，缺省使用内置模板
    #[serde(default)]
    pub description_template: Option<PathBuf>,

    #[serde(default)]
    pub user_objects: Vec<UserObjectConfig>,
}

/// `[[trap.user_objects]]`，`template` 与 `template_file` 二选一
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserObjectConfig {
    pub sub_oid: u32,

    #[serde(default)]
    pub template: Option<String>,

    #[serde(default)]
    pub template_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SnmpConfig {
    #[serde(default = "default_snmp_version")]
    pub version: SnmpVersion,

    #[serde(default = "default_destinations")]
    pub destinations: Vec<String>,

    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// 仅 V2c；建议通过 `SNMP_RELAY_SNMP__COMMUNITY` 传入
    #[serde(default = "default_community")]
    pub community: String,

    #[serde(default)]
    pub authentication_enabled: bool,

    #[serde(default = "default_auth_protocol")]
    pub authentication_protocol: AuthProtocol,

    #[serde(default)]
    pub authentication_username: String,

    #[serde(default)]
    pub authentication_password: String,

    #[serde(default)]
    pub private_enabled: bool,

    #[serde(default = "default_priv_protocol")]
    pub private_protocol: PrivProtocol,

    #[serde(default)]
    pub private_password: String,

    /// 十六进制
    #[serde(default)]
    pub security_engine_id: Option<String>,

    /// 十六进制，缺省同 security_engine_id
    #[serde(default)]
    pub context_engine_id: Option<String>,

    #[serde(default)]
    pub context_name: String,

    /// Unix 秒，缺省为主机启动时刻
    #[serde(default)]
    pub engine_start_time: Option<i64>,
}

// 默认值函数
fn default_listen_address() -> String {
    "0.0.0.0:9464".to_string()
}

fn default_severity_label() -> String {
    "severity".to_string()
}

fn default_severities() -> Vec<String> {
    vec![
        "critical".to_string(),
        "warning".to_string(),
        "info".to_string(),
    ]
}

fn default_severity() -> String {
    "critical".to_string()
}

fn default_trap_oid() -> String {
    "1.3.6.1.4.1.98789.1".to_string()
}

fn default_oid_label() -> String {
    "oid".to_string()
}

fn default_objects_base_oid() -> String {
    "1.3.6.1.4.1.98789.2".to_string()
}

fn default_user_objects_base_oid() -> String {
    "1.3.6.1.4.1.98789.3".to_string()
}

fn default_snmp_version() -> SnmpVersion {
    SnmpVersion::V2c
}

fn default_destinations() -> Vec<String> {
    vec!["127.0.0.1:162".to_string()]
}

fn default_retries() -> u32 {
    1
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_community() -> String {
    "public".to_string()
}

fn default_auth_protocol() -> AuthProtocol {
    AuthProtocol::Md5
}

fn default_priv_protocol() -> PrivProtocol {
    PrivProtocol::Des
}

// Default trait 实现
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            severity_label: default_severity_label(),
            severities: default_severities(),
            default_severity: default_severity(),
        }
    }
}

impl Default for TrapConfig {
    fn default() -> Self {
        Self {
            default_oid: default_trap_oid(),
            oid_label: default_oid_label(),
            resolution_default_oid: None,
            resolution_oid_label: None,
            legacy_objects: false,
            default_objects_base_oid: default_objects_base_oid(),
            user_objects_base_oid: default_user_objects_base_oid(),
            description_template: None,
            user_objects: Vec::new(),
        }
    }
}

impl Default for SnmpConfig {
    fn default() -> Self {
        Self {
            version: default_snmp_version(),
            destinations: default_destinations(),
            retries: default_retries(),
            timeout_ms: default_timeout_ms(),
            community: default_community(),
            authentication_enabled: false,
            authentication_protocol: default_auth_protocol(),
            authentication_username: String::new(),
            authentication_password: String::new(),
            private_enabled: false,
            private_protocol: default_priv_protocol(),
            private_password: String::new(),
            security_engine_id: None,
            context_engine_id: None,
            context_name: String::new(),
            engine_start_time: None,
        }
    }
}

impl AppConfig {
    /// 隐去口令后的 TOML 文本
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let mut redacted = self.clone();
        for secret in [
            &mut redacted.snmp.community,
            &mut redacted.snmp.authentication_password,
            &mut redacted.snmp.private_password,
        ] {
            if !secret.is_empty() {
                *secret = REDACTED.to_string();
            }
        }
        Ok(toml::to_string_pretty(&redacted)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.listen_address, "0.0.0.0:9464");
        assert_eq!(config.alert.severities, vec!["critical", "warning", "info"]);
        assert_eq!(config.trap.default_oid, "1.3.6.1.4.1.98789.1");
        assert_eq!(config.snmp.version, SnmpVersion::V2c);
        assert_eq!(config.snmp.destinations, vec!["127.0.0.1:162"]);
        assert_eq!(config.snmp.timeout_ms, 5000);
    }

    #[test]
    fn test_redacted_toml_hides_secrets() {
        let mut config = AppConfig::default();
        config.snmp.authentication_password = "hunter22".to_string();

        let text = config.to_redacted_toml().unwrap();
        assert!(!text.contains("hunter22"));
        assert!(!text.contains("public"));
        assert!(text.contains(REDACTED));
        assert!(text.contains("[snmp]"));
    }
}
