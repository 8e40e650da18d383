use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::app::AppConfig;
use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "snmp-relay.toml";

/// 环境变量前缀，如 `SNMP_RELAY_SNMP__COMMUNITY`
pub const ENV_PREFIX: &str = "SNMP_RELAY";

/// 配置加载器：TOML 文件 + 环境变量覆盖
pub struct ConfigLoader {
    path: PathBuf,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 加载配置，文件不存在时使用默认值
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut builder = Config::builder();

        if self.path.exists() {
            info!(path = %self.path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(self.path.as_path()).format(FileFormat::Toml));
        } else {
            warn!(path = %self.path.display(), "Configuration file not found, using defaults");
        }

        let config = builder
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("snmp.destinations")
                    .with_list_parse_key("alert.severities")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// 加载并校验
    pub fn load_validated(&self) -> Result<AppConfig, ConfigError> {
        let config = self.load()?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_snmp::{AuthProtocol, SnmpVersion};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let loader = ConfigLoader::new(temp_dir.path().join("missing.toml"))
            .with_env_prefix("RELAY_TEST_MISSING");

        let config = loader.load().unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_content = r#"
[server]
listen_address = "127.0.0.1:9999"

[logging]
level = "debug"
format = "json"

[alert]
severity_label = "priority"
severities = ["p1", "p2"]
default_severity = "p2"

[trap]
default_oid = "1.3.6.1.4.1.1.1"
resolution_default_oid = "1.3.6.1.4.1.1.2"

[[trap.user_objects]]
sub_oid = 1
template = "{{ severity }}"

[snmp]
version = "V3"
destinations = ["10.0.0.1:162", "10.0.0.2:162"]
retries = 2
authentication_enabled = true
authentication_protocol = "SHA"
authentication_username = "relay"
authentication_password = "authpassword"
engine_start_time = 1700000000
"#;
        let path = temp_dir.path().join("snmp-relay.toml");
        fs::write(&path, config_content).unwrap();

        let config = ConfigLoader::new(&path)
            .with_env_prefix("RELAY_TEST_FILE")
            .load_validated()
            .unwrap();

        assert_eq!(config.server.listen_address, "127.0.0.1:9999");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.alert.severities, vec!["p1", "p2"]);
        assert_eq!(
            config.trap.resolution_default_oid.as_deref(),
            Some("1.3.6.1.4.1.1.2")
        );
        assert_eq!(config.trap.user_objects.len(), 1);
        assert_eq!(config.snmp.version, SnmpVersion::V3);
        assert_eq!(config.snmp.authentication_protocol, AuthProtocol::Sha);
        assert_eq!(config.snmp.destinations.len(), 2);
        assert_eq!(config.snmp.engine_start_time, Some(1_700_000_000));
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("snmp-relay.toml");
        fs::write(&path, "[snmp]\ncommunity = \"from-file\"\nretries = 1\n").unwrap();

        std::env::set_var("RELAY_TEST_ENV_SNMP__COMMUNITY", "from-env");
        std::env::set_var("RELAY_TEST_ENV_SNMP__RETRIES", "4");
        std::env::set_var(
            "RELAY_TEST_ENV_SNMP__DESTINATIONS",
            "10.0.0.1:162,10.0.0.2:162",
        );

        let config = ConfigLoader::new(&path)
            .with_env_prefix("RELAY_TEST_ENV")
            .load()
            .unwrap();

        assert_eq!(config.snmp.community, "from-env");
        assert_eq!(config.snmp.retries, 4);
        assert_eq!(
            config.snmp.destinations,
            vec!["10.0.0.1:162", "10.0.0.2:162"]
        );
    }

    #[test]
    fn test_invalid_file_rejected() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("snmp-relay.toml");
        fs::write(&path, "[snmp\nversion = ").unwrap();

        let result = ConfigLoader::new(&path)
            .with_env_prefix("RELAY_TEST_BROKEN")
            .load();
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_load_validated_rejects_bad_values() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("snmp-relay.toml");
        fs::write(&path, "[snmp]\ndestinations = []\n").unwrap();

        let loader = ConfigLoader::new(&path).with_env_prefix("RELAY_TEST_INVALID");
        assert!(loader.load().is_ok());
        assert!(matches!(
            loader.load_validated(),
            Err(ConfigError::Invalid(_))
        ));
    }
}
