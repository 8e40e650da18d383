use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SnmpError};
use crate::usm::{AuthProtocol, PrivProtocol, UsmAuth, UsmPriv, UsmUser};

/// 默认引擎 ID：RFC 3411 格式，企业号 98789，文本格式
pub fn default_engine_id() -> Vec<u8> {
    let mut engine_id = vec![0x80, 0x01, 0x81, 0xE5, 0x04];
    engine_id.extend_from_slice(b"snmp-relay");
    engine_id
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnmpVersion {
    V2c,
    V3,
}

impl fmt::Display for SnmpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnmpVersion::V2c => f.write_str("V2c"),
            SnmpVersion::V3 => f.write_str("V3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityLevel {
    NoAuthNoPriv,
    AuthNoPriv,
    AuthPriv,
}

/// v3 安全参数（未本地化）
#[derive(Debug, Clone, Default)]
pub struct V3Settings {
    pub username: String,
    pub auth: Option<(AuthProtocol, String)>,
    pub privacy: Option<(PrivProtocol, String)>,
    pub security_engine_id: Option<Vec<u8>>,
    pub context_engine_id: Option<Vec<u8>>,
    pub context_name: String,
}

/// v3 安全参数，密钥在构造时一次性本地化
#[derive(Debug, Clone)]
pub struct V3Security {
    pub user: UsmUser,
    pub context_engine_id: Vec<u8>,
    pub context_name: String,
}

impl V3Security {
    pub fn new(settings: V3Settings) -> Result<Self> {
        if settings.username.is_empty() {
            return Err(SnmpError::Security("SNMPv3 username is required".to_string()));
        }

        let engine_id = settings.security_engine_id.unwrap_or_else(default_engine_id);
        if engine_id.is_empty() {
            return Err(SnmpError::Security("empty security engine ID".to_string()));
        }

        let auth = settings
            .auth
            .as_ref()
            .map(|(protocol, password)| UsmAuth::new(*protocol, password, &engine_id))
            .transpose()?;

        let privacy = match (&settings.privacy, &settings.auth) {
            (None, _) => None,
            (Some(_), None) => {
                return Err(SnmpError::Security(
                    "privacy requires authentication to be enabled".to_string(),
                ))
            }
            (Some((protocol, password)), Some((auth_protocol, _))) => {
                Some(UsmPriv::new(*protocol, *auth_protocol, password, &engine_id)?)
            }
        };

        let context_engine_id = settings
            .context_engine_id
            .unwrap_or_else(|| engine_id.clone());

        Ok(Self {
            user: UsmUser {
                name: settings.username,
                engine_id,
                auth,
                privacy,
            },
            context_engine_id,
            context_name: settings.context_name,
        })
    }

    pub fn level(&self) -> SecurityLevel {
        match (&self.user.auth, &self.user.privacy) {
            (None, _) => SecurityLevel::NoAuthNoPriv,
            (Some(_), None) => SecurityLevel::AuthNoPriv,
            (Some(_), Some(_)) => SecurityLevel::AuthPriv,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Security {
    Community(String),
    Usm(V3Security),
}

/// 一个 trap 接收端
#[derive(Debug, Clone)]
pub struct DestinationProfile {
    pub address: String,
    pub retries: u32,
    pub timeout: Duration,
    pub security: Security,
}

impl DestinationProfile {
    pub const DEFAULT_RETRIES: u32 = 1;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn v2c(address: impl Into<String>, community: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            retries: Self::DEFAULT_RETRIES,
            timeout: Self::DEFAULT_TIMEOUT,
            security: Security::Community(community.into()),
        }
    }

    pub fn v3(address: impl Into<String>, security: V3Security) -> Self {
        Self {
            address: address.into(),
            retries: Self::DEFAULT_RETRIES,
            timeout: Self::DEFAULT_TIMEOUT,
            security: Security::Usm(security),
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn version(&self) -> SnmpVersion {
        match self.security {
            Security::Community(_) => SnmpVersion::V2c,
            Security::Usm(_) => SnmpVersion::V3,
        }
    }
}
