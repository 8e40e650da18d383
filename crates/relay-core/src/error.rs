use relay_snmp::SnmpError;
use thiserror::Error;

/// 告警转发统一错误类型
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("invalid OID provided: \"{0}\"")]
    MalformedOid(String),

    #[error("incorrect severity: {0}")]
    UnrankedSeverity(String),

    #[error("Template error: {0}")]
    TemplateRender(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("error while sending one or more traps to: {}", .failed.join(", "))]
    Transport { failed: Vec<String> },

    #[error("SNMP error: {0}")]
    Snmp(SnmpError),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// 请求本身有误（400），其余为网关侧错误
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RelayError::MalformedOid(_)
                | RelayError::UnrankedSeverity(_)
                | RelayError::TemplateRender(_)
        )
    }
}

impl From<SnmpError> for RelayError {
    fn from(err: SnmpError) -> Self {
        match err {
            SnmpError::MalformedOid(oid) => RelayError::MalformedOid(oid),
            other => RelayError::Snmp(other),
        }
    }
}

impl From<minijinja::Error> for RelayError {
    fn from(err: minijinja::Error) -> Self {
        RelayError::TemplateRender(err.to_string())
    }
}
