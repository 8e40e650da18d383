use thiserror::Error;

/// SNMP 编码与传输错误
#[derive(Error, Debug)]
pub enum SnmpError {
    #[error("invalid OID provided: \"{0}\"")]
    MalformedOid(String),

    #[error("invalid SNMP security configuration: {0}")]
    Security(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("unable to resolve SNMP destination {0}")]
    Resolve(String),

    #[error("SNMP session to {0} timed out")]
    Timeout(String),

    #[error("SNMP session is closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SnmpError>;
