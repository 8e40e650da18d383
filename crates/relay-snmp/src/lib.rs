pub mod ber;
pub mod error;
pub mod message;
pub mod oid;
pub mod pdu;
pub mod profile;
pub mod transport;
pub mod usm;

pub use error::{Result, SnmpError};
pub use oid::{is_valid_oid, Oid};
pub use pdu::{TrapPdu, VarBind, VarValue};
pub use profile::{DestinationProfile, Security, SecurityLevel, SnmpVersion, V3Security, V3Settings};
pub use transport::{EngineTime, TrapSession, TrapTransport, UdpTransport};
pub use usm::{AuthProtocol, PrivProtocol, UsmAuth, UsmPriv, UsmUser};
