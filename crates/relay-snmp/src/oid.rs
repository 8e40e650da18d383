use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SnmpError;

/// `sysUpTime.0`
pub const SYS_UP_TIME: &str = "1.3.6.1.2.1.1.3.0";

/// `snmpTrapOID.0`
pub const SNMP_TRAP_OID: &str = "1.3.6.1.6.3.1.1.4.1.0";

/// 判断字符串是否为点分数字 OID：`^[0-9]+(\.[0-9]+)*$`
pub fn is_valid_oid(text: &str) -> bool {
    !text.is_empty()
        && text
            .split('.')
            .all(|arc| !arc.is_empty() && arc.bytes().all(|b| b.is_ascii_digit()))
}

/// 对象标识符
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid(Vec<u32>);

impl Oid {
    pub fn from_arcs(arcs: Vec<u32>) -> Self {
        Self(arcs)
    }

    pub fn arcs(&self) -> &[u32] {
        &self.0
    }

    /// 追加一个子节点
    pub fn child(&self, arc: u32) -> Self {
        let mut arcs = self.0.clone();
        arcs.push(arc);
        Self(arcs)
    }

    pub fn sys_up_time() -> Self {
        well_known(&[1, 3, 6, 1, 2, 1, 1, 3, 0])
    }

    pub fn snmp_trap_oid() -> Self {
        well_known(&[1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0])
    }
}

fn well_known(arcs: &[u32]) -> Oid {
    Oid(arcs.to_vec())
}

impl FromStr for Oid {
    type Err = SnmpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_valid_oid(s) {
            return Err(SnmpError::MalformedOid(s.to_string()));
        }

        let arcs = s
            .split('.')
            .map(|arc| arc.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| SnmpError::MalformedOid(s.to_string()))?;

        // BER 把前两个节点合并为 40 * a + b
        match arcs.as_slice() {
            [first, ..] if *first > 2 => Err(SnmpError::MalformedOid(s.to_string())),
            [first, second, ..] if *first < 2 && *second >= 40 => {
                Err(SnmpError::MalformedOid(s.to_string()))
            }
            _ => Ok(Oid(arcs)),
        }
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .0
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(".");
        f.write_str(&text)
    }
}

impl Serialize for Oid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Oid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
