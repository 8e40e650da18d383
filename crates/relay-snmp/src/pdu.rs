use bytes::{Bytes, BytesMut};

use crate::ber;
use crate::oid::Oid;

/// 变量绑定的值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarValue {
    Integer(i64),
    OctetString(Bytes),
    ObjectIdentifier(Oid),
    TimeTicks(u32),
    Null,
}

impl VarValue {
    /// 文本值，仅在是 OCTET STRING 且为 UTF-8 时返回
    pub fn as_text(&self) -> Option<&str> {
        match self {
            VarValue::OctetString(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    fn encode(&self, buf: &mut BytesMut) {
        match self {
            VarValue::Integer(value) => ber::encode_integer(buf, *value),
            VarValue::OctetString(value) => ber::encode_octet_string(buf, value),
            VarValue::ObjectIdentifier(oid) => ber::encode_oid(buf, oid),
            VarValue::TimeTicks(ticks) => ber::encode_unsigned(buf, ber::TIME_TICKS, *ticks),
            VarValue::Null => ber::encode_null(buf),
        }
    }
}

/// 变量绑定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    pub oid: Oid,
    pub value: VarValue,
}

impl VarBind {
    pub fn new(oid: Oid, value: VarValue) -> Self {
        Self { oid, value }
    }

    pub fn octet_string(oid: Oid, text: &str) -> Self {
        Self::new(oid, VarValue::OctetString(Bytes::copy_from_slice(text.as_bytes())))
    }

    fn encode(&self, buf: &mut BytesMut) {
        ber::encode_constructed(buf, ber::SEQUENCE, |inner| {
            ber::encode_oid(inner, &self.oid);
            self.value.encode(inner);
        });
    }
}

/// 一条 SNMPv2-Trap 的有序变量绑定列表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrapPdu {
    pub var_binds: Vec<VarBind>,
}

impl TrapPdu {
    pub fn new(var_binds: Vec<VarBind>) -> Self {
        Self { var_binds }
    }

    pub fn push(&mut self, var_bind: VarBind) {
        self.var_binds.push(var_bind);
    }

    pub fn len(&self) -> usize {
        self.var_binds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.var_binds.is_empty()
    }

    /// 按 OID 查找变量值
    pub fn value_of(&self, oid: &Oid) -> Option<&VarValue> {
        self.var_binds
            .iter()
            .find(|var_bind| &var_bind.oid == oid)
            .map(|var_bind| &var_bind.value)
    }

    /// 编码为 SNMPv2-Trap-PDU（error-status 与 error-index 恒为 0）
    pub fn encode(&self, request_id: i32, buf: &mut BytesMut) {
        ber::encode_constructed(buf, ber::SNMPV2_TRAP, |pdu| {
            ber::encode_integer(pdu, request_id as i64);
            ber::encode_integer(pdu, 0);
            ber::encode_integer(pdu, 0);
            ber::encode_constructed(pdu, ber::SEQUENCE, |list| {
                for var_bind in &self.var_binds {
                    var_bind.encode(list);
                }
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::read_tlv;

    #[test]
    fn test_encode_trap_pdu() {
        let pdu = TrapPdu::new(vec![
            VarBind::new(Oid::sys_up_time(), VarValue::TimeTicks(4200)),
            VarBind::new(
                Oid::snmp_trap_oid(),
                VarValue::ObjectIdentifier("1.3.6.1.4.1.98789.1".parse().unwrap()),
            ),
            VarBind::octet_string("1.3.6.1.4.1.98789.2.2".parse().unwrap(), "critical"),
        ]);

        let mut buf = BytesMut::new();
        pdu.encode(7, &mut buf);

        let (tag, content, rest) = read_tlv(&buf);
        assert_eq!(tag, ber::SNMPV2_TRAP);
        assert!(rest.is_empty());

        let (_, request_id, content) = read_tlv(content);
        assert_eq!(request_id, &[7u8]);
        let (_, error_status, content) = read_tlv(content);
        assert_eq!(error_status, &[0u8]);
        let (_, _, content) = read_tlv(content);

        let (tag, var_binds, _) = read_tlv(content);
        assert_eq!(tag, ber::SEQUENCE);

        let mut remaining = var_binds;
        let mut count = 0;
        while !remaining.is_empty() {
            let (tag, _, rest) = read_tlv(remaining);
            assert_eq!(tag, ber::SEQUENCE);
            remaining = rest;
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn test_value_lookup() {
        let oid: Oid = "1.2.3".parse().unwrap();
        let pdu = TrapPdu::new(vec![VarBind::octet_string(oid.clone(), "hello")]);

        assert_eq!(pdu.value_of(&oid).and_then(VarValue::as_text), Some("hello"));
        assert!(pdu.value_of(&Oid::sys_up_time()).is_none());
    }
}
