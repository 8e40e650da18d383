//! BER 编码（仅覆盖发送 trap 所需的 ASN.1 子集）

use bytes::{BufMut, BytesMut};

use crate::oid::Oid;

pub const INTEGER: u8 = 0x02;
pub const OCTET_STRING: u8 = 0x04;
pub const NULL: u8 = 0x05;
pub const OBJECT_IDENTIFIER: u8 = 0x06;
pub const SEQUENCE: u8 = 0x30;
pub const TIME_TICKS: u8 = 0x43;
pub const SNMPV2_TRAP: u8 = 0xA7;

/// 长度字段本身占用的字节数
pub fn length_len(len: usize) -> usize {
    if len < 0x80 {
        1
    } else {
        1 + (usize::BITS as usize / 8 - len.leading_zeros() as usize / 8)
    }
}

/// TLV 头部（tag + length）字节数
pub fn header_len(content_len: usize) -> usize {
    1 + length_len(content_len)
}

pub fn encode_length(buf: &mut BytesMut, len: usize) {
    if len < 0x80 {
        buf.put_u8(len as u8);
        return;
    }

    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    buf.put_u8(0x80 | (bytes.len() - skip) as u8);
    buf.put_slice(&bytes[skip..]);
}

pub fn encode_tlv(buf: &mut BytesMut, tag: u8, content: &[u8]) {
    buf.put_u8(tag);
    encode_length(buf, content.len());
    buf.put_slice(content);
}

/// 先写入内容再封装为构造类型
pub fn encode_constructed<F>(buf: &mut BytesMut, tag: u8, fill: F)
where
    F: FnOnce(&mut BytesMut),
{
    let mut content = BytesMut::new();
    fill(&mut content);
    encode_tlv(buf, tag, &content);
}

pub fn encode_integer(buf: &mut BytesMut, value: i64) {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    // 去掉冗余的符号扩展字节
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    encode_tlv(buf, INTEGER, &bytes[start..]);
}

/// 无符号 32 位应用类型（TimeTicks 等）
pub fn encode_unsigned(buf: &mut BytesMut, tag: u8, value: u32) {
    let bytes = (value as u64).to_be_bytes();
    let mut start = 3;
    while start < bytes.len() - 1 && bytes[start] == 0 && bytes[start + 1] & 0x80 == 0 {
        start += 1;
    }
    encode_tlv(buf, tag, &bytes[start..]);
}

pub fn encode_octet_string(buf: &mut BytesMut, value: &[u8]) {
    encode_tlv(buf, OCTET_STRING, value);
}

pub fn encode_null(buf: &mut BytesMut) {
    encode_tlv(buf, NULL, &[]);
}

pub fn encode_oid(buf: &mut BytesMut, oid: &Oid) {
    let arcs = oid.arcs();
    let mut content = BytesMut::new();

    let first = match arcs {
        [] => 0u64,
        [a] => 40 * *a as u64,
        [a, b, ..] => 40 * *a as u64 + *b as u64,
    };
    put_subidentifier(&mut content, first);

    for arc in arcs.iter().skip(2) {
        put_subidentifier(&mut content, *arc as u64);
    }

    encode_tlv(buf, OBJECT_IDENTIFIER, &content);
}

fn put_subidentifier(buf: &mut BytesMut, value: u64) {
    let mut groups = [0u8; 10];
    let mut count = 0;
    let mut rest = value;
    loop {
        groups[count] = (rest & 0x7F) as u8;
        count += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }

    for i in (0..count).rev() {
        let continuation = if i == 0 { 0x00 } else { 0x80 };
        buf.put_u8(groups[i] | continuation);
    }
}

/// 测试用的最小 TLV 读取器
#[cfg(test)]
pub(crate) fn read_tlv(data: &[u8]) -> (u8, &[u8], &[u8]) {
    let tag = data[0];
    let (len, offset) = if data[1] & 0x80 == 0 {
        (data[1] as usize, 2)
    } else {
        let n = (data[1] & 0x7F) as usize;
        let len = data[2..2 + n]
            .iter()
            .fold(0usize, |acc, b| (acc << 8) | *b as usize);
        (len, 2 + n)
    };
    (tag, &data[offset..offset + len], &data[offset + len..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded<F: FnOnce(&mut BytesMut)>(f: F) -> Vec<u8> {
        let mut buf = BytesMut::new();
        f(&mut buf);
        buf.to_vec()
    }

    #[test]
    fn test_length_forms() {
        assert_eq!(encoded(|b| encode_length(b, 5)), vec![0x05]);
        assert_eq!(encoded(|b| encode_length(b, 200)), vec![0x81, 0xC8]);
        assert_eq!(encoded(|b| encode_length(b, 300)), vec![0x82, 0x01, 0x2C]);
        assert_eq!(length_len(5), 1);
        assert_eq!(length_len(200), 2);
        assert_eq!(length_len(300), 3);
    }

    #[test]
    fn test_integer_minimal_encoding() {
        assert_eq!(encoded(|b| encode_integer(b, 0)), vec![0x02, 0x01, 0x00]);
        assert_eq!(encoded(|b| encode_integer(b, 127)), vec![0x02, 0x01, 0x7F]);
        assert_eq!(encoded(|b| encode_integer(b, 128)), vec![0x02, 0x02, 0x00, 0x80]);
        assert_eq!(encoded(|b| encode_integer(b, -1)), vec![0x02, 0x01, 0xFF]);
        assert_eq!(encoded(|b| encode_integer(b, 65507)), vec![0x02, 0x03, 0x00, 0xFF, 0xE3]);
    }

    #[test]
    fn test_time_ticks() {
        assert_eq!(encoded(|b| encode_unsigned(b, TIME_TICKS, 0)), vec![0x43, 0x01, 0x00]);
        assert_eq!(
            encoded(|b| encode_unsigned(b, TIME_TICKS, 0xFFFF_FFFF)),
            vec![0x43, 0x05, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_oid_encoding() {
        let oid: Oid = "1.3.6.1.4.1.98789".parse().unwrap();
        assert_eq!(
            encoded(|b| encode_oid(b, &oid)),
            vec![0x06, 0x08, 0x2B, 0x06, 0x01, 0x04, 0x01, 0x86, 0x83, 0x65]
        );

        let single: Oid = "1".parse().unwrap();
        assert_eq!(encoded(|b| encode_oid(b, &single)), vec![0x06, 0x01, 0x28]);
    }

    #[test]
    fn test_distinct_oids_encode_distinctly() {
        let encode = |text: &str| {
            let oid: Oid = text.parse().unwrap();
            encoded(|b| encode_oid(b, &oid))
        };

        assert_eq!(encode("2.10"), vec![0x06, 0x01, 0x5A]);
        assert_eq!(encode("2.121"), vec![0x06, 0x02, 0x81, 0x49]);
        assert_ne!(encode("1.39"), encode("2.0"));
        assert!("1.50".parse::<Oid>().is_err());
        assert!("5.1".parse::<Oid>().is_err());
    }

    #[test]
    fn test_constructed_and_reader() {
        let bytes = encoded(|b| {
            encode_constructed(b, SEQUENCE, |inner| {
                encode_null(inner);
                encode_octet_string(inner, b"abc");
            })
        });

        let (tag, content, rest) = read_tlv(&bytes);
        assert_eq!(tag, SEQUENCE);
        assert!(rest.is_empty());

        let (tag, _, content) = read_tlv(content);
        assert_eq!(tag, NULL);
        let (tag, value, _) = read_tlv(content);
        assert_eq!(tag, OCTET_STRING);
        assert_eq!(value, b"abc");
    }
}
