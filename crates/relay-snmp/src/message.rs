//! SNMP 消息封装：v2c 团体名消息与 v3 USM 消息

use bytes::{Bytes, BytesMut};

use crate::ber;
use crate::error::Result;
use crate::pdu::TrapPdu;
use crate::transport::EngineTime;
use crate::usm::{UsmUser, AUTH_PARAMS_LEN};

const VERSION_V2C: i64 = 1;
const VERSION_V3: i64 = 3;

/// msgMaxSize，与常见实现一致
const MAX_MESSAGE_SIZE: i64 = 65507;

/// USM 安全模型编号
const SECURITY_MODEL_USM: i64 = 3;

/// v2c：`SEQUENCE { version, community, PDU }`
pub fn encode_v2c(community: &str, request_id: i32, pdu: &TrapPdu) -> Bytes {
    let mut buf = BytesMut::new();
    ber::encode_constructed(&mut buf, ber::SEQUENCE, |msg| {
        ber::encode_integer(msg, VERSION_V2C);
        ber::encode_octet_string(msg, community.as_bytes());
        pdu.encode(request_id, msg);
    });
    buf.freeze()
}

/// 一条 v3 trap 消息的上下文参数
#[derive(Debug, Clone)]
pub struct V3Envelope<'a> {
    pub user: &'a UsmUser,
    pub context_engine_id: &'a [u8],
    pub context_name: &'a str,
    pub engine_time: EngineTime,
    pub message_id: i32,
    pub salt: u64,
}

/// v3：按用户安全级别加密 scopedPDU，并在整条消息上计算认证码
pub fn encode_v3(envelope: &V3Envelope<'_>, request_id: i32, pdu: &TrapPdu) -> Result<Bytes> {
    let user = envelope.user;
    let engine_time = envelope.engine_time;

    let mut scoped = BytesMut::new();
    ber::encode_constructed(&mut scoped, ber::SEQUENCE, |inner| {
        ber::encode_octet_string(inner, envelope.context_engine_id);
        ber::encode_octet_string(inner, envelope.context_name.as_bytes());
        pdu.encode(request_id, inner);
    });

    let (data, priv_params) = match &user.privacy {
        Some(privacy) => {
            let (cipher, params) =
                privacy.encrypt(&scoped, engine_time.boots, engine_time.time, envelope.salt)?;
            let mut data = BytesMut::new();
            ber::encode_octet_string(&mut data, &cipher);
            (data, params)
        }
        None => (scoped, Vec::new()),
    };

    let mut header = BytesMut::new();
    ber::encode_constructed(&mut header, ber::SEQUENCE, |inner| {
        ber::encode_integer(inner, envelope.message_id as i64);
        ber::encode_integer(inner, MAX_MESSAGE_SIZE);
        ber::encode_octet_string(inner, &[user.flags()]);
        ber::encode_integer(inner, SECURITY_MODEL_USM);
    });

    // 认证码先以 0 占位，签名后回填
    let auth_placeholder: &[u8] = if user.auth.is_some() {
        &[0u8; AUTH_PARAMS_LEN]
    } else {
        &[]
    };

    let mut usm_prefix = BytesMut::new();
    ber::encode_octet_string(&mut usm_prefix, &user.engine_id);
    ber::encode_integer(&mut usm_prefix, engine_time.boots as i64);
    ber::encode_integer(&mut usm_prefix, engine_time.time as i64);
    ber::encode_octet_string(&mut usm_prefix, user.name.as_bytes());

    let mut usm_content = usm_prefix.clone();
    ber::encode_octet_string(&mut usm_content, auth_placeholder);
    ber::encode_octet_string(&mut usm_content, &priv_params);

    let mut usm = BytesMut::new();
    ber::encode_tlv(&mut usm, ber::SEQUENCE, &usm_content);

    let mut version = BytesMut::new();
    ber::encode_integer(&mut version, VERSION_V3);

    let mut content = BytesMut::new();
    content.extend_from_slice(&version);
    content.extend_from_slice(&header);
    ber::encode_octet_string(&mut content, &usm);
    content.extend_from_slice(&data);

    let mut message = BytesMut::new();
    ber::encode_tlv(&mut message, ber::SEQUENCE, &content);

    if let Some(auth) = &user.auth {
        let offset = ber::header_len(content.len())
            + version.len()
            + header.len()
            + ber::header_len(usm.len())
            + ber::header_len(usm_content.len())
            + usm_prefix.len()
            + ber::header_len(AUTH_PARAMS_LEN);
        let signature = auth.sign(&message)?;
        message[offset..offset + AUTH_PARAMS_LEN].copy_from_slice(&signature);
    }

    Ok(message.freeze())
}
