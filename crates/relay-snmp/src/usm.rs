//! SNMPv3 用户安全模型（RFC 3414 / RFC 3826）：密钥本地化、认证与加密

use std::fmt;
use std::str::FromStr;

use cbc::cipher::{block_padding::NoPadding, AsyncStreamCipher, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::error::{Result, SnmpError};

type HmacMd5 = Hmac<Md5>;
type HmacSha1 = Hmac<Sha1>;
type DesCbcEnc = cbc::Encryptor<des::Des>;
type Aes128CfbEnc = cfb_mode::Encryptor<aes::Aes128>;

/// HMAC-96 截断后的认证码长度
pub const AUTH_PARAMS_LEN: usize = 12;

const PASSWORD_EXPANSION_LEN: usize = 1_048_576;

/// 认证协议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthProtocol {
    #[serde(rename = "MD5")]
    Md5,
    #[serde(rename = "SHA")]
    Sha,
}

impl FromStr for AuthProtocol {
    type Err = SnmpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "MD5" => Ok(AuthProtocol::Md5),
            "SHA" => Ok(AuthProtocol::Sha),
            other => Err(SnmpError::Security(format!(
                "unsupported authentication protocol: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for AuthProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthProtocol::Md5 => f.write_str("MD5"),
            AuthProtocol::Sha => f.write_str("SHA"),
        }
    }
}

/// 加密协议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrivProtocol {
    #[serde(rename = "DES")]
    Des,
    #[serde(rename = "AES")]
    Aes,
}

impl FromStr for PrivProtocol {
    type Err = SnmpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "DES" => Ok(PrivProtocol::Des),
            "AES" => Ok(PrivProtocol::Aes),
            other => Err(SnmpError::Security(format!(
                "unsupported privacy protocol: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for PrivProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivProtocol::Des => f.write_str("DES"),
            PrivProtocol::Aes => f.write_str("AES"),
        }
    }
}

fn expand_password<D: Digest>(password: &[u8]) -> Result<Vec<u8>> {
    if password.is_empty() {
        return Err(SnmpError::Security("empty SNMPv3 password".to_string()));
    }

    let mut hasher = D::new();
    let mut block = [0u8; 64];
    let mut index = 0;
    let mut count = 0;
    while count < PASSWORD_EXPANSION_LEN {
        for byte in block.iter_mut() {
            *byte = password[index % password.len()];
            index += 1;
        }
        hasher.update(block);
        count += block.len();
    }
    Ok(hasher.finalize().to_vec())
}

fn localize<D: Digest>(key: &[u8], engine_id: &[u8]) -> Vec<u8> {
    let mut hasher = D::new();
    hasher.update(key);
    hasher.update(engine_id);
    hasher.update(key);
    hasher.finalize().to_vec()
}

/// 由口令生成本地化密钥 Kul
pub fn localized_key(protocol: AuthProtocol, password: &[u8], engine_id: &[u8]) -> Result<Vec<u8>> {
    match protocol {
        AuthProtocol::Md5 => Ok(localize::<Md5>(&expand_password::<Md5>(password)?, engine_id)),
        AuthProtocol::Sha => Ok(localize::<Sha1>(&expand_password::<Sha1>(password)?, engine_id)),
    }
}

/// 认证参数（已本地化）
#[derive(Clone)]
pub struct UsmAuth {
    protocol: AuthProtocol,
    key: Vec<u8>,
}

impl UsmAuth {
    pub fn new(protocol: AuthProtocol, password: &str, engine_id: &[u8]) -> Result<Self> {
        Ok(Self {
            protocol,
            key: localized_key(protocol, password.as_bytes(), engine_id)?,
        })
    }

    pub fn protocol(&self) -> AuthProtocol {
        self.protocol
    }

    /// 计算整条消息的 HMAC-96
    pub fn sign(&self, message: &[u8]) -> Result<[u8; AUTH_PARAMS_LEN]> {
        let digest = match self.protocol {
            AuthProtocol::Md5 => {
                let mut mac = HmacMd5::new_from_slice(&self.key)
                    .map_err(|e| SnmpError::Crypto(e.to_string()))?;
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
            AuthProtocol::Sha => {
                let mut mac = HmacSha1::new_from_slice(&self.key)
                    .map_err(|e| SnmpError::Crypto(e.to_string()))?;
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
        };

        let mut params = [0u8; AUTH_PARAMS_LEN];
        params.copy_from_slice(&digest[..AUTH_PARAMS_LEN]);
        Ok(params)
    }
}

impl fmt::Debug for UsmAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsmAuth")
            .field("protocol", &self.protocol)
            .finish_non_exhaustive()
    }
}

/// 加密参数（密钥按认证协议本地化）
#[derive(Clone)]
pub struct UsmPriv {
    protocol: PrivProtocol,
    key: Vec<u8>,
}

impl UsmPriv {
    pub fn new(
        protocol: PrivProtocol,
        auth_protocol: AuthProtocol,
        password: &str,
        engine_id: &[u8],
    ) -> Result<Self> {
        Ok(Self {
            protocol,
            key: localized_key(auth_protocol, password.as_bytes(), engine_id)?,
        })
    }

    pub fn protocol(&self) -> PrivProtocol {
        self.protocol
    }

    /// 加密 scopedPDU，返回 (密文, msgPrivacyParameters)
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        engine_boots: u32,
        engine_time: u32,
        salt: u64,
    ) -> Result<(Vec<u8>, Vec<u8>)> {
        match self.protocol {
            PrivProtocol::Des => self.encrypt_des(plaintext, engine_boots, salt as u32),
            PrivProtocol::Aes => self.encrypt_aes(plaintext, engine_boots, engine_time, salt),
        }
    }

    fn encrypt_des(&self, plaintext: &[u8], engine_boots: u32, salt: u32) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut params = Vec::with_capacity(8);
        params.extend_from_slice(&engine_boots.to_be_bytes());
        params.extend_from_slice(&salt.to_be_bytes());

        let iv: Vec<u8> = self.key[8..16]
            .iter()
            .zip(params.iter())
            .map(|(pre_iv, salt)| pre_iv ^ salt)
            .collect();

        // 补齐到 8 字节块
        let padded_len = plaintext.len().div_ceil(8) * 8;
        let mut buf = plaintext.to_vec();
        buf.resize(padded_len, 0);

        DesCbcEnc::new_from_slices(&self.key[..8], &iv)
            .map_err(|e| SnmpError::Crypto(e.to_string()))?
            .encrypt_padded_mut::<NoPadding>(&mut buf, padded_len)
            .map_err(|_| SnmpError::Crypto("DES block padding failed".to_string()))?;

        Ok((buf, params))
    }

    fn encrypt_aes(
        &self,
        plaintext: &[u8],
        engine_boots: u32,
        engine_time: u32,
        salt: u64,
    ) -> Result<(Vec<u8>, Vec<u8>)> {
        let params = salt.to_be_bytes().to_vec();

        let mut iv = Vec::with_capacity(16);
        iv.extend_from_slice(&engine_boots.to_be_bytes());
        iv.extend_from_slice(&engine_time.to_be_bytes());
        iv.extend_from_slice(&params);

        let mut buf = plaintext.to_vec();
        Aes128CfbEnc::new_from_slices(&self.key[..16], &iv)
            .map_err(|e| SnmpError::Crypto(e.to_string()))?
            .encrypt(&mut buf);

        Ok((buf, params))
    }
}

impl fmt::Debug for UsmPriv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsmPriv")
            .field("protocol", &self.protocol)
            .finish_non_exhaustive()
    }
}

/// USM 用户：用户名、权威引擎 ID 与本地化密钥
#[derive(Debug, Clone)]
pub struct UsmUser {
    pub name: String,
    pub engine_id: Vec<u8>,
    pub auth: Option<UsmAuth>,
    pub privacy: Option<UsmPriv>,
}

impl UsmUser {
    /// msgFlags：认证 0x01，加密 0x02
    pub fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.auth.is_some() {
            flags |= 0x01;
        }
        if self.privacy.is_some() {
            flags |= 0x02;
        }
        flags
    }
}
