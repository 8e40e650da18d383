use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{Result, SnmpError};
use crate::message::{self, V3Envelope};
use crate::pdu::TrapPdu;
use crate::profile::{DestinationProfile, Security};

/// 发送方 snmpEngineBoots / snmpEngineTime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineTime {
    pub boots: u32,
    pub time: u32,
}

/// trap 传输层
#[async_trait]
pub trait TrapTransport: Send + Sync {
    /// 打开到目的端的会话，按 profile 的重试次数与超时进行
    async fn open(&self, profile: Arc<DestinationProfile>) -> Result<Box<dyn TrapSession>>;
}

/// 单个目的端的会话
#[async_trait]
pub trait TrapSession: Send {
    async fn send_trap(&mut self, pdu: &TrapPdu, engine_time: EngineTime) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

/// 基于 UDP 的 trap 传输
#[derive(Debug, Clone, Default)]
pub struct UdpTransport;

impl UdpTransport {
    pub fn new() -> Self {
        Self
    }

    async fn connect(address: &str) -> Result<UdpSocket> {
        let target: SocketAddr = lookup_host(address)
            .await
            .map_err(|e| SnmpError::Resolve(format!("{}: {}", address, e)))?
            .next()
            .ok_or_else(|| SnmpError::Resolve(address.to_string()))?;

        let local = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(target).await?;
        Ok(socket)
    }
}

#[async_trait]
impl TrapTransport for UdpTransport {
    async fn open(&self, profile: Arc<DestinationProfile>) -> Result<Box<dyn TrapSession>> {
        let attempts = profile.retries + 1;
        let mut last_error = SnmpError::Closed;

        for attempt in 1..=attempts {
            match timeout(profile.timeout, Self::connect(&profile.address)).await {
                Ok(Ok(socket)) => {
                    debug!(destination = %profile.address, attempt, "SNMP session opened");
                    return Ok(Box::new(UdpSession::new(socket, profile)));
                }
                Ok(Err(e)) => last_error = e,
                Err(_) => last_error = SnmpError::Timeout(profile.address.clone()),
            }
            warn!(
                destination = %profile.address,
                attempt,
                error = %last_error,
                "Failed to open SNMP session"
            );
        }

        Err(last_error)
    }
}

struct UdpSession {
    socket: Option<UdpSocket>,
    profile: Arc<DestinationProfile>,
    next_request_id: i32,
}

impl UdpSession {
    fn new(socket: UdpSocket, profile: Arc<DestinationProfile>) -> Self {
        Self {
            socket: Some(socket),
            profile,
            next_request_id: rand::thread_rng().gen_range(1..i32::MAX / 2),
        }
    }

    fn request_id(&mut self) -> i32 {
        let id = self.next_request_id;
        self.next_request_id = self.next_request_id.checked_add(1).unwrap_or(1);
        id
    }

    fn encode(&mut self, pdu: &TrapPdu, engine_time: EngineTime) -> Result<bytes::Bytes> {
        let request_id = self.request_id();
        match &self.profile.security {
            Security::Community(community) => Ok(message::encode_v2c(community, request_id, pdu)),
            Security::Usm(security) => {
                let envelope = V3Envelope {
                    user: &security.user,
                    context_engine_id: &security.context_engine_id,
                    context_name: &security.context_name,
                    engine_time,
                    message_id: request_id,
                    salt: rand::random(),
                };
                message::encode_v3(&envelope, request_id, pdu)
            }
        }
    }
}

#[async_trait]
impl TrapSession for UdpSession {
    async fn send_trap(&mut self, pdu: &TrapPdu, engine_time: EngineTime) -> Result<()> {
        let datagram = self.encode(pdu, engine_time)?;
        let socket = self.socket.as_ref().ok_or(SnmpError::Closed)?;

        timeout(self.profile.timeout, socket.send(&datagram))
            .await
            .map_err(|_| SnmpError::Timeout(self.profile.address.clone()))??;

        debug!(
            destination = %self.profile.address,
            bytes = datagram.len(),
            "SNMP trap sent"
        );
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.socket.take().is_some() {
            debug!(destination = %self.profile.address, "SNMP session closed");
        }
        Ok(())
    }
}
