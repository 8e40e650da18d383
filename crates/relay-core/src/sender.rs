//! 多目的端 trap 分发

use std::sync::Arc;

use futures::future::join_all;
use relay_metrics::{TelemetrySink, TrapOutcome};
use relay_snmp::{DestinationProfile, EngineTime, TrapPdu, TrapTransport};
use relay_types::AlertBucket;
use sysinfo::System;
use tracing::{debug, error, info, warn};

use crate::builder::TrapBuilder;
use crate::error::{RelayError, Result};

/// sysUpTime 与 snmpEngineTime 的来源
pub trait TrapClock: Send + Sync {
    /// 百分之一秒
    fn uptime_ticks(&self) -> u32;

    fn engine_time(&self) -> EngineTime;
}

/// 主机时钟：sysUpTime 取主机运行时间，引擎时间从配置的启动时刻起算
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    engine_start_time: i64,
}

impl SystemClock {
    pub fn new(engine_start_time: i64) -> Self {
        Self { engine_start_time }
    }

    /// 以主机启动时刻作为引擎启动时刻
    pub fn from_boot_time() -> Self {
        Self::new(System::boot_time() as i64)
    }

    fn engine_seconds(&self, now: i64) -> u32 {
        u32::try_from(now - self.engine_start_time)
            .ok()
            .filter(|seconds| *seconds <= i32::MAX as u32)
            .unwrap_or(0)
    }
}

impl TrapClock for SystemClock {
    fn uptime_ticks(&self) -> u32 {
        // TimeTicks 按 2^32 回绕
        (System::uptime().wrapping_mul(100) & u32::MAX as u64) as u32
    }

    fn engine_time(&self) -> EngineTime {
        EngineTime {
            boots: 0,
            time: self.engine_seconds(chrono::Utc::now().timestamp()),
        }
    }
}

/// trap 发送器
pub struct TrapSender {
    builder: TrapBuilder,
    transport: Arc<dyn TrapTransport>,
    destinations: Vec<Arc<DestinationProfile>>,
    telemetry: Arc<dyn TelemetrySink>,
    clock: Arc<dyn TrapClock>,
}

impl TrapSender {
    pub fn new(
        builder: TrapBuilder,
        transport: Arc<dyn TrapTransport>,
        destinations: Vec<DestinationProfile>,
        telemetry: Arc<dyn TelemetrySink>,
        clock: Arc<dyn TrapClock>,
    ) -> Self {
        Self {
            builder,
            transport,
            destinations: destinations.into_iter().map(Arc::new).collect(),
            telemetry,
            clock,
        }
    }

    pub fn destinations(&self) -> impl Iterator<Item = &str> {
        self.destinations.iter().map(|profile| profile.address.as_str())
    }

    /// 先生成全部 trap，再并发发送到每个目的端；任一目的端失败时返回汇总错误
    pub async fn send_alert_traps(&self, bucket: &AlertBucket) -> Result<()> {
        let traps = self.builder.build(bucket, self.clock.uptime_ticks())?;
        if traps.is_empty() {
            debug!("No trap to send");
            return Ok(());
        }

        let engine_time = self.clock.engine_time();
        let results = join_all(
            self.destinations
                .iter()
                .map(|profile| self.send_to_destination(profile.clone(), &traps, engine_time)),
        )
        .await;

        let failed: Vec<String> = results.into_iter().filter_map(|r| r.err()).collect();
        if failed.is_empty() {
            info!(
                traps = traps.len(),
                destinations = self.destinations.len(),
                "Traps sent"
            );
            Ok(())
        } else {
            Err(RelayError::Transport { failed })
        }
    }

    /// 失败时返回目的端地址
    async fn send_to_destination(
        &self,
        profile: Arc<DestinationProfile>,
        traps: &[TrapPdu],
        engine_time: EngineTime,
    ) -> std::result::Result<(), String> {
        let destination = profile.address.clone();

        let mut session = match self.transport.open(profile).await {
            Ok(session) => session,
            Err(e) => {
                error!(destination = %destination, error = %e, "Error while opening SNMP connection");
                for _ in traps {
                    self.telemetry
                        .record_trap_outcome(&destination, TrapOutcome::Failure);
                }
                return Err(destination);
            }
        };

        let mut has_error = false;
        for trap in traps {
            match session.send_trap(trap, engine_time).await {
                Ok(()) => {
                    self.telemetry
                        .record_trap_outcome(&destination, TrapOutcome::Success);
                }
                Err(e) => {
                    error!(destination = %destination, error = %e, "Error while sending trap");
                    self.telemetry
                        .record_trap_outcome(&destination, TrapOutcome::Failure);
                    has_error = true;
                }
            }
        }

        if let Err(e) = session.close().await {
            warn!(destination = %destination, error = %e, "Error while closing SNMP connection");
        }

        if has_error {
            Err(destination)
        } else {
            debug!(destination = %destination, traps = traps.len(), "Destination done");
            Ok(())
        }
    }
}
