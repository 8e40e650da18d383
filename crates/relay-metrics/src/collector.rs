use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder};
use tracing::debug;

use crate::error::MetricsError;
use crate::sink::{TelemetrySink, TrapOutcome};

/// Prometheus 指标收集器
pub struct MetricsCollector {
    // HTTP 指标
    requests_total: CounterVec,

    // trap 指标
    traps_total: CounterVec,

    registry: Registry,
}

impl MetricsCollector {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("snmp_relay_requests_total", "Total number of alert webhook requests"),
            &["code"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let traps_total = CounterVec::new(
            Opts::new("snmp_relay_traps_total", "Total number of SNMP traps attempted"),
            &["destination", "outcome"],
        )?;
        registry.register(Box::new(traps_total.clone()))?;

        Ok(Self {
            requests_total,
            traps_total,
            registry,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// 某个目的端某种结果的累计次数
    pub fn trap_count(&self, destination: &str, outcome: TrapOutcome) -> u64 {
        self.traps_total
            .with_label_values(&[destination, outcome.as_str()])
            .get() as u64
    }

    pub fn request_count(&self, status_code: u16) -> u64 {
        self.requests_total
            .with_label_values(&[&status_code.to_string()])
            .get() as u64
    }

    // 导出指标
    pub fn export(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl TelemetrySink for MetricsCollector {
    fn record_trap_outcome(&self, destination: &str, outcome: TrapOutcome) {
        debug!(destination, outcome = %outcome, "Recording trap outcome");
        self.traps_total
            .with_label_values(&[destination, outcome.as_str()])
            .inc();
    }

    fn record_request(&self, status_code: u16) {
        self.requests_total
            .with_label_values(&[&status_code.to_string()])
            .inc();
    }
}
