pub mod api;
pub mod error;

use std::sync::Arc;

use relay_config::AppConfig;
use relay_core::{AlertParser, TrapSender};
use relay_metrics::MetricsCollector;
use relay_snmp::UdpTransport;
use tracing::info;

/// HTTP 处理器共享状态
pub struct AppState {
    pub parser: AlertParser,
    pub sender: TrapSender,
    pub metrics: Arc<MetricsCollector>,
}

impl AppState {
    pub fn new(parser: AlertParser, sender: TrapSender, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            parser,
            sender,
            metrics,
        }
    }

    /// 由配置组装解析器、UDP 发送器与指标
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let metrics = Arc::new(MetricsCollector::new()?);
        let parser = config.parser()?;
        let sender = TrapSender::new(
            config.trap_builder()?,
            Arc::new(UdpTransport::new()),
            config.destinations()?,
            metrics.clone(),
            Arc::new(config.clock()),
        );

        info!(
            destinations = ?sender.destinations().collect::<Vec<_>>(),
            version = %config.snmp.version,
            "Trap sender ready"
        );

        Ok(Self::new(parser, sender, metrics))
    }
}
