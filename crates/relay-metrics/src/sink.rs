use std::fmt;

use serde::{Deserialize, Serialize};

/// 单条 trap 的发送结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrapOutcome {
    Success,
    Failure,
}

impl TrapOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrapOutcome::Success => "success",
            TrapOutcome::Failure => "failure",
        }
    }
}

impl fmt::Display for TrapOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 遥测接收端，由调度器与 HTTP 层注入使用
pub trait TelemetrySink: Send + Sync {
    /// 每条尝试发送的 trap 记录一次
    fn record_trap_outcome(&self, destination: &str, outcome: TrapOutcome);

    /// 每个 HTTP 请求记录一次
    fn record_request(&self, status_code: u16);
}

/// 丢弃所有记录
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn record_trap_outcome(&self, _destination: &str, _outcome: TrapOutcome) {}

    fn record_request(&self, _status_code: u16) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(TrapOutcome::Success.to_string(), "success");
        assert_eq!(TrapOutcome::Failure.as_str(), "failure");
    }
}
