use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 标签 / 注解集合（按键有序）
pub type Labels = BTreeMap<String, String>;

/// 告警状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Firing,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Firing => "firing",
            AlertStatus::Resolved => "resolved",
        }
    }

    pub fn is_firing(&self) -> bool {
        matches!(self, AlertStatus::Firing)
    }
}

/// 单条告警
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub status: AlertStatus,

    #[serde(default)]
    pub labels: Labels,

    #[serde(default)]
    pub annotations: Labels,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,

    #[serde(default, rename = "generatorURL", skip_serializing_if = "Option::is_none")]
    pub generator_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl Alert {
    pub fn new(status: AlertStatus) -> Self {
        Self {
            status,
            labels: Labels::new(),
            annotations: Labels::new(),
            starts_at: None,
            ends_at: None,
            generator_url: None,
            fingerprint: None,
        }
    }

    pub fn firing() -> Self {
        Self::new(AlertStatus::Firing)
    }

    pub fn resolved() -> Self {
        Self::new(AlertStatus::Resolved)
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// 读取标签；不存在时返回 `None`，与空字符串区分
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    pub fn annotation(&self, name: &str) -> Option<&str> {
        self.annotations.get(name).map(String::as_str)
    }

    pub fn is_firing(&self) -> bool {
        self.status.is_firing()
    }
}

/// Webhook 告警批次
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertBatch {
    #[serde(default)]
    pub receiver: String,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub alerts: Vec<Alert>,

    #[serde(default)]
    pub group_labels: Labels,

    #[serde(default)]
    pub common_labels: Labels,

    #[serde(default)]
    pub common_annotations: Labels,

    #[serde(default, rename = "externalURL")]
    pub external_url: String,
}

impl AlertBatch {
    pub fn new(alerts: Vec<Alert>) -> Self {
        Self {
            alerts,
            ..Default::default()
        }
    }

    pub fn with_group_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.group_labels.insert(key.into(), value.into());
        self
    }

    /// 由分组标签生成批次级分组 ID：按键排序，`name=value` 逗号拼接
    pub fn group_id(&self) -> String {
        self.group_labels
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(",")
    }
}
