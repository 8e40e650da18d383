use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::alert::{Alert, Labels};

/// 告警分组，对应一条待发送的 trap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertGroup {
    /// trap OID，创建时确定
    pub oid: String,

    pub group_id: String,

    pub group_labels: Labels,

    pub common_labels: Labels,

    pub common_annotations: Labels,

    /// 分组内 firing 告警的最高严重级别
    pub severity: String,

    /// 仍在 firing 的告警
    pub alerts: Vec<Alert>,

    /// 映射到本分组的全部告警（含 resolved）
    pub declared_alerts: Vec<Alert>,
}

impl AlertGroup {
    /// trap 标识：`oid[groupId]`
    ///
    /// 仅在单 OID 模式下唯一。firing/resolution 分离时，不同分组可能得到相同的标识
    /// （如 `1.1-3.3[]` 与 `1.1[]` 均为 `1.1[]`），接收端不应把它当作全局唯一键。
    pub fn trap_unique_id(&self) -> String {
        format!("{}[{}]", self.oid, self.group_id)
    }

    pub fn is_all_clear(&self) -> bool {
        self.alerts.is_empty()
    }
}

/// 一个批次的全部分组，按 trap key 有序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertBucket {
    pub alert_groups: BTreeMap<String, AlertGroup>,
}

impl AlertBucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&AlertGroup> {
        self.alert_groups.get(key)
    }

    pub fn groups(&self) -> impl Iterator<Item = &AlertGroup> {
        self.alert_groups.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.alert_groups.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.alert_groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alert_groups.is_empty()
    }
}
