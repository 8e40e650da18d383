//! 告警分组：把一个 webhook 批次划分为若干 trap

use relay_snmp::is_valid_oid;
use relay_types::{Alert, AlertBatch, AlertBucket, AlertGroup};
use tracing::debug;

use crate::error::{RelayError, Result};
use crate::severity::SeverityRanking;

/// trap OID 的解析策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OidResolution {
    /// 标签覆盖默认 OID，firing 与 resolved 使用同一个 OID
    Single { label: String, default_oid: String },

    /// firing 与 resolved 分别解析
    Split {
        firing_label: String,
        default_firing_oid: String,
        resolution_label: Option<String>,
        default_resolution_oid: Option<String>,
    },
}

impl OidResolution {
    /// 配置了 resolution 标签或 resolution 默认 OID 时使用 Split
    pub fn from_options(
        label: impl Into<String>,
        default_oid: impl Into<String>,
        resolution_label: Option<String>,
        default_resolution_oid: Option<String>,
    ) -> Self {
        if resolution_label.is_none() && default_resolution_oid.is_none() {
            OidResolution::Single {
                label: label.into(),
                default_oid: default_oid.into(),
            }
        } else {
            OidResolution::Split {
                firing_label: label.into(),
                default_firing_oid: default_oid.into(),
                resolution_label,
                default_resolution_oid,
            }
        }
    }

    fn configured_oids(&self) -> Vec<&str> {
        match self {
            OidResolution::Single { default_oid, .. } => vec![default_oid.as_str()],
            OidResolution::Split {
                default_firing_oid,
                default_resolution_oid,
                ..
            } => std::iter::once(default_firing_oid.as_str())
                .chain(default_resolution_oid.as_deref())
                .collect(),
        }
    }

    fn resolve(&self, alert: &Alert) -> Result<ResolvedOids> {
        match self {
            OidResolution::Single { label, default_oid } => {
                let oid = validated(alert.label(label).unwrap_or(default_oid))?;
                Ok(ResolvedOids {
                    firing: oid.to_string(),
                    resolution: oid.to_string(),
                })
            }
            OidResolution::Split {
                firing_label,
                default_firing_oid,
                resolution_label,
                default_resolution_oid,
            } => {
                let firing = alert.label(firing_label).unwrap_or(default_firing_oid);
                let resolution = resolution_label
                    .as_deref()
                    .and_then(|label| alert.label(label))
                    .or(default_resolution_oid.as_deref())
                    .unwrap_or(default_firing_oid);

                Ok(ResolvedOids {
                    firing: validated(firing)?.to_string(),
                    resolution: validated(resolution)?.to_string(),
                })
            }
        }
    }
}

fn validated(oid: &str) -> Result<&str> {
    if is_valid_oid(oid) {
        Ok(oid)
    } else {
        Err(RelayError::MalformedOid(oid.to_string()))
    }
}

#[derive(Debug)]
struct ResolvedOids {
    firing: String,
    resolution: String,
}

impl ResolvedOids {
    /// 分组用 OID：两者不同时为 `firing-resolution`
    fn bucket_oid(&self) -> String {
        if self.firing == self.resolution {
            self.firing.clone()
        } else {
            format!("{}-{}", self.firing, self.resolution)
        }
    }

    fn trap_oid(&self, alert: &Alert) -> &str {
        if alert.is_firing() {
            &self.firing
        } else {
            &self.resolution
        }
    }
}

/// 告警解析配置
#[derive(Debug, Clone)]
pub struct ParserConfig {
    pub oid_resolution: OidResolution,
    pub severity_label: String,
    pub default_severity: String,
    pub severities: SeverityRanking,
}

/// 告警解析器
#[derive(Debug, Clone)]
pub struct AlertParser {
    config: ParserConfig,
}

impl AlertParser {
    pub fn new(config: ParserConfig) -> Result<Self> {
        for oid in config.oid_resolution.configured_oids() {
            validated(oid)?;
        }

        if config.severities.rank_of(&config.default_severity).is_none() {
            return Err(RelayError::Config(format!(
                "default severity {} is not in the severity list",
                config.default_severity
            )));
        }

        Ok(Self { config })
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// 将批次分组为 AlertBucket，不修改输入
    pub fn parse(&self, batch: &AlertBatch) -> Result<AlertBucket> {
        let group_id = batch.group_id();
        let mut bucket = AlertBucket::new();

        for alert in &batch.alerts {
            let oids = self.config.oid_resolution.resolve(alert)?;
            let key = format!("{}[{}]", oids.bucket_oid(), group_id);
            debug!(key = %key, status = alert.status.as_str(), "Adding alert to group");

            let group = bucket
                .alert_groups
                .entry(key)
                .or_insert_with(|| AlertGroup {
                    oid: oids.trap_oid(alert).to_string(),
                    group_id: group_id.clone(),
                    group_labels: batch.group_labels.clone(),
                    common_labels: batch.common_labels.clone(),
                    common_annotations: batch.common_annotations.clone(),
                    severity: self.config.severities.lowest().to_string(),
                    alerts: Vec::new(),
                    declared_alerts: Vec::new(),
                });

            group.declared_alerts.push(alert.clone());
            if alert.is_firing() {
                self.add_firing_alert(group, alert)?;
            }
        }

        Ok(bucket)
    }

    fn add_firing_alert(&self, group: &mut AlertGroup, alert: &Alert) -> Result<()> {
        let severity = alert
            .label(&self.config.severity_label)
            .unwrap_or(&self.config.default_severity);

        if self
            .config
            .severities
            .is_higher_priority(severity, &group.severity)?
        {
            group.severity = severity.to_string();
        }
        group.alerts.push(alert.clone());
        Ok(())
    }
}
