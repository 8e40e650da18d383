//! trap 内容构建：渲染描述并组装变量绑定

use std::sync::Arc;

use relay_snmp::{Oid, TrapPdu, VarBind, VarValue};
use relay_types::{AlertBucket, AlertGroup};
use tracing::{debug, warn};

use crate::error::{RelayError, Result};
use crate::template::TemplateRenderer;

/// 默认对象占用的子 OID：1 唯一 ID，2 严重级别，3 描述
pub const RESERVED_SUB_OIDS: u32 = 3;

/// 对象 OID 布局
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectsLayout {
    /// trap 类型为 `oid.1`，全部对象位于 `oid.2` 下
    Legacy,

    /// trap 类型即 `oid`，默认对象与用户对象分别位于各自的基 OID 下
    Bases {
        default_objects: Oid,
        user_objects: Oid,
    },
}

impl ObjectsLayout {
    /// 用户对象与默认对象是否共用同一个基 OID
    pub fn shares_objects_base(&self) -> bool {
        match self {
            ObjectsLayout::Legacy => true,
            ObjectsLayout::Bases {
                default_objects,
                user_objects,
            } => default_objects == user_objects,
        }
    }
}

/// 用户自定义字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserObject {
    pub sub_oid: u32,
    pub template_name: String,
}

#[derive(Debug, Clone)]
pub struct TrapBuilderConfig {
    pub layout: ObjectsLayout,
    pub description_template: String,
    pub user_objects: Vec<UserObject>,
}

/// trap 构建器
pub struct TrapBuilder {
    config: TrapBuilderConfig,
    renderer: Arc<dyn TemplateRenderer>,
}

impl TrapBuilder {
    pub fn new(mut config: TrapBuilderConfig, renderer: Arc<dyn TemplateRenderer>) -> Result<Self> {
        config.user_objects.sort_by_key(|object| object.sub_oid);

        for pair in config.user_objects.windows(2) {
            if pair[0].sub_oid == pair[1].sub_oid {
                return Err(RelayError::Config(format!(
                    "duplicate user object sub-OID: {}",
                    pair[0].sub_oid
                )));
            }
        }

        if config.layout.shares_objects_base() {
            if let ObjectsLayout::Bases { .. } = config.layout {
                warn!("Default and user objects share the same base OID, this layout is deprecated");
            }
            if let Some(object) = config
                .user_objects
                .iter()
                .find(|object| object.sub_oid <= RESERVED_SUB_OIDS)
            {
                return Err(RelayError::Config(format!(
                    "user object sub-OID {} collides with default objects, it must be greater than {}",
                    object.sub_oid, RESERVED_SUB_OIDS
                )));
            }
        }

        Ok(Self { config, renderer })
    }

    /// 按分组顺序生成全部 trap，任一渲染失败即整体失败
    pub fn build(&self, bucket: &AlertBucket, uptime_ticks: u32) -> Result<Vec<TrapPdu>> {
        bucket
            .groups()
            .map(|group| self.build_group(group, uptime_ticks))
            .collect()
    }

    fn build_group(&self, group: &AlertGroup, uptime_ticks: u32) -> Result<TrapPdu> {
        let context = serde_json::to_value(group)
            .map_err(|e| RelayError::TemplateRender(e.to_string()))?;
        let description = self
            .renderer
            .render(&self.config.description_template, &context)?;

        let group_oid: Oid = group.oid.parse()?;
        let (trap_oid, default_base, user_base) = match &self.config.layout {
            ObjectsLayout::Legacy => (group_oid.child(1), group_oid.child(2), group_oid.child(2)),
            ObjectsLayout::Bases {
                default_objects,
                user_objects,
            } => (group_oid, default_objects.clone(), user_objects.clone()),
        };
        if trap_oid.arcs().len() < 2 {
            return Err(RelayError::MalformedOid(group.oid.clone()));
        }

        let unique_id = group.trap_unique_id();
        debug!(trap = %unique_id, trap_oid = %trap_oid, "Building trap");

        let mut pdu = TrapPdu::default();
        pdu.push(VarBind::new(Oid::sys_up_time(), VarValue::TimeTicks(uptime_ticks)));
        pdu.push(VarBind::new(
            Oid::snmp_trap_oid(),
            VarValue::ObjectIdentifier(trap_oid),
        ));
        pdu.push(VarBind::octet_string(default_base.child(1), unique_id.trim()));
        pdu.push(VarBind::octet_string(default_base.child(2), group.severity.trim()));
        pdu.push(VarBind::octet_string(default_base.child(3), description.trim()));

        for object in &self.config.user_objects {
            let value = self.renderer.render(&object.template_name, &context)?;
            pdu.push(VarBind::octet_string(user_base.child(object.sub_oid), value.trim()));
        }

        Ok(pdu)
    }
}
