//! 由配置构建解析器、trap 构建器与目的端

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use relay_core::{
    AlertParser, ObjectsLayout, OidResolution, ParserConfig, SeverityRanking, SystemClock,
    TemplateService, TrapBuilder, TrapBuilderConfig, UserObject, DEFAULT_DESCRIPTION_TEMPLATE,
};
use relay_snmp::{DestinationProfile, Oid, SnmpVersion, V3Security, V3Settings};
use tracing::{info, warn};

use crate::app::AppConfig;
use crate::error::ConfigError;

const DESCRIPTION_TEMPLATE: &str = "description";

fn read_template(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Template {
        path: path.to_path_buf(),
        source,
    })
}

fn decode_engine_id(name: &str, value: Option<&str>) -> Result<Option<Vec<u8>>, ConfigError> {
    value
        .map(|text| {
            hex::decode(text.trim_start_matches("0x"))
                .map_err(|e| ConfigError::Invalid(format!("{} is not valid hex: {}", name, e)))
        })
        .transpose()
}

impl AppConfig {
    pub fn parser(&self) -> Result<AlertParser, ConfigError> {
        let severities = SeverityRanking::new(self.alert.severities.clone())?;
        let oid_resolution = OidResolution::from_options(
            self.trap.oid_label.clone(),
            self.trap.default_oid.clone(),
            self.trap.resolution_oid_label.clone(),
            self.trap.resolution_default_oid.clone(),
        );

        let parser = AlertParser::new(ParserConfig {
            oid_resolution,
            severity_label: self.alert.severity_label.clone(),
            default_severity: self.alert.default_severity.clone(),
            severities,
        })?;

        // 默认 OID 还须能按 BER 编码
        for oid in std::iter::once(&self.trap.default_oid)
            .chain(self.trap.resolution_default_oid.as_ref())
        {
            oid.parse::<Oid>()?;
        }

        Ok(parser)
    }

    /// 读取并编译所有模板
    pub fn trap_builder(&self) -> Result<TrapBuilder, ConfigError> {
        let mut templates = TemplateService::new();

        let description = match &self.trap.description_template {
            Some(path) => read_template(path)?,
            None => DEFAULT_DESCRIPTION_TEMPLATE.to_string(),
        };
        templates.add_template(DESCRIPTION_TEMPLATE, description)?;

        let mut user_objects = Vec::with_capacity(self.trap.user_objects.len());
        for object in &self.trap.user_objects {
            let source = match (&object.template, &object.template_file) {
                (Some(template), None) => template.clone(),
                (None, Some(path)) => read_template(path)?,
                _ => {
                    return Err(ConfigError::Invalid(format!(
                        "user object {} needs exactly one of template or template_file",
                        object.sub_oid
                    )))
                }
            };

            let template_name = format!("user_object.{}", object.sub_oid);
            templates.add_template(template_name.clone(), source)?;
            user_objects.push(UserObject {
                sub_oid: object.sub_oid,
                template_name,
            });
        }

        let layout = if self.trap.legacy_objects {
            warn!("Legacy trap objects layout is deprecated, consider configuring objects base OIDs");
            ObjectsLayout::Legacy
        } else {
            ObjectsLayout::Bases {
                default_objects: self.trap.default_objects_base_oid.parse::<Oid>()?,
                user_objects: self.trap.user_objects_base_oid.parse::<Oid>()?,
            }
        };

        Ok(TrapBuilder::new(
            TrapBuilderConfig {
                layout,
                description_template: DESCRIPTION_TEMPLATE.to_string(),
                user_objects,
            },
            Arc::new(templates),
        )?)
    }

    /// 每个目的端一个 profile，v3 密钥只本地化一次
    pub fn destinations(&self) -> Result<Vec<DestinationProfile>, ConfigError> {
        let snmp = &self.snmp;
        if snmp.destinations.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one SNMP destination is required".to_string(),
            ));
        }
        if snmp.private_enabled && !snmp.authentication_enabled {
            return Err(ConfigError::Invalid(
                "SNMP privacy requires authentication to be enabled".to_string(),
            ));
        }

        let timeout = Duration::from_millis(snmp.timeout_ms);
        let security = match snmp.version {
            SnmpVersion::V2c => {
                if snmp.authentication_enabled || snmp.private_enabled {
                    return Err(ConfigError::Invalid(
                        "SNMP authentication and privacy are only supported with V3".to_string(),
                    ));
                }
                None
            }
            SnmpVersion::V3 => Some(V3Security::new(V3Settings {
                username: snmp.authentication_username.clone(),
                auth: snmp.authentication_enabled.then(|| {
                    (
                        snmp.authentication_protocol,
                        snmp.authentication_password.clone(),
                    )
                }),
                privacy: snmp
                    .private_enabled
                    .then(|| (snmp.private_protocol, snmp.private_password.clone())),
                security_engine_id: decode_engine_id(
                    "security_engine_id",
                    snmp.security_engine_id.as_deref(),
                )?,
                context_engine_id: decode_engine_id(
                    "context_engine_id",
                    snmp.context_engine_id.as_deref(),
                )?,
                context_name: snmp.context_name.clone(),
            })?),
        };

        Ok(snmp
            .destinations
            .iter()
            .map(|address| {
                let profile = match &security {
                    None => DestinationProfile::v2c(address.clone(), snmp.community.clone()),
                    Some(security) => DestinationProfile::v3(address.clone(), security.clone()),
                };
                profile.with_retries(snmp.retries).with_timeout(timeout)
            })
            .collect())
    }

    pub fn clock(&self) -> SystemClock {
        match self.snmp.engine_start_time {
            Some(start) => SystemClock::new(start),
            None => SystemClock::from_boot_time(),
        }
    }

    /// 启动前完整校验
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parser()?;
        self.trap_builder()?;
        let destinations = self.destinations()?;

        info!(
            destinations = destinations.len(),
            version = %self.snmp.version,
            "Configuration is valid"
        );
        Ok(())
    }
}
