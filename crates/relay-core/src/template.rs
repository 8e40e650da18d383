//! trap 描述与自定义字段的模板渲染（minijinja）

use std::collections::BTreeMap;

use minijinja::{Environment, Error, ErrorKind, UndefinedBehavior, Value};
use tracing::{debug, warn};

use crate::error::{RelayError, Result};

/// 未设置标签的告警归入该分组
pub const MISSING_LABEL_GROUP: &str = "<none>";

/// 内置描述模板：按严重级别列出 firing 告警，全部恢复时为 `Status: OK`
pub const DEFAULT_DESCRIPTION_TEMPLATE: &str = r#"{%- if alerts -%}
{{ alerts | length }}/{{ declaredAlerts | length }} alerts are firing:
{% for severity, severity_alerts in group_alerts_by_label(alerts, "severity") | items %}
Status: {{ severity }}
{%- for alert in severity_alerts %}
- Alert: {{ alert.labels.alertname if "alertname" in alert.labels else "<none>" }}
{%- if "summary" in alert.annotations %}
  Summary: {{ alert.annotations.summary }}
{%- endif %}
{%- if "description" in alert.annotations %}
  Description: {{ alert.annotations.description }}
{%- endif %}
{%- endfor %}
{% endfor %}
{%- else -%}
Status: OK
{%- endif -%}"#;

/// 模板渲染接口
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template_name: &str, context: &serde_json::Value) -> Result<String>;
}

/// 基于 minijinja 的模板服务，未定义变量视为错误
pub struct TemplateService {
    env: Environment<'static>,
}

impl TemplateService {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_function("group_alerts_by_label", group_alerts_by_label);
        env.add_function("group_alerts_by_name", group_alerts_by_name);
        env.add_function("group_alerts_by_status", group_alerts_by_status);

        Self { env }
    }

    /// 注册模板，语法错误在此处暴露
    pub fn add_template(&mut self, name: impl Into<String>, source: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.env
            .add_template_owned(name.clone(), source.into())
            .map_err(|e| RelayError::Config(format!("invalid template {}: {}", name, e)))
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }
}

impl Default for TemplateService {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for TemplateService {
    fn render(&self, template_name: &str, context: &serde_json::Value) -> Result<String> {
        debug!(template = template_name, "Rendering template");

        let template = self.env.get_template(template_name)?;
        match template.render(context) {
            Ok(rendered) => Ok(rendered),
            Err(e) => {
                warn!(
                    template = template_name,
                    context = %context,
                    error = %e,
                    "Failed to render template"
                );
                Err(RelayError::TemplateRender(format!("{}: {}", template_name, e)))
            }
        }
    }
}

type FunctionResult<T> = std::result::Result<T, Error>;

fn group_alerts_by<F>(alerts: Vec<Value>, label: F) -> FunctionResult<Value>
where
    F: Fn(&Value) -> FunctionResult<String>,
{
    let mut groups: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for alert in alerts {
        groups.entry(label(&alert)?).or_default().push(alert);
    }
    Ok(Value::from_serialize(&groups))
}

fn alert_label(alert: &Value, name: &str) -> FunctionResult<String> {
    let labels = alert.get_attr("labels")?;
    if labels.is_undefined() {
        return Err(Error::new(ErrorKind::InvalidOperation, "value is not an alert"));
    }

    let value = labels.get_attr(name)?;
    Ok(value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| MISSING_LABEL_GROUP.to_string()))
}

/// `group_alerts_by_label(alerts, label)`
fn group_alerts_by_label(alerts: Vec<Value>, label: &str) -> FunctionResult<Value> {
    group_alerts_by(alerts, |alert| alert_label(alert, label))
}

/// `group_alerts_by_name(alerts)`，按 `alertname` 标签
fn group_alerts_by_name(alerts: Vec<Value>) -> FunctionResult<Value> {
    group_alerts_by(alerts, |alert| alert_label(alert, "alertname"))
}

/// `group_alerts_by_status(alerts)`
fn group_alerts_by_status(alerts: Vec<Value>) -> FunctionResult<Value> {
    group_alerts_by(alerts, |alert| {
        let status = alert.get_attr("status")?;
        Ok(status.as_str().unwrap_or(MISSING_LABEL_GROUP).to_string())
    })
}
