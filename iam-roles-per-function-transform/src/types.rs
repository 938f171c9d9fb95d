//! Policy statement model shared by the synthesizer and the configuration layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Statement effect used for every statement this crate synthesizes.
pub const EFFECT_ALLOW: &str = "Allow";

/// One IAM policy statement as it appears in a role's policy document.
///
/// Declared statements are loosely typed: `Action` and `Resource` may be a string, a list or
/// an intrinsic function, so they are kept as JSON values. Unknown keys (`Principal`, ...)
/// are carried through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_action: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_resource: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Statement {
    /// Build an `Allow` statement over the given actions and resources
    pub fn allow(actions: &[&str], resources: Vec<Value>) -> Self {
        Self {
            effect: Some(Value::from(EFFECT_ALLOW)),
            action: Some(Value::from(actions.to_vec())),
            resource: Some(Value::Array(resources)),
            ..Self::default()
        }
    }

    /// Build an `Allow` statement whose `Resource` is a single reference rather than a list
    pub fn allow_single(actions: &[&str], resource: Value) -> Self {
        Self {
            effect: Some(Value::from(EFFECT_ALLOW)),
            action: Some(Value::from(actions.to_vec())),
            resource: Some(resource),
            ..Self::default()
        }
    }

    /// Names of the required field groups this statement is missing.
    ///
    /// A field counts as missing when absent or empty, the same way the host treats it.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(self.effect.as_ref()) {
            missing.push("Effect");
        }
        if is_blank(self.action.as_ref()) && is_blank(self.not_action.as_ref()) {
            missing.push("Action / NotAction");
        }
        if is_blank(self.resource.as_ref()) && is_blank(self.not_resource.as_ref()) {
            missing.push("Resource / NotResource");
        }
        missing
    }
}

#[cfg(test)]
impl Statement {
    /// The first action of this statement, if it has any
    pub(crate) fn first_action(&self) -> Option<&str> {
        match self.action.as_ref()? {
            Value::String(action) => Some(action),
            Value::Array(actions) => actions.first().and_then(Value::as_str),
            _ => None,
        }
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null | Value::Bool(false)) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(_) => false,
    }
}

/// Whether a loosely typed configuration value holds nothing.
///
/// Null, empty strings, empty lists and empty objects are empty. Booleans and numbers carry no
/// configuration either and count as empty too.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Bool(_) | Value::Number(_)) => true,
    }
}

/// Push `value` onto `values` unless an equal value is already present
pub(crate) fn push_unique(values: &mut Vec<Value>, value: Value) {
    if !values.contains(&value) {
        values.push(value);
    }
}
