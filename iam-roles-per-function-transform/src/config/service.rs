//! Service-level declarations: provider settings, ordered functions and the custom block.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use super::function::FunctionConfig;
use crate::error::RolesPerFunctionResult;
use crate::types::Statement;

/// Key of this extension's block under `custom`
pub const PLUGIN_CONFIG_KEY: &str = "iam-roles-per-function";

/// Historical key, still honoured when [`PLUGIN_CONFIG_KEY`] is absent
pub const LEGACY_PLUGIN_CONFIG_KEY: &str = "serverless-iam-roles-per-function";

const DEFAULT_STAGE: &str = "dev";
const DEFAULT_REGION: &str = "us-east-1";

/// The materialized service definition the host hands over before packaging finishes.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDefinition {
    pub service: String,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default, deserialize_with = "deserialize_functions")]
    functions: Vec<(String, FunctionConfig)>,
    #[serde(default)]
    pub custom: Map<String, Value>,
}

impl ServiceDefinition {
    pub fn from_value(value: Value) -> RolesPerFunctionResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Function identifiers in declaration order
    pub fn all_function_ids(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(|(id, _)| id.as_str())
    }

    pub fn function(&self, function_id: &str) -> Option<&FunctionConfig> {
        self.functions
            .iter()
            .find(|(id, _)| id == function_id)
            .map(|(_, function)| function)
    }

    /// Name the function is deployed under: its explicit `name`, else `<service>-<stage>-<id>`
    pub fn deployed_function_name(&self, function_id: &str) -> String {
        self.function(function_id)
            .and_then(|function| function.name.clone())
            .unwrap_or_else(|| format!("{}-{}-{}", self.service, self.provider.stage, function_id))
    }

    /// This extension's settings from the custom block, defaults when not configured
    pub fn plugin_settings(&self) -> RolesPerFunctionResult<PluginSettings> {
        match self
            .custom
            .get(PLUGIN_CONFIG_KEY)
            .or_else(|| self.custom.get(LEGACY_PLUGIN_CONFIG_KEY))
        {
            None | Some(Value::Null) => Ok(PluginSettings::default()),
            Some(block) => Ok(serde_json::from_value(block.clone())?),
        }
    }
}

fn deserialize_functions<'de, D>(deserializer: D) -> Result<Vec<(String, FunctionConfig)>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Map<String, Value>> = Option::deserialize(deserializer)?;
    raw.unwrap_or_default()
        .into_iter()
        .map(|(id, body)| {
            let function = if body.is_null() {
                FunctionConfig::default()
            } else {
                serde_json::from_value(body).map_err(|e| {
                    serde::de::Error::custom(format!("function '{id}': {e}"))
                })?
            };
            Ok((id, function))
        })
        .collect()
}

/// Provider-level settings shared by every function.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderConfig {
    pub stage: String,
    pub region: String,
    /// Legacy global statements
    pub iam_role_statements: Option<Vec<Statement>>,
    /// Legacy global managed policies
    pub iam_managed_policies: Option<Vec<Value>>,
    pub iam: Option<ProviderIam>,
    pub vpc: Option<Value>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            stage: DEFAULT_STAGE.to_string(),
            region: DEFAULT_REGION.to_string(),
            iam_role_statements: None,
            iam_managed_policies: None,
            iam: None,
            vpc: None,
        }
    }
}

impl ProviderConfig {
    fn declared_role(&self) -> Option<&DeclaredRole> {
        match self.iam.as_ref()?.role.as_ref()? {
            ProviderRole::Declared(role) => Some(role),
            ProviderRole::External(_) => None,
        }
    }

    /// Global statements, the `iam.role.statements` form winning over the legacy key
    /// whenever it is present, even empty
    pub fn global_statements(&self) -> Option<&[Statement]> {
        match self.declared_role().and_then(|role| role.statements.as_deref()) {
            Some(statements) => Some(statements),
            None => self.iam_role_statements.as_deref(),
        }
    }

    /// Global managed policies, same precedence as [`Self::global_statements`]
    pub fn global_managed_policies(&self) -> Option<&[Value]> {
        match self
            .declared_role()
            .and_then(|role| role.managed_policies.as_deref())
        {
            Some(policies) => Some(policies),
            None => self.iam_managed_policies.as_deref(),
        }
    }
}

/// The `provider.iam` block
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderIam {
    pub role: Option<ProviderRole>,
}

/// Intrinsic functions that can stand in for the ARN of an existing role
const ROLE_REFERENCE_INTRINSICS: [&str; 5] =
    ["Fn::GetAtt", "Fn::ImportValue", "Ref", "Fn::Sub", "Fn::Join"];

/// `provider.iam.role`: either a declared role or a reference to an existing one
#[derive(Debug, Clone)]
pub enum ProviderRole {
    Declared(DeclaredRole),
    External(Value),
}

impl ProviderRole {
    /// A plain string or a single intrinsic function object references an existing role;
    /// any other object declares one.
    fn is_reference(value: &Value) -> bool {
        match value {
            Value::String(_) => true,
            Value::Object(object) => {
                object.len() == 1
                    && object
                        .keys()
                        .all(|key| ROLE_REFERENCE_INTRINSICS.contains(&key.as_str()))
            }
            _ => false,
        }
    }
}

impl<'de> Deserialize<'de> for ProviderRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        if Self::is_reference(&value) {
            return Ok(Self::External(value));
        }
        serde_json::from_value(value)
            .map(Self::Declared)
            .map_err(|e| serde::de::Error::custom(format!("provider.iam.role: {e}")))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclaredRole {
    pub name: Option<String>,
    pub path: Option<String>,
    pub statements: Option<Vec<Statement>>,
    pub managed_policies: Option<Vec<Value>>,
    #[serde(alias = "permissionBoundary")]
    pub permissions_boundary: Option<Value>,
    pub tags: Option<Map<String, Value>>,
}

/// Settings under `custom.iam-roles-per-function`.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PluginSettings {
    /// Inherit provider-level statements and managed policies unless a function opts out
    #[serde(default)]
    pub default_inherit: bool,
    /// Permissions boundary applied to every generated role without its own
    pub iam_global_permissions_boundary: Option<Value>,
}
