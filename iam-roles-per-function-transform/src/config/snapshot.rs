//! Immutable view of the process-wide IAM configuration.

use serde_json::Value;

use super::service::ServiceDefinition;
use crate::error::RolesPerFunctionResult;
use crate::types::Statement;

/// Provider-level IAM settings resolved once, before any function is processed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessIamSnapshot {
    /// Statements inherited by opted-in functions, new-style declaration taking precedence
    pub statements: Vec<Statement>,
    /// Managed policies inherited by opted-in functions
    pub managed_policies: Vec<Value>,
    pub vpc: Option<Value>,
    pub region: String,
    pub default_inherit: bool,
    pub permissions_boundary: Option<Value>,
}

impl ProcessIamSnapshot {
    pub fn resolve(service: &ServiceDefinition) -> RolesPerFunctionResult<Self> {
        let settings = service.plugin_settings()?;
        let provider = &service.provider;
        Ok(Self {
            statements: provider.global_statements().unwrap_or_default().to_vec(),
            managed_policies: provider
                .global_managed_policies()
                .unwrap_or_default()
                .to_vec(),
            vpc: provider.vpc.clone(),
            region: provider.region.clone(),
            default_inherit: settings.default_inherit,
            permissions_boundary: settings.iam_global_permissions_boundary,
        })
    }

    /// Whether a function with the given tri-state inherit flag receives the global entries.
    ///
    /// An explicit flag always wins; an unset flag follows `defaultInherit`.
    pub fn inherits(&self, function_flag: Option<bool>) -> bool {
        function_flag.unwrap_or(self.default_inherit)
    }
}
