//! Resource naming: the host's logical-id conventions and per-function role names.

use derive_new::new;
use serde_json::{json, Value};

pub mod role_name;

pub use role_name::{resolve_role_name, role_name_length, DEFAULT_ROLE_SUFFIX, MAX_ROLE_NAME_LENGTH};

/// Naming rules owned by the host template compiler.
///
/// The transformation never invents logical ids on its own; every id it looks up or creates
/// is derived through this trait so it matches what the compiler emitted.
pub trait NamingConvention {
    /// Normalized form of a function id, usable as a logical-id prefix
    fn normalized_function_id(&self, function_id: &str) -> String;

    /// Logical id of the compiled function resource
    fn compute_resource_id(&self, function_id: &str) -> String {
        format!("{}LambdaFunction", self.normalized_function_id(function_id))
    }

    /// Logical id of the shared execution role
    fn global_role_resource_id(&self) -> String;

    /// `Fn::Join` pattern the shared role's `RoleName` is built from
    fn global_role_name_pattern(&self) -> Value;

    fn log_group_name(&self, deployed_function_name: &str) -> String {
        format!("/aws/lambda/{deployed_function_name}")
    }
}

/// The conventional naming of the Serverless Framework AWS provider.
#[derive(Debug, Clone, new)]
pub struct ServerlessNaming {
    service: String,
    stage: String,
}

impl NamingConvention for ServerlessNaming {
    fn normalized_function_id(&self, function_id: &str) -> String {
        let replaced = function_id.replace('-', "Dash").replace('_', "Underscore");
        let mut chars = replaced.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    fn global_role_resource_id(&self) -> String {
        "IamRoleLambdaExecution".to_string()
    }

    fn global_role_name_pattern(&self) -> Value {
        json!({
            "Fn::Join": [
                "-",
                [self.service, self.stage, {"Ref": "AWS::Region"}, DEFAULT_ROLE_SUFFIX]
            ]
        })
    }
}
