//! Per-function role resources, cloned from the shared execution role.

use serde_json::Value;

use crate::error::{RolesPerFunctionError, RolesPerFunctionResult};
use crate::synthesis::FunctionPermissions;

/// Function-level settings that replace what the shared role carries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleOverrides {
    /// `RoleName`: an explicit name or a generated `Fn::Join`
    pub role_name: Value,
    /// Set when the function or the provider asks for a permissions boundary
    pub permissions_boundary: Option<Value>,
}

/// Logical id of the role created for a function
pub fn role_resource_id(normalized_function_id: &str, global_role_id: &str) -> String {
    format!("{normalized_function_id}{global_role_id}")
}

/// Build a function's role from the shared role resource.
///
/// The shared role is deep-copied so everything the host put on it (assume-role policy,
/// path, tags) carries over; only the policy statements, managed policies, name and
/// permissions boundary are replaced.
pub fn materialize_role(
    global_role: &Value,
    permissions: &FunctionPermissions,
    overrides: RoleOverrides,
) -> RolesPerFunctionResult<Value> {
    let mut role = global_role.clone();
    let properties = role
        .get_mut("Properties")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| shape_error(global_role))?;

    let policy_document = properties
        .get_mut("Policies")
        .and_then(|policies| policies.get_mut(0))
        .and_then(|policy| policy.get_mut("PolicyDocument"))
        .and_then(Value::as_object_mut)
        .ok_or_else(|| shape_error(global_role))?;
    policy_document.insert(
        "Statement".to_string(),
        serde_json::to_value(&permissions.statements)?,
    );

    properties.insert(
        "ManagedPolicyArns".to_string(),
        Value::Array(permissions.managed_policies.clone()),
    );
    properties.insert("RoleName".to_string(), overrides.role_name);
    match overrides.permissions_boundary {
        Some(boundary) => {
            properties.insert("PermissionsBoundary".to_string(), boundary);
        }
        None => {
            properties.remove("PermissionsBoundary");
        }
    }

    Ok(role)
}

fn shape_error(global_role: &Value) -> RolesPerFunctionError {
    RolesPerFunctionError::shape(format!(
        "Global IAM role resource is not in expected format. Got resource: {global_role}"
    ))
}
