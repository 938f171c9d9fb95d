//! Full permission set of one function's role.

use log::debug;
use serde_json::{json, Value};

use super::statement_builder::{
    error_destination_statement, event_source_statements, log_statement, validate_statements,
};
use crate::config::{FunctionConfig, ProcessIamSnapshot};
use crate::error::{RolesPerFunctionError, RolesPerFunctionResult};
use crate::types::{is_empty_value, push_unique, Statement};

/// Statements and managed policies synthesized for one function
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionPermissions {
    /// Policy statements, the log statement always first
    pub statements: Vec<Statement>,
    /// Managed policy references, deduplicated in first-seen order
    pub managed_policies: Vec<Value>,
}

/// AWS managed policy granting the ENI access a function placed in a VPC needs
pub fn network_access_policy() -> Value {
    json!({
        "Fn::Join": [
            "",
            ["arn:", {"Ref": "AWS::Partition"}, ":iam::aws:policy/service-role/AWSLambdaVPCAccessExecutionRole"]
        ]
    })
}

/// Reject declarations the transformation cannot honour.
///
/// Runs before anything is synthesized so a failing function leaves no trace in the template.
pub fn validate_function(function_id: &str, function: &FunctionConfig) -> RolesPerFunctionResult<()> {
    if !is_empty_value(function.role.as_ref()) && function.declares_role_statements() {
        return Err(RolesPerFunctionError::conflicting_role(function_id));
    }
    validate_statements(function.iam.iam_role_statements.as_deref().unwrap_or_default())
}

/// Compute the permissions of `function_id`'s own role.
///
/// Statement order is fixed: log access, event-inferred access (streams then queues), error
/// destination publish, inherited provider statements, then the function's own statements.
pub fn synthesize_permissions(
    function_id: &str,
    function: &FunctionConfig,
    snapshot: &ProcessIamSnapshot,
    log_group_name: &str,
) -> RolesPerFunctionResult<FunctionPermissions> {
    let mut statements = vec![log_statement(log_group_name)];

    statements.extend(event_source_statements(function_id, function)?);

    if let Some(destination) = function.on_error.as_ref().filter(|d| !is_empty_value(Some(*d))) {
        statements.push(error_destination_statement(destination));
    }

    if snapshot.inherits(function.iam.iam_role_statements_inherit) {
        debug!(
            "Function '{function_id}' inherits {} provider statement(s)",
            snapshot.statements.len()
        );
        statements.extend(snapshot.statements.iter().cloned());
    }

    if let Some(own) = &function.iam.iam_role_statements {
        statements.extend(own.iter().cloned());
    }

    let managed_policies = managed_policies(function_id, function, snapshot);

    Ok(FunctionPermissions {
        statements,
        managed_policies,
    })
}

fn managed_policies(
    function_id: &str,
    function: &FunctionConfig,
    snapshot: &ProcessIamSnapshot,
) -> Vec<Value> {
    let inherited: &[Value] = if snapshot.inherits(function.iam.iam_managed_policies_inherit) {
        snapshot.managed_policies.as_slice()
    } else {
        &[]
    };
    let own = function.iam.iam_managed_policies.as_deref().unwrap_or_default();

    let mut policies = Vec::new();
    for policy in inherited.iter().chain(own) {
        push_unique(&mut policies, policy.clone());
    }

    if !is_empty_value(function.vpc.as_ref()) || !is_empty_value(snapshot.vpc.as_ref()) {
        debug!("Function '{function_id}' runs in a VPC, attaching network access policy");
        push_unique(&mut policies, network_access_policy());
    }
    policies
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LOG_GROUP: &str = "/aws/lambda/svc-dev-fn";

    fn function(value: Value) -> FunctionConfig {
        serde_json::from_value(value).unwrap()
    }

    fn snapshot_with_globals(default_inherit: bool) -> ProcessIamSnapshot {
        ProcessIamSnapshot {
            statements: serde_json::from_value(json!([{
                "Effect": "Allow",
                "Action": ["xray:PutTelemetryRecords", "xray:PutTraceSegments"],
                "Resource": "*"
            }]))
            .unwrap(),
            managed_policies: vec![json!("arn:aws:iam::aws:policy/AWSXRayDaemonWriteAccess")],
            region: "us-east-1".to_string(),
            default_inherit,
            ..ProcessIamSnapshot::default()
        }
    }

    fn first_actions(permissions: &FunctionPermissions) -> Vec<&str> {
        permissions
            .statements
            .iter()
            .filter_map(Statement::first_action)
            .collect()
    }

    #[test]
    fn test_empty_statements_still_get_log_statement() {
        let function = function(json!({"iamRoleStatements": []}));
        let permissions =
            synthesize_permissions("fn", &function, &ProcessIamSnapshot::default(), LOG_GROUP)
                .unwrap();
        assert_eq!(permissions.statements, vec![log_statement(LOG_GROUP)]);
        assert!(permissions.managed_policies.is_empty());
    }

    #[test]
    fn test_statement_order() {
        let function = function(json!({
            "iamRoleStatementsInherit": true,
            "onError": "arn:aws:sns:us-east-1:1234567890:dlq",
            "events": [{"sqs": "arn:aws:sqs:us-east-1:1234567890:MyQueue"}],
            "iamRoleStatements": [{"Effect": "Allow", "Action": ["dynamodb:GetItem"], "Resource": "*"}]
        }));
        let permissions =
            synthesize_permissions("fn", &function, &snapshot_with_globals(false), LOG_GROUP)
                .unwrap();
        assert_eq!(
            first_actions(&permissions),
            vec![
                "logs:CreateLogStream",
                "sqs:ReceiveMessage",
                "sns:Publish",
                "xray:PutTelemetryRecords",
                "dynamodb:GetItem"
            ]
        );
        // managed policy inheritance has its own flag
        assert!(permissions.managed_policies.is_empty());
    }

    #[test]
    fn test_exactly_one_log_statement_first() {
        let function = function(json!({
            "iamRoleStatementsInherit": true,
            "iamRoleStatements": [{"Effect": "Allow", "Action": "s3:GetObject", "Resource": "*"}]
        }));
        let permissions =
            synthesize_permissions("fn", &function, &snapshot_with_globals(true), LOG_GROUP)
                .unwrap();
        let log_statements = permissions
            .statements
            .iter()
            .filter(|s| s.first_action() == Some("logs:CreateLogStream"))
            .count();
        assert_eq!(log_statements, 1);
        assert_eq!(permissions.statements[0], log_statement(LOG_GROUP));
    }

    #[test]
    fn test_explicit_false_beats_default_inherit() {
        let function = function(json!({
            "iamRoleStatementsInherit": false,
            "iamManagedPoliciesInherit": false,
            "iamRoleStatements": [{"Effect": "Allow", "Action": ["dynamodb:GetItem"], "Resource": "*"}]
        }));
        let permissions =
            synthesize_permissions("fn", &function, &snapshot_with_globals(true), LOG_GROUP)
                .unwrap();
        assert_eq!(
            first_actions(&permissions),
            vec!["logs:CreateLogStream", "dynamodb:GetItem"]
        );
        assert!(permissions.managed_policies.is_empty());
    }

    #[test]
    fn test_default_inherit_applies_to_unset_flags() {
        let function = function(json!({"iamRoleStatements": []}));
        let permissions =
            synthesize_permissions("fn", &function, &snapshot_with_globals(true), LOG_GROUP)
                .unwrap();
        assert_eq!(
            first_actions(&permissions),
            vec!["logs:CreateLogStream", "xray:PutTelemetryRecords"]
        );
        assert_eq!(permissions.managed_policies.len(), 1);
    }

    #[test]
    fn test_managed_policy_inheritance_is_independent() {
        let function = function(json!({
            "iamRoleStatementsInherit": false,
            "iamManagedPoliciesInherit": true,
            "iamRoleStatements": []
        }));
        let permissions =
            synthesize_permissions("fn", &function, &snapshot_with_globals(false), LOG_GROUP)
                .unwrap();
        assert_eq!(first_actions(&permissions), vec!["logs:CreateLogStream"]);
        assert_eq!(
            permissions.managed_policies,
            vec![json!("arn:aws:iam::aws:policy/AWSXRayDaemonWriteAccess")]
        );
    }

    #[test]
    fn test_managed_policies_deduplicated_with_network_policy_last() {
        let function = function(json!({
            "iamManagedPoliciesInherit": true,
            "iamManagedPolicies": [
                "arn:aws:iam::aws:policy/ReadOnlyAccess",
                "arn:aws:iam::aws:policy/AWSXRayDaemonWriteAccess"
            ],
            "vpc": {"securityGroupIds": ["sg-1"], "subnetIds": ["subnet-1"]},
            "iamRoleStatements": []
        }));
        let permissions =
            synthesize_permissions("fn", &function, &snapshot_with_globals(false), LOG_GROUP)
                .unwrap();
        assert_eq!(
            permissions.managed_policies,
            vec![
                json!("arn:aws:iam::aws:policy/AWSXRayDaemonWriteAccess"),
                json!("arn:aws:iam::aws:policy/ReadOnlyAccess"),
                network_access_policy(),
            ]
        );
    }

    #[test]
    fn test_network_policy_from_provider_vpc_not_duplicated() {
        let function = function(json!({
            "iamManagedPolicies": [network_access_policy()],
            "iamRoleStatements": []
        }));
        let snapshot = ProcessIamSnapshot {
            vpc: Some(json!({"securityGroupIds": ["sg-1"]})),
            ..ProcessIamSnapshot::default()
        };
        let permissions = synthesize_permissions("fn", &function, &snapshot, LOG_GROUP).unwrap();
        assert_eq!(permissions.managed_policies, vec![network_access_policy()]);
    }

    #[test]
    fn test_empty_vpc_does_not_attach_network_policy() {
        let function = function(json!({"vpc": {}, "iamRoleStatements": []}));
        let permissions =
            synthesize_permissions("fn", &function, &ProcessIamSnapshot::default(), LOG_GROUP)
                .unwrap();
        assert!(permissions.managed_policies.is_empty());
    }

    #[test]
    fn test_validate_function_rejects_role_with_statements() {
        let function = function(json!({
            "role": "arn:aws:iam::0123456789:role/Test",
            "iamRoleStatements": []
        }));
        let err = validate_function("hello", &function).unwrap_err();
        assert!(matches!(err, RolesPerFunctionError::ConflictingRole { .. }));
        assert!(err.to_string().contains("hello"));
    }

    #[test]
    fn test_validate_function_checks_statement_shape() {
        let function = function(json!({
            "iamRoleStatements": [{"Action": ["xray:PutTraceSegments"], "Resource": "*"}]
        }));
        let err = validate_function("hello", &function).unwrap_err();
        assert!(matches!(err, RolesPerFunctionError::MalformedStatements(_)));
    }

    #[test]
    fn test_validate_function_allows_role_without_statements() {
        let function = function(json!({"role": "arn:aws:iam::0123456789:role/Test"}));
        assert!(validate_function("hello", &function).is_ok());
    }
}
