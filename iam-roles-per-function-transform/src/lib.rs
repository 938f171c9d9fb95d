//! This crate rewrites a compiled CloudFormation template so that every function declaring
//! `iamRoleStatements` runs under its own least-privilege IAM role:
//! - Permission synthesis (logs, event sources, error destination, inherited and own statements)
//! - Role name generation within the IAM length limit
//! - Role materialization from the shared execution role
//! - Rewiring of function resources and event source mappings
//!

pub mod commands;
pub mod config;
mod error;
pub mod naming;
mod schema;
pub mod synthesis;
pub mod template;
mod types;

// Re-exports for a small, focused public API
pub use commands::{LifecycleHook, RolesPerFunctionService};
pub use config::{FunctionConfig, ProcessIamSnapshot, ServiceDefinition};
pub use error::{RolesPerFunctionError, RolesPerFunctionResult, ERROR_MARKER};
pub use naming::{NamingConvention, ServerlessNaming};
pub use schema::configuration_schema;
pub use template::{RoleAssignments, Template};
pub use types::{is_empty_value, Statement, EFFECT_ALLOW};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_function_end_to_end() {
        let service = ServiceDefinition::from_value(json!({
            "service": "svc",
            "provider": {"stage": "dev", "region": "us-east-1"},
            "functions": {"hello": {
                "iamRoleStatements": [{"Effect": "Allow", "Action": ["s3:GetObject"], "Resource": "*"}]
            }}
        }))
        .unwrap();
        let naming = ServerlessNaming::new("svc".to_string(), "dev".to_string());
        let mut template = Template::from_value(json!({"Resources": {
            "IamRoleLambdaExecution": {
                "Type": "AWS::IAM::Role",
                "Properties": {
                    "Policies": [{"PolicyName": "p", "PolicyDocument": {"Statement": []}}],
                    "RoleName": {"Fn::Join": ["-", ["svc", "dev", {"Ref": "AWS::Region"}, "lambdaRole"]]}
                }
            },
            "HelloLambdaFunction": {
                "Type": "AWS::Lambda::Function",
                "Properties": {"Role": {"Fn::GetAtt": ["IamRoleLambdaExecution", "Arn"]}},
                "DependsOn": ["IamRoleLambdaExecution"]
            }
        }}))
        .unwrap();

        let engine = RolesPerFunctionService::new(&service, &naming).unwrap();
        engine
            .run_hook(LifecycleHook::BeforePackageFinalize, &mut template)
            .unwrap();

        let role = template.resource("HelloIamRoleLambdaExecution").unwrap();
        assert_eq!(
            role["Properties"]["RoleName"],
            json!({"Fn::Join": ["-", ["svc", "dev", "hello", {"Ref": "AWS::Region"}, "lambdaRole"]]})
        );
        let statements = role["Properties"]["Policies"][0]["PolicyDocument"]["Statement"]
            .as_array()
            .unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[1]["Action"], json!(["s3:GetObject"]));
    }
}
