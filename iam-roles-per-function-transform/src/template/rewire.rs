//! Pointing function resources and event source mappings at their new roles.

use std::collections::BTreeMap;

use log::{debug, info};
use serde_json::Value;

use super::{Template, EVENT_SOURCE_MAPPING_TYPE};
use crate::error::{RolesPerFunctionError, RolesPerFunctionResult};

/// Function resource logical id → logical id of the role now backing it
pub type RoleAssignments = BTreeMap<String, String>;

/// Switch a compiled function resource from the shared role to `role_id`.
///
/// `DependsOn` becomes `role_id` followed by the previous dependencies minus the shared role,
/// and the first element of `Properties.Role["Fn::GetAtt"]` is replaced.
pub fn rewire_function_resource(
    template: &mut Template,
    function_id: &str,
    function_resource_id: &str,
    role_id: &str,
    global_role_id: &str,
) -> RolesPerFunctionResult<()> {
    let shape_error = || {
        RolesPerFunctionError::shape(format!(
            "Function Resource is not in expected format. For function name: {function_id}"
        ))
    };

    let resource = template
        .resource_mut(function_resource_id)
        .and_then(Value::as_object_mut)
        .filter(|resource| !resource.is_empty())
        .ok_or_else(shape_error)?;

    let depends_on = match resource.get("DependsOn") {
        Some(Value::Array(existing)) => std::iter::once(Value::from(role_id))
            .chain(
                existing
                    .iter()
                    .filter(|dependency| dependency.as_str() != Some(global_role_id))
                    .cloned(),
            )
            .collect::<Vec<_>>(),
        _ => return Err(shape_error()),
    };

    let get_att = resource
        .get_mut("Properties")
        .and_then(Value::as_object_mut)
        .filter(|properties| !properties.is_empty())
        .and_then(|properties| properties.get_mut("Role"))
        .and_then(|role| role.get_mut("Fn::GetAtt"))
        .and_then(Value::as_array_mut)
        .ok_or_else(shape_error)?;
    match get_att.first_mut() {
        Some(target) => *target = Value::from(role_id),
        None => get_att.push(Value::from(role_id)),
    }

    resource.insert("DependsOn".to_string(), Value::Array(depends_on));
    debug!("Function resource '{function_resource_id}' now uses role '{role_id}'");
    Ok(())
}

/// Make every event source mapping depend on the role of the function it triggers.
///
/// Mappings for functions without their own role are left alone. The dependency is
/// overwritten, not merged. Returns the number of mappings updated.
pub fn rewire_event_source_mappings(
    template: &mut Template,
    assignments: &RoleAssignments,
) -> usize {
    let mut updated = 0;
    for (mapping_id, mapping) in template.resources_of_type_mut(EVENT_SOURCE_MAPPING_TYPE) {
        let target = mapping
            .pointer("/Properties/FunctionName/Fn::GetAtt/0")
            .and_then(Value::as_str);
        let Some(role_id) = target.and_then(|target| assignments.get(target)) else {
            continue;
        };
        info!("Event source mapping '{mapping_id}' now depends on '{role_id}'");
        if let Some(mapping) = mapping.as_object_mut() {
            mapping.insert("DependsOn".to_string(), Value::from(role_id.as_str()));
            updated += 1;
        }
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template() -> Template {
        Template::from_value(json!({
            "Resources": {
                "HelloLambdaFunction": {
                    "Type": "AWS::Lambda::Function",
                    "Properties": {
                        "Handler": "handler.hello",
                        "Role": {"Fn::GetAtt": ["IamRoleLambdaExecution", "Arn"]}
                    },
                    "DependsOn": ["HelloLogGroup", "IamRoleLambdaExecution"]
                },
                "HelloEventSourceMappingSQSMyQueue": {
                    "Type": "AWS::Lambda::EventSourceMapping",
                    "DependsOn": ["IamRoleLambdaExecution"],
                    "Properties": {
                        "FunctionName": {"Fn::GetAtt": ["HelloLambdaFunction", "Arn"]}
                    }
                },
                "OtherEventSourceMappingSQSMyQueue": {
                    "Type": "AWS::Lambda::EventSourceMapping",
                    "DependsOn": "IamRoleLambdaExecution",
                    "Properties": {
                        "FunctionName": {"Fn::GetAtt": ["OtherLambdaFunction", "Arn"]}
                    }
                },
                "ImportedEventSourceMapping": {
                    "Type": "AWS::Lambda::EventSourceMapping",
                    "Properties": {"FunctionName": "imported-function"}
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_rewire_function_resource() {
        let mut template = template();
        rewire_function_resource(
            &mut template,
            "hello",
            "HelloLambdaFunction",
            "HelloIamRoleLambdaExecution",
            "IamRoleLambdaExecution",
        )
        .unwrap();

        let function = template.resource("HelloLambdaFunction").unwrap();
        assert_eq!(
            function["DependsOn"],
            json!(["HelloIamRoleLambdaExecution", "HelloLogGroup"])
        );
        assert_eq!(
            function["Properties"]["Role"],
            json!({"Fn::GetAtt": ["HelloIamRoleLambdaExecution", "Arn"]})
        );
    }

    #[test]
    fn test_rewire_function_resource_rejects_unexpected_shape() {
        let mut template = Template::from_value(json!({
            "Resources": {
                "HelloLambdaFunction": {
                    "Type": "AWS::Lambda::Function",
                    "Properties": {"Role": "arn:aws:iam::123456789012:role/external"},
                    "DependsOn": []
                },
                "NoDependsLambdaFunction": {
                    "Type": "AWS::Lambda::Function",
                    "Properties": {"Role": {"Fn::GetAtt": ["IamRoleLambdaExecution", "Arn"]}}
                }
            }
        }))
        .unwrap();

        for (function_id, resource_id) in [
            ("hello", "HelloLambdaFunction"),
            ("noDepends", "NoDependsLambdaFunction"),
            ("missing", "MissingLambdaFunction"),
        ] {
            let err = rewire_function_resource(
                &mut template,
                function_id,
                resource_id,
                "NewRole",
                "IamRoleLambdaExecution",
            )
            .unwrap_err();
            assert!(
                err.to_string()
                    .ends_with(&format!("For function name: {function_id}")),
                "unexpected error: {}",
                err
            );
        }
    }

    #[test]
    fn test_rewire_event_source_mappings_only_touches_assigned_functions() {
        let mut template = template();
        let assignments = RoleAssignments::from([(
            "HelloLambdaFunction".to_string(),
            "HelloIamRoleLambdaExecution".to_string(),
        )]);

        assert_eq!(rewire_event_source_mappings(&mut template, &assignments), 1);
        assert_eq!(
            template.resource("HelloEventSourceMappingSQSMyQueue").unwrap()["DependsOn"],
            json!("HelloIamRoleLambdaExecution")
        );
        assert_eq!(
            template.resource("OtherEventSourceMappingSQSMyQueue").unwrap()["DependsOn"],
            json!("IamRoleLambdaExecution")
        );
        assert!(template
            .resource("ImportedEventSourceMapping")
            .unwrap()
            .get("DependsOn")
            .is_none());
    }

    #[test]
    fn test_rewire_event_source_mappings_with_no_assignments() {
        let mut template = template();
        let before = template.clone();
        assert_eq!(
            rewire_event_source_mappings(&mut template, &RoleAssignments::new()),
            0
        );
        assert_eq!(template, before);
    }
}
