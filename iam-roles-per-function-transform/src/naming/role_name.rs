//! Per-function role names derived from the shared role's `Fn::Join` name pattern.

use log::{debug, warn};
use serde_json::Value;

use crate::error::{RolesPerFunctionError, RolesPerFunctionResult};

/// IAM limit on role name length
pub const MAX_ROLE_NAME_LENGTH: usize = 64;

/// Trailing literal of the conventional role name, dropped first when a name is too long
pub const DEFAULT_ROLE_SUFFIX: &str = "lambdaRole";

const REGION_REF: &str = "AWS::Region";

/// Position the function id is inserted at: after service and stage
const FUNCTION_PART_INDEX: usize = 2;

/// Length of the name a `Fn::Join` part list produces once deployed.
///
/// `{"Ref": "AWS::Region"}` counts as the configured region. Other references count as the
/// reference name itself, which is what older releases did and what existing stacks rely on.
/// Parts whose deployed value cannot be known count as zero.
pub fn role_name_length(parts: &[Value], region: &str) -> usize {
    let content: usize = parts.iter().map(|part| part_length(part, region)).sum();
    // one separator between each pair of parts
    content + parts.len().saturating_sub(1)
}

fn part_length(part: &Value, region: &str) -> usize {
    match part {
        Value::String(literal) => literal.chars().count(),
        Value::Object(object) => match object.get("Ref").and_then(Value::as_str) {
            Some(REGION_REF) => region.chars().count(),
            Some(reference) => reference.chars().count(),
            None => {
                warn!("Role name part has no predictable length, ignoring it: {part}");
                0
            }
        },
        Value::Number(number) => number.to_string().len(),
        _ => {
            warn!("Role name part has no predictable length, ignoring it: {part}");
            0
        }
    }
}

/// Build the role name for `function_id` from the shared role's name pattern.
///
/// The function id becomes the third part of the join. If the result is longer than
/// [`MAX_ROLE_NAME_LENGTH`] and ends with [`DEFAULT_ROLE_SUFFIX`], the suffix is dropped;
/// if it is still too long the caller has to provide an explicit name.
pub fn resolve_role_name(
    pattern: &Value,
    function_id: &str,
    region: &str,
) -> RolesPerFunctionResult<Value> {
    let mut role_name = pattern.clone();
    let parts = join_parts_mut(&mut role_name).ok_or_else(|| {
        RolesPerFunctionError::shape(format!(
            "Global Role Name is not in expected format. Got name: {pattern}"
        ))
    })?;

    parts.insert(FUNCTION_PART_INDEX, Value::String(function_id.to_string()));

    if role_name_length(parts, region) > MAX_ROLE_NAME_LENGTH
        && parts.last().and_then(Value::as_str) == Some(DEFAULT_ROLE_SUFFIX)
    {
        debug!("Role name for function '{function_id}' is too long, dropping '{DEFAULT_ROLE_SUFFIX}'");
        parts.pop();
    }

    let length = role_name_length(parts, region);
    if length > MAX_ROLE_NAME_LENGTH {
        return Err(RolesPerFunctionError::RoleNameTooLong {
            function: function_id.to_string(),
        });
    }

    debug!("Role name for function '{function_id}' resolves to {length} characters");
    Ok(role_name)
}

/// The part list of a well-formed `{"Fn::Join": [separator, [part, part, ...]]}`
fn join_parts_mut(pattern: &mut Value) -> Option<&mut Vec<Value>> {
    let join = pattern.get_mut("Fn::Join")?.as_array_mut()?;
    if join.len() != 2 {
        return None;
    }
    let parts = join.get_mut(1)?.as_array_mut()?;
    (parts.len() >= 2).then_some(parts)
}
