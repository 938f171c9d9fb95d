//! The compiled deployment template and typed access to its resources.
//!
//! Resources reference each other by logical id only. Nothing here hands out long-lived
//! references into the resource map; callers look nodes up by id every time.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{RolesPerFunctionError, RolesPerFunctionResult};

pub mod rewire;
pub mod role;

pub use rewire::{rewire_event_source_mappings, rewire_function_resource, RoleAssignments};
pub use role::{materialize_role, role_resource_id, RoleOverrides};

/// Resource type of the mappings that connect streams and queues to functions
pub const EVENT_SOURCE_MAPPING_TYPE: &str = "AWS::Lambda::EventSourceMapping";

const RESOURCES_KEY: &str = "Resources";

/// A CloudFormation template, top-level key order preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template(Map<String, Value>);

impl Template {
    pub fn from_value(value: Value) -> RolesPerFunctionResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(RolesPerFunctionError::shape(format!(
                "Template must be a JSON object, got: {other}"
            ))),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    fn resources(&self) -> Option<&Map<String, Value>> {
        self.0.get(RESOURCES_KEY).and_then(Value::as_object)
    }

    fn resources_mut(&mut self) -> Option<&mut Map<String, Value>> {
        self.0.get_mut(RESOURCES_KEY).and_then(Value::as_object_mut)
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Value> {
        self.resources()?.get(logical_id)
    }

    pub fn resource_mut(&mut self, logical_id: &str) -> Option<&mut Value> {
        self.resources_mut()?.get_mut(logical_id)
    }

    /// Insert or replace a resource, creating the `Resources` section when needed
    pub fn insert_resource(&mut self, logical_id: String, resource: Value) -> Option<Value> {
        let resources = self
            .0
            .entry(RESOURCES_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !resources.is_object() {
            *resources = Value::Object(Map::new());
        }
        resources
            .as_object_mut()
            .and_then(|map| map.insert(logical_id, resource))
    }

    /// Logical ids in template order
    pub fn resource_ids(&self) -> impl Iterator<Item = &str> {
        self.resources()
            .into_iter()
            .flat_map(|resources| resources.keys().map(String::as_str))
    }

    /// Mutable access to every resource of the given `Type`
    pub fn resources_of_type_mut<'a>(
        &'a mut self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a mut Value)> + 'a {
        self.resources_mut()
            .into_iter()
            .flat_map(|resources| resources.iter_mut())
            .filter(move |(_, resource)| {
                resource.get("Type").and_then(Value::as_str) == Some(resource_type)
            })
    }
}
