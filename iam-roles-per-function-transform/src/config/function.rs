//! Per-function declarations: IAM keys and event sources.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::Statement;

/// A function as declared in the service definition.
///
/// Only the keys relevant to role synthesis are modelled; everything else the host knows
/// about a function (handler, runtime, ...) is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionConfig {
    /// Deployed function name, used for the log group
    pub name: Option<String>,
    /// Externally supplied role; excludes `iamRoleStatements`
    pub role: Option<Value>,
    pub vpc: Option<Value>,
    /// Error destination (SNS topic) receiving failed async invocations
    pub on_error: Option<Value>,
    events: Option<Vec<EventDeclaration>>,
    #[serde(flatten)]
    pub iam: FunctionIamProperties,
}

impl FunctionConfig {
    pub fn events(&self) -> &[EventDeclaration] {
        self.events.as_deref().unwrap_or_default()
    }

    /// A function opts into its own role by declaring `iamRoleStatements`, even as an empty list.
    pub fn declares_role_statements(&self) -> bool {
        self.iam.iam_role_statements.is_some()
    }
}

/// Function-level configuration keys recognized by this extension.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunctionIamProperties {
    /// Statements granted to this function's own role
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iam_role_statements: Option<Vec<Statement>>,
    /// Also grant the provider-level statements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iam_role_statements_inherit: Option<bool>,
    /// Explicit role name, bypasses name generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iam_role_statements_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iam_permissions_boundary: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iam_managed_policies: Option<Vec<Value>>,
    /// Also attach the provider-level managed policies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iam_managed_policies_inherit: Option<bool>,
}

/// One entry of a function's `events` list.
#[derive(Debug, Clone, Deserialize)]
pub struct EventDeclaration {
    stream: Option<SourceRef>,
    sqs: Option<SourceRef>,
    #[serde(flatten)]
    other: Map<String, Value>,
}

/// Classification of an event declaration by the permissions it implies
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventSource<'a> {
    Stream(&'a SourceRef),
    Queue(&'a SourceRef),
    Other,
}

impl EventDeclaration {
    pub fn source(&self) -> EventSource<'_> {
        if let Some(stream) = &self.stream {
            EventSource::Stream(stream)
        } else if let Some(queue) = &self.sqs {
            EventSource::Queue(queue)
        } else {
            EventSource::Other
        }
    }

    /// Event type keys other than `stream` and `sqs` (`http`, `schedule`, ...)
    pub fn other_kinds(&self) -> impl Iterator<Item = &str> {
        self.other.keys().map(String::as_str)
    }
}

/// Reference to the resource backing an event source.
///
/// Either a bare ARN string, or an object that carries the ARN under `arn` (possibly with a
/// `type`), or an intrinsic function object that resolves to the ARN.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SourceRef {
    Arn(String),
    Object(Map<String, Value>),
}

impl SourceRef {
    /// The backing resource identifier
    pub fn arn(&self) -> Value {
        match self {
            Self::Arn(arn) => Value::String(arn.clone()),
            Self::Object(object) => match object.get("arn") {
                Some(arn) if !arn.is_null() => arn.clone(),
                _ => Value::Object(object.clone()),
            },
        }
    }

    /// The explicit `type` tag of an object declaration
    pub fn declared_type(&self) -> Option<&str> {
        match self {
            Self::Arn(_) => None,
            Self::Object(object) => object.get("type").and_then(Value::as_str),
        }
    }
}
