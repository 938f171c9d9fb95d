//! Error types for the roles-per-function transformation.
//!
//! Every failure is fatal for the build. The host is expected to print the message and
//! discard the template, so each message starts with [`ERROR_MARKER`].

use thiserror::Error;

/// Prefix carried by every error message produced by this crate.
pub const ERROR_MARKER: &str = "iam-roles-per-function: ERROR:";

/// Errors raised while rewriting a template.
#[derive(Debug, Error)]
pub enum RolesPerFunctionError {
    /// A template node the transformation depends on does not have the expected shape.
    /// Usually means the host compiler produced a layout this crate does not understand.
    #[error("iam-roles-per-function: ERROR: {0}")]
    ShapeViolation(String),

    /// A function declares both an external role and its own statements.
    #[error("iam-roles-per-function: ERROR: Defining function with both 'role' and 'iamRoleStatements' is not supported. Function name: {function}")]
    ConflictingRole { function: String },

    /// The generated role name is longer than IAM allows, even without the default suffix.
    #[error("iam-roles-per-function: ERROR: auto generated role name for function: {function} is too long (over 64 chars).\nTry setting a custom role name using the property: iamRoleStatementsName.")]
    RoleNameTooLong { function: String },

    /// A stream event resolved to a stream type we have no permissions for.
    #[error("iam-roles-per-function: ERROR: Unsupported stream type: {stream_type} for function: {function}")]
    UnsupportedStreamType {
        function: String,
        stream_type: String,
    },

    /// One or more declared statements miss required fields.
    #[error("iam-roles-per-function: ERROR: iamRoleStatements should be an array of objects, where each object has Effect, Action / NotAction, Resource / NotResource fields. Specifically, {0}")]
    MalformedStatements(String),

    /// The service definition or template could not be deserialized.
    #[error("iam-roles-per-function: ERROR: Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl RolesPerFunctionError {
    pub fn shape(message: impl Into<String>) -> Self {
        Self::ShapeViolation(message.into())
    }

    pub fn conflicting_role(function: impl Into<String>) -> Self {
        Self::ConflictingRole {
            function: function.into(),
        }
    }

    pub fn unsupported_stream_type(
        function: impl Into<String>,
        stream_type: impl Into<String>,
    ) -> Self {
        Self::UnsupportedStreamType {
            function: function.into(),
            stream_type: stream_type.into(),
        }
    }
}

pub type RolesPerFunctionResult<T> = Result<T, RolesPerFunctionError>;
