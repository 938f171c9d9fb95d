//! Roles Per Function Service Layer
//!
//! Holds everything the transformation reads but does not own: the service definition, the
//! host's naming conventions and the process-wide IAM snapshot resolved from them.

use crate::config::{ProcessIamSnapshot, ServiceDefinition};
use crate::error::RolesPerFunctionResult;
use crate::naming::NamingConvention;

/// Main service struct for rewriting a compiled template into per-function roles
pub struct RolesPerFunctionService<'a> {
    pub(crate) service: &'a ServiceDefinition,
    pub(crate) naming: &'a dyn NamingConvention,
    pub(crate) snapshot: ProcessIamSnapshot,
}

impl<'a> RolesPerFunctionService<'a> {
    /// Create a service instance, resolving provider-level IAM settings once.
    ///
    /// # Errors
    ///
    /// Returns an error if this extension's custom block cannot be parsed.
    pub fn new(
        service: &'a ServiceDefinition,
        naming: &'a dyn NamingConvention,
    ) -> RolesPerFunctionResult<Self> {
        let snapshot = ProcessIamSnapshot::resolve(service)?;
        Ok(Self {
            service,
            naming,
            snapshot,
        })
    }

    // create_roles_per_function() implementation is in create_roles.rs
    // run_hook() implementation is in hooks.rs
}
