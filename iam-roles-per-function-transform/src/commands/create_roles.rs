//! Per-function role creation and the event source mapping fixup pass.

use log::{debug, info};
use serde_json::Value;

use super::service::RolesPerFunctionService;
use crate::error::{RolesPerFunctionError, RolesPerFunctionResult};
use crate::naming::resolve_role_name;
use crate::synthesis::{synthesize_permissions, validate_function};
use crate::template::{
    materialize_role, rewire_event_source_mappings, rewire_function_resource, role_resource_id,
    RoleAssignments, RoleOverrides, Template,
};
use crate::types::is_empty_value;

impl RolesPerFunctionService<'_> {
    /// Give every function that declares `iamRoleStatements` its own role.
    ///
    /// Functions are processed in declaration order. The first failure aborts the run;
    /// functions handled before it keep their modifications, so a failed template must be
    /// discarded by the caller. Once all functions are done, event source mappings are pointed
    /// at the role of the function they trigger.
    ///
    /// # Errors
    ///
    /// Returns the first configuration or template-shape error encountered.
    pub fn create_roles_per_function(
        &self,
        template: &mut Template,
    ) -> RolesPerFunctionResult<RoleAssignments> {
        let mut assignments = RoleAssignments::new();
        for function_id in self.service.all_function_ids() {
            if let Some((function_resource_id, role_id)) =
                self.create_role_for_function(function_id, template)?
            {
                assignments.insert(function_resource_id, role_id);
            }
        }

        let updated = rewire_event_source_mappings(template, &assignments);
        info!(
            "Created {} per-function role(s), updated {updated} event source mapping(s)",
            assignments.len()
        );
        Ok(assignments)
    }

    /// Returns the function resource id and its new role id, or `None` when the function
    /// keeps the shared role.
    fn create_role_for_function(
        &self,
        function_id: &str,
        template: &mut Template,
    ) -> RolesPerFunctionResult<Option<(String, String)>> {
        let Some(function) = self
            .service
            .function(function_id)
            .filter(|function| function.declares_role_statements())
        else {
            debug!("Function '{function_id}' keeps the shared execution role");
            return Ok(None);
        };

        validate_function(function_id, function)?;

        let log_group = self
            .naming
            .log_group_name(&self.service.deployed_function_name(function_id));
        let permissions = synthesize_permissions(function_id, function, &self.snapshot, &log_group)?;

        let global_role_id = self.naming.global_role_resource_id();
        let global_role = template.resource(&global_role_id).ok_or_else(|| {
            RolesPerFunctionError::shape(format!(
                "Global IAM role resource '{global_role_id}' not found in template"
            ))
        })?;

        let role_name = match function
            .iam
            .iam_role_statements_name
            .as_deref()
            .filter(|name| !name.is_empty())
        {
            Some(name) => Value::from(name),
            None => resolve_role_name(
                &self.naming.global_role_name_pattern(),
                function_id,
                &self.snapshot.region,
            )?,
        };
        let permissions_boundary = function
            .iam
            .iam_permissions_boundary
            .clone()
            .filter(|boundary| !is_empty_value(Some(boundary)))
            .or_else(|| self.snapshot.permissions_boundary.clone());

        let role = materialize_role(
            global_role,
            &permissions,
            RoleOverrides {
                role_name,
                permissions_boundary,
            },
        )?;

        let role_id = role_resource_id(
            &self.naming.normalized_function_id(function_id),
            &global_role_id,
        );
        let function_resource_id = self.naming.compute_resource_id(function_id);
        template.insert_resource(role_id.clone(), role);
        rewire_function_resource(
            template,
            function_id,
            &function_resource_id,
            &role_id,
            &global_role_id,
        )?;

        info!(
            "Function '{function_id}' now uses role '{role_id}' with {} statement(s)",
            permissions.statements.len()
        );
        Ok(Some((function_resource_id, role_id)))
    }
}
