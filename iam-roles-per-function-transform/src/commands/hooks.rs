//! Host lifecycle integration.

use std::fmt;

use log::debug;

use super::service::RolesPerFunctionService;
use crate::error::RolesPerFunctionResult;
use crate::template::Template;

/// Lifecycle events this extension subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleHook {
    /// After the template is compiled, before it is written out
    BeforePackageFinalize,
}

impl LifecycleHook {
    pub const ALL: [LifecycleHook; 1] = [LifecycleHook::BeforePackageFinalize];

    pub fn name(self) -> &'static str {
        match self {
            LifecycleHook::BeforePackageFinalize => "before:package:finalize",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|hook| hook.name() == name)
    }
}

impl fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl RolesPerFunctionService<'_> {
    /// Lifecycle events the host should invoke [`Self::run_hook`] for
    pub fn hooks(&self) -> &'static [LifecycleHook] {
        &LifecycleHook::ALL
    }

    /// Handle a lifecycle event against the compiled template.
    ///
    /// # Errors
    ///
    /// Propagates any failure of [`Self::create_roles_per_function`].
    pub fn run_hook(
        &self,
        hook: LifecycleHook,
        template: &mut Template,
    ) -> RolesPerFunctionResult<()> {
        debug!("Running lifecycle hook '{hook}'");
        match hook {
            LifecycleHook::BeforePackageFinalize => {
                self.create_roles_per_function(template)?;
            }
        }
        Ok(())
    }
}
