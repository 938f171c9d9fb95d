//! Commands module - service layer running the transformation inside the host lifecycle

mod create_roles;
pub mod hooks;
pub(crate) mod service;

pub use hooks::LifecycleHook;
pub use service::RolesPerFunctionService;
