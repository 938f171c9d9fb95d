//! Configuration model: what the host materialized from the service definition

pub mod function;
pub mod service;
pub mod snapshot;

pub use function::{EventDeclaration, EventSource, FunctionConfig, FunctionIamProperties, SourceRef};
pub use service::{
    DeclaredRole, PluginSettings, ProviderConfig, ProviderIam, ProviderRole, ServiceDefinition,
    LEGACY_PLUGIN_CONFIG_KEY, PLUGIN_CONFIG_KEY,
};
pub use snapshot::ProcessIamSnapshot;
