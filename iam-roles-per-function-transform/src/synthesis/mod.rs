//! Permission synthesis (deterministic statement and managed policy generation)

pub mod permissions;
pub mod statement_builder;

pub use permissions::{
    network_access_policy, synthesize_permissions, validate_function, FunctionPermissions,
};
pub use statement_builder::{
    error_destination_statement, event_source_statements, log_statement, validate_statements,
};
