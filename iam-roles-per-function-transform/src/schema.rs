//! JSON Schema of the configuration keys this extension adds to the service definition.
//!
//! Hosts register these so the function-level and `custom` keys are accepted by their own
//! configuration validation.

use schemars::schema_for;
use serde_json::{json, Value};

use crate::config::{FunctionIamProperties, PluginSettings};

/// Schemas for the function-level keys and for the extension's `custom` block.
pub fn configuration_schema() -> Value {
    json!({
        "function": schema_for!(FunctionIamProperties).to_value(),
        "custom": schema_for!(PluginSettings).to_value()
    })
}
