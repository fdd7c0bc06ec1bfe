//! Automation functions runnable through the task executor.
//!
//! Functions describe their parameters with a JSON-schema object and are
//! looked up by name from a [`FunctionRegistry`].

mod plan;
mod registry;

pub use plan::CreatePlanFunction;
pub use registry::FunctionRegistry;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{A2aError, Result};

/// Keyword parameters passed to a function.
pub type FunctionParams = Map<String, Value>;

#[async_trait]
pub trait AutomationFunction: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON-schema object describing the accepted parameters.
    fn schema(&self) -> Value;

    async fn execute(&self, params: FunctionParams) -> Result<Value>;

    /// Reject missing required fields and null values.
    ///
    /// A null is accepted only for properties the schema marks `"nullable": true`,
    /// or for keys the schema does not declare at all.
    fn validate_inputs(&self, params: &FunctionParams) -> Result<()> {
        let schema = self.schema();
        let properties = schema.get("properties").and_then(Value::as_object);
        let required = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect::<Vec<_>>())
            .unwrap_or_default();

        for field in required {
            if params.get(field).is_none_or(Value::is_null) {
                return Err(A2aError::InvalidParameters(format!(
                    "Parameter '{field}' is required and cannot be null"
                )));
            }
        }

        for (field, value) in params {
            if !value.is_null() {
                continue;
            }
            let Some(property) = properties.and_then(|p| p.get(field)) else {
                continue;
            };
            if property.get("nullable").and_then(Value::as_bool) == Some(true) {
                continue;
            }
            return Err(A2aError::InvalidParameters(format!(
                "Parameter '{field}' cannot be null"
            )));
        }

        Ok(())
    }
}
