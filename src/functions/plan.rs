use async_trait::async_trait;
use serde_json::{Value, json};

use super::{AutomationFunction, FunctionParams};
use crate::error::Result;

/// Placeholder function the agent layer uses to express multi-step plans.
///
/// It executes nothing; the plan steps are echoed back so the caller can
/// submit each step as its own unit of work.
#[derive(Debug, Default)]
pub struct CreatePlanFunction;

#[async_trait]
impl AutomationFunction for CreatePlanFunction {
    fn name(&self) -> &str {
        "create_plan"
    }

    fn description(&self) -> &str {
        "Creates a plan of steps to execute to fulfill the user's request. \
         Use this when multiple steps are required."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "steps": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "function_name": {"type": "string"},
                            "arguments": {"type": "object"},
                        },
                        "required": ["function_name", "arguments"],
                    },
                },
            },
            "required": ["steps"],
        })
    }

    async fn execute(&self, params: FunctionParams) -> Result<Value> {
        let steps = params
            .get("steps")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        Ok(json!({"status": "plan created", "steps": steps}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echoes_steps() {
        let steps = json!([{"function_name": "deploy_to", "arguments": {"cluster": "c1"}}]);
        let mut params = FunctionParams::new();
        params.insert("steps".into(), steps.clone());

        let result = CreatePlanFunction.execute(params).await.unwrap();
        assert_eq!(result["status"], "plan created");
        assert_eq!(result["steps"], steps);
    }

    #[tokio::test]
    async fn test_missing_steps_yields_empty_plan() {
        let result = CreatePlanFunction
            .execute(FunctionParams::new())
            .await
            .unwrap();
        assert_eq!(result["steps"], json!([]));
    }
}
