use serde_json::Value;

use crate::error::{A2aError, Result};
use crate::functions::FunctionParams;

/// Merge `--params` JSON with `-P key=value` pairs. Pairs win on conflict.
///
/// Pair values are parsed as JSON and fall back to a plain string.
pub fn parse_params(json: Option<&str>, pairs: &[String]) -> Result<FunctionParams> {
    let mut params = match json {
        Some(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(A2aError::InvalidParameters(
                    "--params must be a JSON object".into(),
                ));
            }
            Err(e) => {
                return Err(A2aError::InvalidParameters(format!(
                    "Invalid JSON parameters: {e}"
                )));
            }
        },
        None => FunctionParams::new(),
    };

    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(A2aError::InvalidParameters(format!(
                "Invalid parameter format '{pair}'. Use key=value"
            )));
        };
        let value =
            serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        params.insert(key.to_string(), value);
    }

    Ok(params)
}
