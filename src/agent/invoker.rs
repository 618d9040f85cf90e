//! Runs a requested tool and turns every outcome into observation text.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde_json::Value;

use crate::tools::{Capability, ToolArgs, ToolError};

pub const PARAMETER_ERROR_TAG: &str = "[parameter error]";
pub const RUNTIME_ERROR_TAG: &str = "[runtime error]";

/// Invoke `capability` with `arguments`. Never fails: argument problems,
/// tool errors and panics all come back as tagged observation text.
pub async fn invoke_capability(capability: &Capability, arguments: Value) -> String {
    let args: ToolArgs = match arguments {
        Value::Object(map) => map,
        other => {
            let message = format!("arguments must be a JSON object, got {}", other);
            tracing::warn!("Tool {}: {}", capability.name, message);
            return format!("{} {}", PARAMETER_ERROR_TAG, message);
        }
    };

    let call = capability.invoke.invoke(&args);
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(Ok(output)) => output,
        Ok(Err(ToolError::InvalidArguments(message))) => {
            tracing::warn!("Tool {} rejected its arguments: {}", capability.name, message);
            format!("{} {}", PARAMETER_ERROR_TAG, message)
        }
        Ok(Err(ToolError::Runtime(e))) => {
            tracing::warn!("Tool {} failed: {:#}", capability.name, e);
            format!("{} {:#}", RUNTIME_ERROR_TAG, e)
        }
        Err(panic) => {
            let message = panic_message(&*panic);
            tracing::warn!("Tool {} panicked: {}", capability.name, message);
            format!("{} tool panicked: {}", RUNTIME_ERROR_TAG, message)
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::invoke_fn;
    use serde_json::json;

    fn capability(
        f: impl Fn(&ToolArgs) -> Result<String, ToolError> + Send + Sync + 'static,
    ) -> Capability {
        Capability {
            name: "probe".to_string(),
            description: String::new(),
            schema: json!({}),
            invoke: invoke_fn(f),
        }
    }

    #[tokio::test]
    async fn passes_arguments_through() {
        let cap = capability(|args| Ok(args["x"].to_string()));
        assert_eq!(invoke_capability(&cap, json!({"x": 7})).await, "7");
    }

    #[tokio::test]
    async fn argument_errors_are_tagged() {
        let cap = capability(|_| Err(ToolError::InvalidArguments("missing field `x`".into())));
        assert_eq!(
            invoke_capability(&cap, json!({})).await,
            "[parameter error] missing field `x`"
        );
    }

    #[tokio::test]
    async fn runtime_errors_are_tagged() {
        let cap = capability(|_| Err(anyhow::anyhow!("disk on fire").into()));
        assert_eq!(
            invoke_capability(&cap, json!({})).await,
            "[runtime error] disk on fire"
        );
    }

    #[tokio::test]
    async fn non_object_arguments_are_parameter_errors() {
        let cap = capability(|_| Ok("should not run".into()));
        let out = invoke_capability(&cap, json!([1, 2])).await;
        assert!(out.starts_with(PARAMETER_ERROR_TAG));
    }

    #[tokio::test]
    async fn panics_are_contained() {
        let cap = capability(|_| panic!("boom"));
        assert_eq!(
            invoke_capability(&cap, json!({})).await,
            "[runtime error] tool panicked: boom"
        );
    }
}
