//! Tools the agent can invoke.
//!
//! Tools are grouped into providers. The host hands a list of providers to the
//! agent, and each provider registers its capabilities into a [`ToolRegistry`].

mod calculator;
mod files;
mod registry;
mod search;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub use calculator::{Calculator, CalculatorTools};
pub use files::{FileTools, ReadLocalFile, WriteLocalFile};
pub use registry::{Capability, ToolRegistry};
pub use search::{FsSearch, SearchTools};

/// Arguments passed to a tool: the JSON object from the `Args:` line.
pub type ToolArgs = serde_json::Map<String, Value>;

/// Failure while invoking a tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments were missing, unknown, or of the wrong type.
    #[error("{0}")]
    InvalidArguments(String),

    /// Anything else that went wrong while running the tool.
    #[error("{0}")]
    Runtime(#[from] anyhow::Error),
}

/// The callable half of a capability.
#[async_trait]
pub trait Invoke: Send + Sync {
    async fn invoke(&self, args: &ToolArgs) -> Result<String, ToolError>;
}

/// A self-describing tool that can register itself with [`ToolRegistry::register_tool`].
pub trait Tool: Invoke {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the expected arguments, shown to the model verbatim.
    fn parameters_schema(&self) -> Value;
}

/// A source of capabilities.
pub trait ToolProvider: Send + Sync {
    /// Providers whose name starts with `_` are skipped.
    fn name(&self) -> &str;

    fn register(&self, registry: &mut ToolRegistry);
}

/// Wraps a synchronous closure as an [`Invoke`].
pub struct FnInvoke<F>(F);

/// Adapt a closure into a callable capability.
pub fn invoke_fn<F>(f: F) -> Arc<dyn Invoke>
where
    F: Fn(&ToolArgs) -> Result<String, ToolError> + Send + Sync + 'static,
{
    Arc::new(FnInvoke(f))
}

#[async_trait]
impl<F> Invoke for FnInvoke<F>
where
    F: Fn(&ToolArgs) -> Result<String, ToolError> + Send + Sync,
{
    async fn invoke(&self, args: &ToolArgs) -> Result<String, ToolError> {
        (self.0)(args)
    }
}

/// Destructure tool arguments into a typed struct.
///
/// Missing, unknown or mistyped fields become [`ToolError::InvalidArguments`].
pub fn parse_args<T: DeserializeOwned>(args: &ToolArgs) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(args.clone()))
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// All tools shipped with the crate, rooted at `workspace`.
pub fn builtin_providers(workspace: &Path) -> Vec<Box<dyn ToolProvider>> {
    vec![
        Box::new(CalculatorTools),
        Box::new(FileTools::new(workspace)),
        Box::new(SearchTools::new(workspace)),
    ]
}

/// Resolve a tool-supplied path against the workspace root.
fn resolve_path(root: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Sample {
        path: String,
        #[serde(default)]
        append: bool,
    }

    fn args(value: Value) -> ToolArgs {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn parse_args_accepts_defaults() {
        let parsed: Sample = parse_args(&args(json!({"path": "a.txt"}))).unwrap();
        assert_eq!(parsed.path, "a.txt");
        assert!(!parsed.append);
    }

    #[test]
    fn parse_args_rejects_missing_field() {
        let err = parse_args::<Sample>(&args(json!({"append": true}))).unwrap_err();
        match err {
            ToolError::InvalidArguments(msg) => assert!(msg.contains("path")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_args_rejects_unknown_field() {
        let err = parse_args::<Sample>(&args(json!({"path": "a", "mode": "w"}))).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn closures_can_be_invoked() {
        let echo = invoke_fn(|args| Ok(format!("{} keys", args.len())));
        let out = echo.invoke(&args(json!({"a": 1, "b": 2}))).await.unwrap();
        assert_eq!(out, "2 keys");
    }

    #[test]
    fn relative_paths_join_workspace() {
        let root = Path::new("/work");
        assert_eq!(resolve_path(root, "notes/a.txt"), PathBuf::from("/work/notes/a.txt"));
        assert_eq!(resolve_path(root, "/tmp/b.txt"), PathBuf::from("/tmp/b.txt"));
    }

    #[test]
    fn builtin_catalog_has_every_tool() {
        let registry = ToolRegistry::from_providers(&builtin_providers(Path::new(".")));
        assert_eq!(
            registry.names(),
            vec!["calculator", "read_local_file", "write_local_file", "fs_search"]
        );
    }
}
