//! File-name search tool.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use walkdir::WalkDir;

use super::{
    parse_args, resolve_path, Invoke, Tool, ToolArgs, ToolError, ToolProvider, ToolRegistry,
};

/// Registers [`FsSearch`].
pub struct SearchTools {
    root: PathBuf,
}

impl SearchTools {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl ToolProvider for SearchTools {
    fn name(&self) -> &str {
        "search"
    }

    fn register(&self, registry: &mut ToolRegistry) {
        registry.register_tool(FsSearch {
            root: self.root.clone(),
        });
    }
}

/// Recursively find files and directories whose name contains a keyword.
pub struct FsSearch {
    root: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchArgs {
    root: String,
    keyword: String,
    #[serde(default = "default_max_results")]
    max_results: usize,
}

fn default_max_results() -> usize {
    20
}

#[async_trait]
impl Invoke for FsSearch {
    async fn invoke(&self, args: &ToolArgs) -> Result<String, ToolError> {
        let args: SearchArgs = parse_args(args)?;
        let base = resolve_path(&self.root, &args.root);

        if !base.exists() {
            return Ok(format!("[error] root directory does not exist: {}", args.root));
        }

        let keyword = args.keyword.to_lowercase();
        let max_results = args.max_results;
        let matches = tokio::task::spawn_blocking(move || find_by_name(&base, &keyword, max_results))
            .await
            .map_err(|e| anyhow::anyhow!("Search task failed: {}", e))?;

        if matches.is_empty() {
            return Ok("(no matches)".to_string());
        }
        Ok(matches.join("\n"))
    }
}

impl Tool for FsSearch {
    fn name(&self) -> &str {
        "fs_search"
    }

    fn description(&self) -> &str {
        "Search files and folders under a root directory by name keyword (case-insensitive)"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "root": {"type": "string"},
                "keyword": {"type": "string"},
                "max_results": {"type": "integer", "default": 20}
            },
            "required": ["root", "keyword"]
        })
    }
}

/// Paths relative to `base` whose file name contains `keyword` (already lowercased).
fn find_by_name(base: &Path, keyword: &str, max_results: usize) -> Vec<String> {
    if max_results == 0 {
        return Vec::new();
    }

    let mut out = Vec::new();
    for entry in WalkDir::new(base)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if !name.contains(keyword) {
            continue;
        }
        let relative = entry.path().strip_prefix(base).unwrap_or(entry.path());
        out.push(relative.to_string_lossy().to_string());
        if out.len() >= max_results {
            break;
        }
    }
    out
}
