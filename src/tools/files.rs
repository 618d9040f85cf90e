//! Local file tools: paged reads and text/binary writes.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use super::{
    parse_args, resolve_path, Invoke, Tool, ToolArgs, ToolError, ToolProvider, ToolRegistry,
};

const DEFAULT_MAX_BYTES: u64 = 1_000_000;
const HEX_PREFIX_LIMIT: usize = 1024;

/// Registers [`ReadLocalFile`] and [`WriteLocalFile`].
pub struct FileTools {
    root: PathBuf,
}

impl FileTools {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl ToolProvider for FileTools {
    fn name(&self) -> &str {
        "files"
    }

    fn register(&self, registry: &mut ToolRegistry) {
        registry.register_tool(ReadLocalFile {
            root: self.root.clone(),
        });
        registry.register_tool(WriteLocalFile {
            root: self.root.clone(),
        });
    }
}

fn default_true() -> bool {
    true
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_BYTES
}

fn is_utf8(encoding: &str) -> bool {
    matches!(encoding.to_lowercase().as_str(), "utf-8" | "utf8")
}

/// Read a local file, optionally a byte window of it.
pub struct ReadLocalFile {
    root: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReadArgs {
    path: String,
    #[serde(default = "default_true")]
    as_text: bool,
    #[serde(default = "default_encoding")]
    encoding: String,
    #[serde(default)]
    start: u64,
    #[serde(default = "default_max_bytes")]
    max_bytes: u64,
}

#[async_trait]
impl Invoke for ReadLocalFile {
    async fn invoke(&self, args: &ToolArgs) -> Result<String, ToolError> {
        let args: ReadArgs = parse_args(args)?;
        let path = resolve_path(&self.root, &args.path);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(_) => return Ok(format!("[error] file not found: {}", args.path)),
        };
        if !metadata.is_file() {
            return Ok(format!("[error] not a regular file: {}", args.path));
        }
        if args.as_text && !is_utf8(&args.encoding) {
            return Ok(format!("[error] unsupported encoding: {}", args.encoding));
        }

        let mut file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", path.display(), e))?;
        file.seek(SeekFrom::Start(args.start))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to seek {}: {}", path.display(), e))?;
        let mut data = Vec::new();
        file.take(args.max_bytes)
            .read_to_end(&mut data)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;

        if args.as_text {
            let text = String::from_utf8_lossy(&data);
            Ok(format!(
                "[read ok][text] path={} offset={} bytes={}\n\
                 -------- content (up to {} bytes) --------\n{}",
                path.display(),
                args.start,
                data.len(),
                args.max_bytes,
                text
            ))
        } else {
            let mut hex_prefix = hex::encode(&data);
            if hex_prefix.len() > HEX_PREFIX_LIMIT {
                hex_prefix.truncate(HEX_PREFIX_LIMIT);
                hex_prefix.push_str("...");
            }
            Ok(format!(
                "[read ok][binary] path={} offset={} bytes={}\n\
                 hex prefix (truncated to {} chars): {}",
                path.display(),
                args.start,
                data.len(),
                HEX_PREFIX_LIMIT,
                hex_prefix
            ))
        }
    }
}

impl Tool for ReadLocalFile {
    fn name(&self) -> &str {
        "read_local_file"
    }

    fn description(&self) -> &str {
        "Read a local file (text or binary, with offset + length paging)"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path of the file to read"},
                "as_text": {"type": "boolean", "default": true},
                "encoding": {"type": "string", "default": "utf-8"},
                "start": {"type": "integer", "default": 0},
                "max_bytes": {"type": "integer", "default": DEFAULT_MAX_BYTES}
            },
            "required": ["path"]
        })
    }
}

/// Write or append to a local file, creating parent directories.
pub struct WriteLocalFile {
    root: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WriteArgs {
    path: String,
    content: String,
    #[serde(default = "default_true")]
    as_text: bool,
    #[serde(default = "default_encoding")]
    encoding: String,
    #[serde(default = "default_true")]
    binary_is_base64: bool,
    #[serde(default = "default_true")]
    exist_ok: bool,
    #[serde(default)]
    append: bool,
}

#[async_trait]
impl Invoke for WriteLocalFile {
    async fn invoke(&self, args: &ToolArgs) -> Result<String, ToolError> {
        let args: WriteArgs = parse_args(args)?;
        let path = resolve_path(&self.root, &args.path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create {}: {}", parent.display(), e))?;
        }

        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to check {}: {}", path.display(), e))?;
        if exists && !args.exist_ok && !args.append {
            return Ok(format!(
                "[error] target exists and exist_ok=false: {}",
                args.path
            ));
        }

        let (data, kind, unit, count) = if args.as_text {
            if !is_utf8(&args.encoding) {
                return Ok(format!("[error] unsupported encoding: {}", args.encoding));
            }
            let chars = args.content.chars().count();
            (args.content.into_bytes(), "text", "chars", chars)
        } else {
            let bytes = if args.binary_is_base64 {
                match base64::engine::general_purpose::STANDARD.decode(args.content.trim()) {
                    Ok(bytes) => bytes,
                    Err(e) => return Ok(format!("[error] base64 decode failed: {}", e)),
                }
            } else {
                // latin-1: keep code points that fit in a byte, drop the rest
                args.content
                    .chars()
                    .filter_map(|c| u8::try_from(u32::from(c)).ok())
                    .collect()
            };
            let len = bytes.len();
            (bytes, "binary", "bytes", len)
        };

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(args.append)
            .truncate(!args.append)
            .open(&path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", path.display(), e))?;
        file.write_all(&data)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e))?;
        file.flush().await.map_err(anyhow::Error::from)?;

        Ok(format!(
            "[write ok][{}] path={} {}={} append={}",
            kind,
            path.display(),
            unit,
            count,
            args.append
        ))
    }
}

impl Tool for WriteLocalFile {
    fn name(&self) -> &str {
        "write_local_file"
    }

    fn description(&self) -> &str {
        "Write a local file (text or binary, base64 input, overwrite or append)"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path of the file to write"},
                "content": {"type": "string", "description": "Text, or base64 for binary content"},
                "as_text": {"type": "boolean", "default": true},
                "encoding": {"type": "string", "default": "utf-8"},
                "binary_is_base64": {"type": "boolean", "default": true},
                "exist_ok": {"type": "boolean", "default": true},
                "append": {"type": "boolean", "default": false}
            },
            "required": ["path", "content"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> ToolArgs {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn write_then_read_text_window() {
        let dir = tempfile::tempdir().unwrap();
        let writer = WriteLocalFile {
            root: dir.path().to_path_buf(),
        };
        let reader = ReadLocalFile {
            root: dir.path().to_path_buf(),
        };

        let out = writer
            .invoke(&args(json!({"path": "notes/hello.txt", "content": "hello world"})))
            .await
            .unwrap();
        assert!(out.starts_with("[write ok][text]"));
        assert!(out.contains("chars=11"));

        let out = reader
            .invoke(&args(json!({"path": "notes/hello.txt", "start": 6, "max_bytes": 3})))
            .await
            .unwrap();
        assert!(out.contains("offset=6 bytes=3"));
        assert!(out.ends_with("wor"));
    }

    #[tokio::test]
    async fn append_extends_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = WriteLocalFile {
            root: dir.path().to_path_buf(),
        };
        writer
            .invoke(&args(json!({"path": "log.txt", "content": "a"})))
            .await
            .unwrap();
        writer
            .invoke(&args(json!({"path": "log.txt", "content": "b", "append": true})))
            .await
            .unwrap();

        let on_disk = std::fs::read_to_string(dir.path().join("log.txt")).unwrap();
        assert_eq!(on_disk, "ab");
    }

    #[tokio::test]
    async fn exist_ok_false_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("keep.txt"), "untouched").unwrap();
        let writer = WriteLocalFile {
            root: dir.path().to_path_buf(),
        };

        let out = writer
            .invoke(&args(json!({"path": "keep.txt", "content": "x", "exist_ok": false})))
            .await
            .unwrap();
        assert!(out.starts_with("[error] target exists"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("keep.txt")).unwrap(),
            "untouched"
        );
    }

    #[tokio::test]
    async fn failed_existence_check_is_a_runtime_error() {
        let dir = tempfile::tempdir().unwrap();
        let writer = WriteLocalFile {
            root: dir.path().to_path_buf(),
        };
        // longer than any filesystem allows for a single component
        let name = "a".repeat(300);

        let err = writer
            .invoke(&args(json!({"path": name, "content": "x", "exist_ok": false})))
            .await
            .unwrap_err();
        match err {
            ToolError::Runtime(e) => assert!(e.to_string().starts_with("Failed to check")),
            other => panic!("expected a runtime error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn binary_write_decodes_base64_and_reads_back_as_hex() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let writer = WriteLocalFile { root: root.clone() };
        let reader = ReadLocalFile { root };

        let out = writer
            .invoke(&args(json!({"path": "blob.bin", "content": "AAEC/w==", "as_text": false})))
            .await
            .unwrap();
        assert!(out.contains("bytes=4"));

        let out = reader
            .invoke(&args(json!({"path": "blob.bin", "as_text": false})))
            .await
            .unwrap();
        assert!(out.ends_with("000102ff"));
    }

    #[tokio::test]
    async fn invalid_base64_is_reported_in_text() {
        let dir = tempfile::tempdir().unwrap();
        let writer = WriteLocalFile {
            root: dir.path().to_path_buf(),
        };
        let out = writer
            .invoke(&args(json!({"path": "x.bin", "content": "!!", "as_text": false})))
            .await
            .unwrap();
        assert!(out.starts_with("[error] base64 decode failed"));
    }

    #[tokio::test]
    async fn missing_file_and_directory_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let reader = ReadLocalFile {
            root: dir.path().to_path_buf(),
        };

        let out = reader
            .invoke(&args(json!({"path": "nope.txt"})))
            .await
            .unwrap();
        assert_eq!(out, "[error] file not found: nope.txt");

        let out = reader.invoke(&args(json!({"path": "."}))).await.unwrap();
        assert_eq!(out, "[error] not a regular file: .");
    }

    #[tokio::test]
    async fn missing_content_is_a_parameter_error() {
        let dir = tempfile::tempdir().unwrap();
        let writer = WriteLocalFile {
            root: dir.path().to_path_buf(),
        };
        let err = writer
            .invoke(&args(json!({"path": "a.txt"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
