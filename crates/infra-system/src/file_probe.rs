// File probe processor
// An item names a file; processing checks that it exists, is a regular file and fits
use async_trait::async_trait;
use batchline_core::port::{ItemContext, ItemError, ItemProcessor};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Checks file items on the local filesystem
pub struct FileProbeProcessor {
    root: Option<PathBuf>,
    max_bytes: Option<u64>,
}

impl FileProbeProcessor {
    /// # Arguments
    /// * `root` - Base directory for relative paths (process cwd when `None`)
    /// * `max_bytes` - Reject files larger than this
    pub fn new(root: Option<PathBuf>, max_bytes: Option<u64>) -> Self {
        Self { root, max_bytes }
    }

    /// Accepts `"path/to/file"` or `{"path": "path/to/file"}`
    fn resolve(&self, item: &Value) -> Result<PathBuf, ItemError> {
        let raw = match item {
            Value::String(path) => path.as_str(),
            Value::Object(fields) => fields
                .get("path")
                .and_then(Value::as_str)
                .ok_or_else(|| ItemError::InvalidItem("missing 'path' field".to_string()))?,
            other => {
                return Err(ItemError::InvalidItem(format!(
                    "expected a path string or object, got {}",
                    other
                )))
            }
        };

        let path = Path::new(raw);
        Ok(match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        })
    }
}

#[async_trait]
impl ItemProcessor for FileProbeProcessor {
    async fn process(&self, ctx: ItemContext) -> Result<(), ItemError> {
        let path = self.resolve(&ctx.item)?;

        let metadata = tokio::fs::metadata(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ItemError::Rejected(format!("no such file: {}", path.display())),
            _ => ItemError::Io(format!("{}: {}", path.display(), e)),
        })?;

        if !metadata.is_file() {
            return Err(ItemError::Rejected(format!(
                "not a regular file: {}",
                path.display()
            )));
        }

        if let Some(limit) = self.max_bytes {
            if metadata.len() > limit {
                return Err(ItemError::Rejected(format!(
                    "{} is {} bytes, limit is {}",
                    path.display(),
                    metadata.len(),
                    limit
                )));
            }
        }

        debug!(
            job_id = %ctx.job.job_id,
            index = ctx.index,
            path = %path.display(),
            bytes = metadata.len(),
            "File probed"
        );
        Ok(())
    }
}
