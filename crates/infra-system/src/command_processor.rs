// Subprocess item processor
// One child process per item, with environment allowlisting and a per-item timeout
use async_trait::async_trait;
use batchline_core::port::{ItemContext, ItemError, ItemProcessor};
use serde::Deserialize;
use std::collections::HashMap;
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{info, warn};

/// Longest stderr excerpt carried in an item error
const STDERR_EXCERPT_CHARS: usize = 512;

/// Item shape: `{"command": "convert", "args": [..], "env": {..}, "working_dir": "..", "timeout_ms": 5000}`
#[derive(Debug, Deserialize)]
struct CommandSpec {
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default = "default_working_dir")]
    working_dir: String,
    timeout_ms: Option<u64>,
}

fn default_working_dir() -> String {
    ".".to_string()
}

/// Runs each item as a subprocess
pub struct CommandProcessor {
    env_allowlist: Vec<String>,
    default_timeout: Duration,
}

impl CommandProcessor {
    /// Create a new command processor
    ///
    /// # Arguments
    /// * `env_allowlist` - Item env vars passed to the child; anything else is dropped
    /// * `default_timeout` - Used when an item has no `timeout_ms`
    ///
    /// # Example
    /// ```ignore
    /// let processor = CommandProcessor::new(
    ///     vec!["PATH".to_string(), "HOME".to_string()],
    ///     Duration::from_secs(30),
    /// );
    /// ```
    pub fn new(env_allowlist: Vec<String>, default_timeout: Duration) -> Self {
        Self {
            env_allowlist,
            default_timeout,
        }
    }

    /// Filter environment variables to allowlist only
    fn filter_env(&self, env: &HashMap<String, String>) -> HashMap<String, String> {
        env.iter()
            .filter(|(k, _)| self.env_allowlist.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn parse_item(&self, item: &serde_json::Value) -> Result<CommandSpec, ItemError> {
        CommandSpec::deserialize(item).map_err(|e| ItemError::InvalidItem(e.to_string()))
    }

    /// Spawn child process and wait for output.
    ///
    /// The child is killed if the timeout drops the wait.
    async fn spawn_and_wait(
        &self,
        spec: &CommandSpec,
        limit: Duration,
    ) -> Result<Output, ItemError> {
        let filtered_env = self.filter_env(&spec.env);

        let child = Command::new(&spec.command)
            .args(&spec.args)
            .envs(&filtered_env)
            .current_dir(&spec.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ItemError::Io(format!("failed to spawn '{}': {}", spec.command, e)))?;

        match timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(ItemError::Io(e.to_string())),
            Err(_) => Err(ItemError::Timeout(limit.as_millis() as i64)),
        }
    }
}

fn stderr_excerpt(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    stderr.trim().chars().take(STDERR_EXCERPT_CHARS).collect()
}

#[async_trait]
impl ItemProcessor for CommandProcessor {
    async fn process(&self, ctx: ItemContext) -> Result<(), ItemError> {
        let spec = self.parse_item(&ctx.item)?;
        let limit = spec
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.default_timeout);

        info!(
            job_id = %ctx.job.job_id,
            index = ctx.index,
            command = %spec.command,
            args = ?spec.args,
            working_dir = %spec.working_dir,
            timeout_ms = limit.as_millis() as u64,
            "Starting subprocess"
        );

        let started = Instant::now();
        let output = self.spawn_and_wait(&spec, limit).await?;
        let duration_ms = started.elapsed().as_millis() as u64;

        if output.status.success() {
            info!(
                job_id = %ctx.job.job_id,
                index = ctx.index,
                duration_ms,
                "Subprocess completed"
            );
            return Ok(());
        }

        let excerpt = stderr_excerpt(&output);
        warn!(
            job_id = %ctx.job.job_id,
            index = ctx.index,
            exit_code = ?output.status.code(),
            stderr = %excerpt,
            "Subprocess failed"
        );
        Err(ItemError::Failed(match output.status.code() {
            Some(code) => format!("'{}' exited with code {}: {}", spec.command, code, excerpt),
            None => format!("'{}' was terminated by a signal", spec.command),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchline_core::domain::{JobMetadata, JobRecord};
    use serde_json::json;

    fn ctx(item: serde_json::Value) -> ItemContext {
        ItemContext {
            item,
            index: 0,
            job: JobRecord::new("job-1", vec!["item-1".to_string()], 0, JobMetadata::default()),
        }
    }

    fn processor() -> CommandProcessor {
        CommandProcessor::new(
            vec!["PATH".to_string(), "HOME".to_string()],
            Duration::from_secs(10),
        )
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_success() {
        let result = processor()
            .process(ctx(json!({"command": "echo", "args": ["hello"]})))
            .await;
        tokio_test::assert_ok!(result);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_fails_item() {
        let result = processor()
            .process(ctx(json!({"command": "sh", "args": ["-c", "echo broken >&2; exit 3"]})))
            .await;

        match result {
            Err(ItemError::Failed(msg)) => {
                assert!(msg.contains("code 3"));
                assert!(msg.contains("broken"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_timeout() {
        let result = processor()
            .process(ctx(json!({"command": "sleep", "args": ["10"], "timeout_ms": 100})))
            .await;

        assert!(matches!(result, Err(ItemError::Timeout(100))));
    }

    #[tokio::test]
    async fn test_missing_binary_is_io_error() {
        let result = processor()
            .process(ctx(json!({"command": "batchline-definitely-not-a-binary"})))
            .await;
        assert!(matches!(result, Err(ItemError::Io(_))));
    }

    #[tokio::test]
    async fn test_invalid_item() {
        let result = processor().process(ctx(json!({"args": ["x"]}))).await;
        let err = tokio_test::assert_err!(result);
        assert!(matches!(err, ItemError::InvalidItem(_)));
    }

    #[test]
    fn test_env_filtering() {
        let processor = CommandProcessor::new(vec!["ALLOWED_VAR".to_string()], Duration::ZERO);

        let mut env = HashMap::new();
        env.insert("ALLOWED_VAR".to_string(), "value1".to_string());
        env.insert("BLOCKED_VAR".to_string(), "value2".to_string());

        let filtered = processor.filter_env(&env);

        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains_key("ALLOWED_VAR"));
        assert!(!filtered.contains_key("BLOCKED_VAR"));
    }
}
