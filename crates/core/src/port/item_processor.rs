// Item Processor Port
// The external per-item work: whatever "processing a file" means to the caller

use crate::domain::JobRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Everything the processor gets to see about one item
#[derive(Debug, Clone)]
pub struct ItemContext {
    /// The caller's item, exactly as submitted
    pub item: serde_json::Value,
    /// Position in the job (processing order)
    pub index: usize,
    /// Job snapshot taken right after this item's start was stamped
    pub job: JobRecord,
}

/// Item-level failure. Recorded on the item, never aborts the job.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ItemError {
    #[error("Invalid item: {0}")]
    InvalidItem(String),

    #[error("Item rejected: {0}")]
    Rejected(String),

    #[error("Item timed out after {0}ms")]
    Timeout(i64),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Item processing panicked: {0}")]
    Panicked(String),

    #[error("Processing failed: {0}")]
    Failed(String),
}

/// Item processor trait
///
/// Implementations:
/// - FileProbeProcessor: checks that a file item exists and is readable
/// - CommandProcessor: runs one subprocess per item
#[async_trait]
pub trait ItemProcessor: Send + Sync {
    /// Process one item. May suspend for as long as it needs.
    async fn process(&self, ctx: ItemContext) -> Result<(), ItemError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Mock processor behavior for one item
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Succeed after the delay
        Succeed(Duration),
        /// Fail with message after the delay
        Fail(Duration, String),
        /// Panic with message (for panic isolation testing)
        Panic(String),
    }

    /// Mock processor driven by a per-index script
    pub struct MockItemProcessor {
        script: Vec<MockBehavior>,
        fallback: MockBehavior,
        calls: Mutex<Vec<ItemContext>>,
    }

    impl MockItemProcessor {
        pub fn new(script: Vec<MockBehavior>) -> Self {
            Self {
                script,
                fallback: MockBehavior::Succeed(Duration::ZERO),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn new_success() -> Self {
            Self::new(Vec::new())
        }

        /// Every item takes `delay` and succeeds
        pub fn new_uniform(delay: Duration) -> Self {
            let mut processor = Self::new(Vec::new());
            processor.fallback = MockBehavior::Succeed(delay);
            processor
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        /// Indexes in the order they were processed
        pub fn processed_indexes(&self) -> Vec<usize> {
            self.calls.lock().unwrap().iter().map(|c| c.index).collect()
        }

        pub fn contexts(&self) -> Vec<ItemContext> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ItemProcessor for MockItemProcessor {
        async fn process(&self, ctx: ItemContext) -> Result<(), ItemError> {
            let behavior = self
                .script
                .get(ctx.index)
                .cloned()
                .unwrap_or_else(|| self.fallback.clone());
            self.calls.lock().unwrap().push(ctx);

            match behavior {
                MockBehavior::Succeed(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(())
                }
                MockBehavior::Fail(delay, message) => {
                    tokio::time::sleep(delay).await;
                    Err(ItemError::Failed(message))
                }
                MockBehavior::Panic(message) => {
                    panic!("{}", message); // Actually panic for isolation testing
                }
            }
        }
    }
}
