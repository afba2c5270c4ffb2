//! Batchline SDK - Rust Client Library
//!
//! Submits batch jobs to a Batchline daemon and follows their progress over
//! Server-Sent Events.
//!
//! # Example
//!
//! ```no_run
//! use batchline_sdk::{BatchlineClient, JobEvent, SubmitRequest};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BatchlineClient::connect("http://127.0.0.1:9630")?;
//!
//!     let mut events = client
//!         .submit(SubmitRequest::new(vec![json!("a.txt"), json!("b.txt")]))
//!         .await?;
//!
//!     while let Some(event) = events.next().await? {
//!         if let JobEvent::Snapshot(job) = event {
//!             println!("{} {}/{}", job.status, job.settled_count(), job.items.len());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod sse;
mod types;

pub use client::{BatchlineClient, JobEventStream};
pub use error::{Result, SdkError};
pub use types::{HealthResponse, ItemSnapshot, JobEvent, JobSnapshot, SubmitAccepted, SubmitRequest};
