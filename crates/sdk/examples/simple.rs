//! Simple SDK Example
//!
//! Submits two file items and prints every progress event.
//!
//! # Usage
//!
//! 1. Start the daemon:
//!    ```bash
//!    cargo run --package batchline-daemon
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --package batchline-sdk --example simple
//!    ```

use batchline_sdk::{BatchlineClient, JobEvent, SubmitRequest};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Batchline SDK - Simple Example");
    println!("==============================\n");

    // 1. Connect to daemon
    let client = BatchlineClient::connect("http://127.0.0.1:9630")?;
    let health = client.health().await?;
    println!("1. Connected to daemon v{}\n", health.version);

    // 2. Submit and follow
    println!("2. Submitting job...");
    let mut events = client
        .submit(
            SubmitRequest::new(vec![json!("Cargo.toml"), json!("missing.txt")])
                .with_metadata("origin", json!("sdk-example")),
        )
        .await?;

    while let Some(event) = events.next().await? {
        match event {
            JobEvent::Snapshot(job) => println!(
                "   {} [{}] {}/{} items settled",
                job.job_id,
                job.status,
                job.settled_count(),
                job.items.len()
            ),
            JobEvent::Gone => println!("   job no longer stored"),
            JobEvent::Error(error) => println!("   error: {}", error),
        }
    }

    println!("\nDone.");
    Ok(())
}
