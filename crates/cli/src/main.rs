//! Batchline CLI - Command-line interface for the Batchline daemon

use anyhow::{Context, Result};
use batchline_sdk::{BatchlineClient, JobEvent, JobEventStream, JobSnapshot, SubmitRequest};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use tabled::{Table, Tabled};

const DEFAULT_URL: &str = "http://127.0.0.1:9630";

#[derive(Parser)]
#[command(name = "batchline")]
#[command(about = "Batchline CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Daemon URL
    #[arg(long, env = "BATCHLINE_URL", default_value = DEFAULT_URL)]
    url: String,

    /// Print raw JSON events instead of progress lines
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a job and follow its progress
    Submit {
        /// Items, each a JSON value or a plain string (e.g. a file path)
        #[arg(required = true)]
        items: Vec<String>,

        /// Metadata field, KEY=VALUE (VALUE parsed as JSON when possible)
        #[arg(short, long = "meta", value_name = "KEY=VALUE")]
        metadata: Vec<String>,

        /// Return the job id immediately instead of streaming
        #[arg(short, long)]
        detach: bool,
    },

    /// Show the current record of a job
    Status {
        /// Job ID
        job_id: String,
    },

    /// Follow a running job until it is gone
    Watch {
        /// Job ID
        job_id: String,
    },

    /// Check that the daemon is up
    Health,
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "#")]
    index: usize,
    item_id: String,
    status: String,
    duration: String,
}

/// JSON if it parses, otherwise the raw string
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn parse_metadata(pair: &str) -> Result<(String, Value)> {
    let (key, value) = pair
        .split_once('=')
        .with_context(|| format!("Metadata must be KEY=VALUE, got '{}'", pair))?;
    Ok((key.to_string(), parse_value(value)))
}

fn colored_status(status: &str) -> String {
    match status {
        "completed" => status.green().to_string(),
        "failed" => status.red().to_string(),
        _ => status.yellow().to_string(),
    }
}

fn print_job(job: &JobSnapshot) {
    println!(
        "{} {} ({})",
        "Job".cyan().bold(),
        job.job_id,
        colored_status(&job.status)
    );
    if let Some(duration) = &job.duration_minutes {
        println!("Duration: {}", duration);
    }
    for (key, value) in &job.metadata {
        println!("{}: {}", key, value);
    }

    if job.items.is_empty() {
        println!("{}", "No items".yellow());
        return;
    }

    let rows: Vec<ItemRow> = job
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| ItemRow {
            index,
            item_id: item.item_id.clone(),
            status: item.status.clone(),
            duration: item.duration_minutes.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    println!("{}", Table::new(rows));
}

/// Print events until the stream closes, returning the last snapshot seen
async fn follow(mut events: JobEventStream, raw: bool) -> Result<Option<JobSnapshot>> {
    let mut last = None;

    while let Some(event) = events.next().await? {
        match event {
            JobEvent::Snapshot(job) => {
                if raw {
                    println!("{}", serde_json::to_string(&job)?);
                } else {
                    println!(
                        "{} {}/{} items settled [{}]",
                        "→".cyan(),
                        job.settled_count(),
                        job.items.len(),
                        colored_status(&job.status)
                    );
                }
                last = Some(*job);
            }
            JobEvent::Gone => {
                if raw {
                    println!("{{}}");
                } else {
                    println!("{}", "Job is no longer stored".yellow());
                }
            }
            JobEvent::Error(error) => anyhow::bail!("Daemon reported: {}", error),
        }
    }

    Ok(last)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = BatchlineClient::connect(&cli.url)?;

    match cli.command {
        Commands::Submit {
            items,
            metadata,
            detach,
        } => {
            let mut request = SubmitRequest::new(items.iter().map(|i| parse_value(i)).collect());
            for pair in &metadata {
                let (key, value) = parse_metadata(pair)?;
                request = request.with_metadata(key, value);
            }

            if detach {
                let job_id = client
                    .submit_detached(request)
                    .await
                    .context("Failed to submit job")?;
                println!("{}", "✓ Job submitted".green().bold());
                println!("{}", job_id);
                return Ok(());
            }

            let events = client.submit(request).await.context("Failed to submit job")?;
            match follow(events, cli.json).await? {
                Some(job) if !cli.json => {
                    println!();
                    print_job(&job);
                }
                Some(_) => {}
                None => println!("{}", "Stream closed without events".yellow()),
            }
        }

        Commands::Status { job_id } => match client.status(&job_id).await? {
            Some(job) if cli.json => println!("{}", serde_json::to_string_pretty(&job)?),
            Some(job) => print_job(&job),
            None => println!(
                "{}",
                format!("Job {} not found (finished or expired)", job_id).yellow()
            ),
        },

        Commands::Watch { job_id } => {
            let events = client.watch(&job_id).await?;
            if let Some(job) = follow(events, cli.json).await? {
                if !cli.json {
                    println!();
                    print_job(&job);
                }
            }
        }

        Commands::Health => {
            let health = client
                .health()
                .await
                .context("Failed to connect to daemon")?;
            println!(
                "{} daemon v{} ({})",
                "✓".green().bold(),
                health.version,
                health.status
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("a.txt"), json!("a.txt"));
        assert_eq!(parse_value(r#"{"path":"a"}"#), json!({"path": "a"}));
        assert_eq!(parse_value("42"), json!(42));
    }

    #[test]
    fn test_parse_metadata() {
        let (key, value) = parse_metadata("batch=7").unwrap();
        assert_eq!(key, "batch");
        assert_eq!(value, json!(7));
        assert!(parse_metadata("no-equals").is_err());
    }

    #[test]
    fn test_submit_args() {
        let cli = Cli::parse_from(["batchline", "submit", "a.txt", "b.txt", "-m", "k=v", "--detach"]);
        match cli.command {
            Commands::Submit {
                items,
                metadata,
                detach,
            } => {
                assert_eq!(items, vec!["a.txt", "b.txt"]);
                assert_eq!(metadata, vec!["k=v"]);
                assert!(detach);
            }
            _ => panic!("expected submit"),
        }
    }
}
