use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Datelike, Utc};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod export;
mod feed;
mod insights;
mod metrics;
mod models;
mod report;
mod sample;
mod sla;

use models::{DataBatch, DataSource, Insight, ServiceRequest};

#[derive(Parser)]
#[command(name = "civicstat")]
#[command(about = "Seattle service request analytics over the city's open data feeds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct BatchArgs {
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    sample: bool,
    #[arg(long, default_value_t = 10_000)]
    limit: usize,
    #[arg(long, default_value_t = 3_000)]
    tracking_limit: usize,
    #[arg(long, default_value_t = 20)]
    timeout_secs: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a batch and print its summary
    Fetch {
        #[command(flatten)]
        batch: BatchArgs,
    },
    /// Show department, issue-type, and monthly statistics
    Stats {
        #[command(flatten)]
        batch: BatchArgs,
        #[arg(long)]
        department: Option<String>,
    },
    /// Rank open requests by urgency
    Backlog {
        #[command(flatten)]
        batch: BatchArgs,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Derive qualitative insights from the batch
    Insights {
        #[command(flatten)]
        batch: BatchArgs,
        #[arg(long)]
        json: bool,
    },
    /// Show one request and its tracking timeline
    Track {
        #[command(flatten)]
        batch: BatchArgs,
        #[arg(long)]
        request: String,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        batch: BatchArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export the normalized requests to CSV
    Export {
        #[command(flatten)]
        batch: BatchArgs,
        #[arg(long, default_value = "requests.csv")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "civicstat=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let now = Utc::now();

    match cli.command {
        Commands::Fetch { batch } => {
            let batch = load_batch(&batch, now).await;
            print_fetch_summary(&batch);
        }
        Commands::Stats { batch, department } => {
            let batch = load_batch(&batch, now).await;
            disclose_sample(&batch);

            let requests: Vec<ServiceRequest> = match department.as_deref() {
                Some(name) => batch
                    .requests
                    .iter()
                    .filter(|r| r.department == name)
                    .cloned()
                    .collect(),
                None => batch.requests.clone(),
            };
            if requests.is_empty() {
                println!("No requests match this department.");
                return Ok(());
            }
            print_stats(&requests);
        }
        Commands::Backlog { batch, top } => {
            let batch = load_batch(&batch, now).await;
            disclose_sample(&batch);

            let entries = metrics::backlog(&batch.requests, now);
            if entries.is_empty() {
                println!("Nothing is currently open.");
                return Ok(());
            }
            println!("Most urgent open requests:");
            for entry in entries.iter().take(top) {
                let flag = if entry.past_due { ", past due" } else { "" };
                println!(
                    "- {} {} ({}): {} days open vs {} expected{}, urgency {:.2}",
                    entry.request.request_number,
                    entry.request.issue_type,
                    entry.request.department,
                    entry.days_open,
                    entry.expected_days,
                    flag,
                    entry.urgency_score
                );
            }
        }
        Commands::Insights { batch, json } => {
            let batch = load_batch(&batch, now).await;
            let type_stats = metrics::issue_type_stats(&batch.requests);
            let findings = insights::derive_insights(&batch, &type_stats, now);

            if json {
                let payload = insights_payload(&batch, &findings);
                println!("{}", serde_json::to_string_pretty(&payload)?);
                return Ok(());
            }

            disclose_sample(&batch);
            if findings.is_empty() {
                println!("No notable findings for this batch.");
                return Ok(());
            }
            for insight in findings.iter() {
                println!(
                    "[{}] {} ({} impact)",
                    insight.severity, insight.title, insight.impact
                );
                println!("  {}", insight.description);
                for action in insight.actions.iter() {
                    println!("  - {action}");
                }
            }
        }
        Commands::Track { batch, request } => {
            let batch = load_batch(&batch, now).await;
            disclose_sample(&batch);

            let Some(found) = batch.requests.iter().find(|r| r.request_number == request) else {
                println!("Request {request} is not in this batch.");
                return Ok(());
            };

            println!(
                "{} {} ({})",
                found.request_number, found.issue_type, found.department
            );
            println!("Status: {}", found.status);
            println!("Created: {}", found.created_date.format("%Y-%m-%d"));
            if let Some(closed) = found.closed_date {
                let marker = if found.closed_date_estimated {
                    " (estimated)"
                } else {
                    ""
                };
                println!("Closed: {}{marker}", closed.format("%Y-%m-%d"));
            }
            if let Some(days) = found.actual_resolution_days {
                println!(
                    "Resolved in {days} days against a {} day target",
                    found.expected_resolution_days
                );
            }
            if let Some(met) = found.sla_met {
                println!("SLA met: {}", if met { "yes" } else { "no" });
            }
            println!(
                "Location: {} (district {}, {})",
                found.location, found.council_district, found.neighborhood
            );
            println!("Received via: {}", found.method_received);

            let events = metrics::events_for_request(&batch.tracking, &request);
            println!();
            if events.is_empty() {
                println!("No tracking events for this request.");
                return Ok(());
            }
            println!("Timeline:");
            for event in events {
                println!(
                    "- {} {}: {}",
                    event.updated_at.format("%Y-%m-%d"),
                    event.status_category,
                    event.status_update
                );
            }
        }
        Commands::Report { batch, out } => {
            let batch = load_batch(&batch, now).await;
            let report = report::build_report(&batch, now);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { batch, out } => {
            let batch = load_batch(&batch, now).await;
            export::write_requests_csv(&out, &batch.requests)?;
            println!(
                "Exported {} requests to {}.",
                batch.requests.len(),
                out.display()
            );
        }
    }

    Ok(())
}

async fn load_batch(args: &BatchArgs, now: DateTime<Utc>) -> DataBatch {
    let target_year = args.year.unwrap_or_else(|| now.year());
    if args.sample {
        return feed::offline_batch(target_year, now);
    }

    let config = feed::FeedConfig {
        request_limit: args.limit,
        tracking_limit: args.tracking_limit,
        timeout: Duration::from_secs(args.timeout_secs),
        app_token: std::env::var("SEATTLE_APP_TOKEN").ok(),
        ..feed::FeedConfig::default()
    };
    feed::fetch_batch(&config, target_year, now).await
}

fn disclose_sample(batch: &DataBatch) {
    if batch.source == DataSource::Sample {
        println!("Demo data: live feed skipped or unavailable; figures are synthetic.");
        println!();
    }
}

// The JSON shape carries the batch provenance, so piped output still
// discloses synthetic data.
fn insights_payload(batch: &DataBatch, findings: &[Insight]) -> serde_json::Value {
    serde_json::json!({
        "source": batch.source,
        "error": batch.error,
        "insights": findings,
    })
}

fn print_fetch_summary(batch: &DataBatch) {
    println!("Source: {}", batch.source);
    if let Some(error) = &batch.error {
        println!("Fallback reason: {error}");
    }
    println!(
        "Batch #{} for {}, fetched {}: {} requests, {} tracking events",
        batch.sequence,
        batch.target_year,
        batch.fetched_at.format("%Y-%m-%d %H:%M UTC"),
        batch.requests.len(),
        batch.tracking.len()
    );
    if let (Some(newest), Some(oldest)) = (batch.requests.first(), batch.requests.last()) {
        println!(
            "Created between {} and {}",
            oldest.created_date.format("%Y-%m-%d"),
            newest.created_date.format("%Y-%m-%d")
        );
    }

    println!();
    println!("Monthly volume:");
    for month in metrics::monthly_stats(&batch.requests) {
        println!(
            "- {}: {} requests ({} closed)",
            month.label(),
            month.total,
            month.closed
        );
    }
}

fn print_stats(requests: &[ServiceRequest]) {
    println!("Departments:");
    for dept in metrics::department_stats(requests) {
        println!(
            "- {}: {} requests ({} open, {} in progress, {} closed), avg {}, SLA {:.0}%",
            dept.department,
            dept.total,
            dept.open,
            dept.in_progress,
            dept.closed,
            dept.avg_resolution_days
                .map_or("n/a".to_string(), |days| format!("{days} days")),
            dept.sla_compliance_pct
        );
    }

    println!();
    println!("Top issue types:");
    let issue_types = metrics::issue_type_stats(requests);
    for stat in issue_types.iter().take(metrics::TOP_ISSUE_TYPES) {
        println!(
            "- {}: {} requests, avg {} vs {} expected days, {:.0}% completed",
            stat.issue_type,
            stat.total,
            stat.avg_resolution_days
                .map_or("n/a".to_string(), |avg| format!("{avg:.1}")),
            stat.expected_resolution_days,
            stat.completion_pct
        );
    }

    println!();
    println!("Monthly:");
    for month in metrics::monthly_stats(requests) {
        println!(
            "- {}: {} requests ({} open, {} in progress, {} closed)",
            month.label(),
            month.total,
            month.open,
            month.in_progress,
            month.closed
        );
    }
}
