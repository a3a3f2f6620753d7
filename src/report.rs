use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::insights;
use crate::metrics;
use crate::models::{DataBatch, DataSource, Status};

pub fn build_report(batch: &DataBatch, now: DateTime<Utc>) -> String {
    let departments = metrics::department_stats(&batch.requests);
    let issue_types = metrics::issue_type_stats(&batch.requests);
    let monthly = metrics::monthly_stats(&batch.requests);
    let districts = metrics::district_stats(&batch.requests);
    let backlog = metrics::backlog(&batch.requests, now);
    let findings = insights::derive_insights(batch, &issue_types, now);

    let mut output = String::new();

    let _ = writeln!(output, "# Seattle Service Request Report");
    let _ = writeln!(
        output,
        "Generated {} from {} for {}",
        now.format("%Y-%m-%d %H:%M UTC"),
        batch.source,
        batch.target_year
    );

    if batch.source == DataSource::Sample {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "> Demo data: the figures below are synthetic, not live city records."
        );
        if let Some(error) = &batch.error {
            let _ = writeln!(output, "> Live feed error: {error}");
        }
    }

    let open = status_count(batch, Status::Open);
    let in_progress = status_count(batch, Status::InProgress);
    let closed = status_count(batch, Status::Closed);
    let estimated = batch
        .requests
        .iter()
        .filter(|r| r.closed_date_estimated)
        .count();

    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(
        output,
        "- Batch #{} fetched {}",
        batch.sequence,
        batch.fetched_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output, "- Total requests: {}", batch.requests.len());
    let _ = writeln!(
        output,
        "- Open: {open}, In Progress: {in_progress}, Closed: {closed}"
    );
    let _ = writeln!(output, "- Tracking events: {}", batch.tracking.len());
    if estimated > 0 {
        let _ = writeln!(
            output,
            "- Closure dates estimated from SLA targets, not observed: {estimated}"
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Departments");

    if departments.is_empty() {
        let _ = writeln!(output, "No requests in this batch.");
    } else {
        for dept in departments.iter() {
            let spread = match (dept.min_resolution_days, dept.max_resolution_days) {
                (Some(min), Some(max)) => format!(" (min {min}, max {max})"),
                _ => String::new(),
            };
            let _ = writeln!(
                output,
                "- {}: {} requests ({} open, {} in progress, {} closed), avg resolution {}{}, SLA {:.0}%",
                dept.department,
                dept.total,
                dept.open,
                dept.in_progress,
                dept.closed,
                format_days(dept.avg_resolution_days),
                spread,
                dept.sla_compliance_pct
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Issue Types");

    if issue_types.is_empty() {
        let _ = writeln!(output, "No requests in this batch.");
    } else {
        for stat in issue_types.iter().take(metrics::TOP_ISSUE_TYPES) {
            let avg = match stat.avg_resolution_days {
                Some(avg) => format!("{avg:.1}"),
                None => "n/a".to_string(),
            };
            let _ = writeln!(
                output,
                "- {}: {} requests, avg {} vs {} expected days, {:.0}% completed, SLA {:.0}%",
                stat.issue_type,
                stat.total,
                avg,
                stat.expected_resolution_days,
                stat.completion_pct,
                stat.sla_compliance_pct
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Monthly Volume");

    if monthly.is_empty() {
        let _ = writeln!(output, "No requests in this batch.");
    } else {
        for month in monthly.iter() {
            let _ = writeln!(
                output,
                "- {}: {} requests ({} open, {} in progress, {} closed), avg resolution {}",
                month.label(),
                month.total,
                month.open,
                month.in_progress,
                month.closed,
                format_days(month.avg_resolution_days)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Council Districts");

    if districts.is_empty() {
        let _ = writeln!(output, "No requests in this batch.");
    } else {
        for district in districts.iter() {
            let _ = writeln!(
                output,
                "- District {}: {} requests ({:.1}% of batch)",
                district.district, district.total, district.share_pct
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Backlog (Most Urgent)");

    if backlog.is_empty() {
        let _ = writeln!(output, "Nothing is currently open.");
    } else {
        for entry in backlog.iter().take(10) {
            let flag = if entry.past_due { ", past due" } else { "" };
            let _ = writeln!(
                output,
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

    let _ = writeln!(output);
    let _ = writeln!(output, "## Insights");

    if findings.is_empty() {
        let _ = writeln!(output, "No notable findings for this batch.");
    } else {
        for insight in findings.iter() {
            let _ = writeln!(
                output,
                "- [{}] {}: {}",
                insight.severity, insight.title, insight.description
            );
            for action in insight.actions.iter() {
                let _ = writeln!(output, "  - {action}");
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Tracking Updates");

    if batch.tracking.is_empty() {
        let _ = writeln!(output, "No tracking events in this batch.");
    } else {
        for event in batch.tracking.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} {} on {}: {}",
                event.request_number,
                event.status_category,
                event.updated_at.format("%Y-%m-%d"),
                event.status_update
            );
        }
    }

    output
}

fn status_count(batch: &DataBatch, status: Status) -> usize {
    batch
        .requests
        .iter()
        .filter(|r| r.status == status)
        .count()
}

fn format_days(days: Option<i64>) -> String {
    match days {
        Some(days) => format!("{days} days"),
        None => "n/a".to_string(),
    }
}
