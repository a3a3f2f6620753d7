use chrono::{DateTime, Duration, Utc};

use crate::metrics;
use crate::models::{
    DataBatch, Impact, Insight, InsightKind, IssueTypeStats, MonthlyStats, ServiceRequest,
    Severity,
};

const BOTTLENECK_FACTOR: f64 = 1.5;
const BOTTLENECK_WORST: usize = 3;
const RATE_WINDOW_DAYS: i64 = 30;
const SLA_SAMPLE: usize = 50;
const SLA_TARGET_PCT: f64 = 70.0;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Runs the five rule checks independently; a rule whose condition is not met
/// contributes nothing and never blocks the others.
pub fn derive_insights(
    batch: &DataBatch,
    type_stats: &[IssueTypeStats],
    now: DateTime<Utc>,
) -> Vec<Insight> {
    let requests = &batch.requests;
    let mut insights = Vec::new();
    if let Some(insight) = seasonal_peak(requests) {
        insights.push(insight);
    }
    if let Some(insight) = bottleneck(type_stats) {
        insights.push(insight);
    }
    if let Some(insight) = geographic_hotspot(requests) {
        insights.push(insight);
    }
    if let Some(insight) = backlog_projection(requests, now) {
        insights.push(insight);
    }
    if let Some(insight) = sla_drift(requests) {
        insights.push(insight);
    }
    insights
}

fn seasonal_peak(requests: &[ServiceRequest]) -> Option<Insight> {
    let monthly = metrics::monthly_stats(requests);
    let mut peak: Option<&MonthlyStats> = None;
    for row in &monthly {
        if peak.map_or(true, |best| row.total > best.total) {
            peak = Some(row);
        }
    }
    let peak = peak?;

    Some(Insight {
        kind: InsightKind::Seasonal,
        severity: Severity::Info,
        title: "Seasonal Pattern Detected".to_string(),
        description: format!(
            "Request volume peaks in {} with {} requests. Consider increasing staffing during this period.",
            MONTH_NAMES[peak.month as usize - 1],
            peak.total
        ),
        impact: Impact::Medium,
        actions: vec![
            "Analyze staffing levels during peak periods".to_string(),
            "Consider temporary resource allocation".to_string(),
            "Review historical data for multi-year patterns".to_string(),
        ],
    })
}

fn bottleneck(type_stats: &[IssueTypeStats]) -> Option<Insight> {
    let mut slow: Vec<(&IssueTypeStats, f64, f64)> = type_stats
        .iter()
        .filter(|stat| stat.expected_resolution_days > 0)
        .filter_map(|stat| {
            let avg = stat.avg_resolution_days?;
            let expected = stat.expected_resolution_days as f64;
            (avg > expected * BOTTLENECK_FACTOR).then_some((stat, avg, avg / expected))
        })
        .collect();
    slow.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
    slow.truncate(BOTTLENECK_WORST);

    let &(worst, avg, ratio) = slow.first()?;
    let names: Vec<&str> = slow.iter().map(|(stat, _, _)| stat.issue_type.as_str()).collect();

    Some(Insight {
        kind: InsightKind::Bottleneck,
        severity: Severity::Warning,
        title: "Performance Bottleneck Identified".to_string(),
        description: format!(
            "{} requests are taking {avg:.1} days on average, {:.0}% over target. Slowest types: {}.",
            worst.issue_type,
            (ratio - 1.0) * 100.0,
            names.join(", ")
        ),
        impact: Impact::High,
        actions: vec![
            "Conduct process mapping workshop".to_string(),
            "Interview staff handling these requests".to_string(),
            "Identify resource constraints or policy issues".to_string(),
        ],
    })
}

fn geographic_hotspot(requests: &[ServiceRequest]) -> Option<Insight> {
    let districts = metrics::district_stats(requests);
    let top = districts.first()?;
    let label = if !top.district.is_empty() && top.district.chars().all(|c| c.is_ascii_digit()) {
        format!("Council District {}", top.district)
    } else {
        top.district.clone()
    };

    Some(Insight {
        kind: InsightKind::Geographic,
        severity: Severity::Info,
        title: "Geographic Hotspot".to_string(),
        description: format!("{label} accounts for {:.1}% of all requests.", top.share_pct),
        impact: Impact::Medium,
        actions: vec![
            "Schedule community meeting in affected area".to_string(),
            "Deploy mobile service unit if available".to_string(),
            "Investigate underlying infrastructure issues".to_string(),
        ],
    })
}

fn backlog_projection(requests: &[ServiceRequest], now: DateTime<Utc>) -> Option<Insight> {
    let window = (now - Duration::days(RATE_WINDOW_DAYS))..=now;
    let new_count = requests
        .iter()
        .filter(|r| window.contains(&r.created_date))
        .count();
    let closed_count = requests
        .iter()
        .filter_map(|r| r.closed_date)
        .filter(|closed| window.contains(closed))
        .count();

    let new_rate = new_count as f64 / RATE_WINDOW_DAYS as f64;
    let close_rate = closed_count as f64 / RATE_WINDOW_DAYS as f64;
    if new_rate <= close_rate {
        return None;
    }
    let growth = (new_rate - close_rate) * RATE_WINDOW_DAYS as f64;

    Some(Insight {
        kind: InsightKind::PredictiveBacklog,
        severity: Severity::Critical,
        title: "Backlog Growth Predicted".to_string(),
        description: format!(
            "Current trend shows {new_rate:.1} new requests/day vs {close_rate:.1} closures/day. \
             Backlog will grow by {growth:.0} requests in 30 days."
        ),
        impact: Impact::Critical,
        actions: vec![
            "Implement expedited closure process".to_string(),
            "Increase team capacity temporarily".to_string(),
            "Review prioritization criteria".to_string(),
        ],
    })
}

// Assumes batch order, newest first.
fn sla_drift(requests: &[ServiceRequest]) -> Option<Insight> {
    let recent: Vec<bool> = requests
        .iter()
        .filter(|r| r.closed_date.is_some())
        .filter_map(|r| r.sla_met)
        .take(SLA_SAMPLE)
        .collect();
    if recent.is_empty() {
        return None;
    }

    let met = recent.iter().filter(|ok| **ok).count();
    let rate = met as f64 / recent.len() as f64 * 100.0;
    if rate >= SLA_TARGET_PCT {
        return None;
    }

    Some(Insight {
        kind: InsightKind::SlaCompliance,
        severity: Severity::Critical,
        title: "SLA Compliance Below Target".to_string(),
        description: format!(
            "Recent SLA compliance is {rate:.0}%, below the {SLA_TARGET_PCT:.0}% target."
        ),
        impact: Impact::Critical,
        actions: vec![
            "Emergency review of open requests".to_string(),
            "Reassess SLA targets for feasibility".to_string(),
            "Implement daily stand-up meetings".to_string(),
        ],
    })
}
