use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};

use crate::feed;
use crate::models::{
    BacklogEntry, DepartmentStats, DistrictStats, IssueTypeStats, MonthlyStats, ServiceRequest,
    Status, TrackingEvent,
};
use crate::sla;

// Rows kept by the issue-type display tables; the aggregate itself covers
// every type.
pub const TOP_ISSUE_TYPES: usize = 15;

pub fn department_stats(requests: &[ServiceRequest]) -> Vec<DepartmentStats> {
    let mut stats: Vec<DepartmentStats> = group_requests(requests, |r| r.department.clone())
        .into_iter()
        .map(|(department, members)| {
            let resolution_days = closed_resolution_days(&members);
            DepartmentStats {
                department,
                total: members.len(),
                open: count_status(&members, Status::Open),
                in_progress: count_status(&members, Status::InProgress),
                closed: count_status(&members, Status::Closed),
                avg_resolution_days: mean_rounded(&resolution_days),
                min_resolution_days: resolution_days.iter().copied().min(),
                max_resolution_days: resolution_days.iter().copied().max(),
                sla_compliance_pct: compliance_pct(&members),
            }
        })
        .collect();
    stats.sort_by(|a, b| b.total.cmp(&a.total));
    stats
}

pub fn issue_type_stats(requests: &[ServiceRequest]) -> Vec<IssueTypeStats> {
    let mut stats: Vec<IssueTypeStats> = group_requests(requests, |r| r.issue_type.clone())
        .into_iter()
        .map(|(issue_type, members)| {
            let resolution_days = closed_resolution_days(&members);
            let closed = count_status(&members, Status::Closed);
            let expected = sla::expected_resolution_days(&issue_type);
            IssueTypeStats {
                issue_type,
                total: members.len(),
                open: count_status(&members, Status::Open),
                closed,
                avg_resolution_days: mean_one_decimal(&resolution_days),
                expected_resolution_days: expected,
                completion_pct: percentage(closed, members.len()),
                sla_compliance_pct: compliance_pct(&members),
            }
        })
        .collect();
    stats.sort_by(|a, b| b.total.cmp(&a.total));
    stats
}

pub fn monthly_stats(requests: &[ServiceRequest]) -> Vec<MonthlyStats> {
    let mut stats: Vec<MonthlyStats> =
        group_requests(requests, |r| (r.created_date.year(), r.created_date.month()))
            .into_iter()
            .map(|((year, month), members)| {
                let resolution_days = closed_resolution_days(&members);
                MonthlyStats {
                    year,
                    month,
                    total: members.len(),
                    open: count_status(&members, Status::Open),
                    in_progress: count_status(&members, Status::InProgress),
                    closed: count_status(&members, Status::Closed),
                    avg_resolution_days: mean_rounded(&resolution_days),
                }
            })
            .collect();
    stats.sort_by(|a, b| (a.year, a.month).cmp(&(b.year, b.month)));
    stats
}

pub fn district_stats(requests: &[ServiceRequest]) -> Vec<DistrictStats> {
    let total = requests.len();
    let mut stats: Vec<DistrictStats> = group_requests(requests, |r| r.council_district.clone())
        .into_iter()
        .map(|(district, members)| DistrictStats {
            district,
            total: members.len(),
            share_pct: percentage(members.len(), total),
        })
        .collect();
    stats.sort_by(|a, b| b.total.cmp(&a.total));
    stats
}

pub fn backlog(requests: &[ServiceRequest], now: DateTime<Utc>) -> Vec<BacklogEntry> {
    let mut entries: Vec<BacklogEntry> = requests
        .iter()
        .filter(|r| !r.status.is_closed())
        .map(|request| {
            let days_open = feed::whole_days_between(request.created_date, now).max(0);
            let expected_days = if request.expected_resolution_days > 0 {
                request.expected_resolution_days
            } else {
                sla::DEFAULT_EXPECTED_DAYS
            };
            BacklogEntry {
                request: request.clone(),
                days_open,
                expected_days,
                past_due: days_open > expected_days,
                urgency_score: days_open as f64 / expected_days as f64,
            }
        })
        .collect();
    entries.sort_by(|a, b| {
        b.urgency_score
            .partial_cmp(&a.urgency_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    entries
}

pub fn events_for_request<'a>(
    tracking: &'a [TrackingEvent],
    request_number: &str,
) -> Vec<&'a TrackingEvent> {
    let mut events: Vec<&TrackingEvent> = tracking
        .iter()
        .filter(|event| event.request_number == request_number)
        .collect();
    events.sort_by(|a, b| {
        a.updated_at
            .cmp(&b.updated_at)
            .then(a.status_order.cmp(&b.status_order))
    });
    events
}

// Groups while preserving first-encounter order, so equal-count rows rank the
// same way on every run over the same batch.
fn group_requests<K, F>(requests: &[ServiceRequest], key: F) -> Vec<(K, Vec<&ServiceRequest>)>
where
    K: Clone + Eq + std::hash::Hash,
    F: Fn(&ServiceRequest) -> K,
{
    let mut groups: Vec<(K, Vec<&ServiceRequest>)> = Vec::new();
    let mut index: HashMap<K, usize> = HashMap::new();
    for request in requests {
        let group_key = key(request);
        match index.get(&group_key) {
            Some(&slot) => groups[slot].1.push(request),
            None => {
                index.insert(group_key.clone(), groups.len());
                groups.push((group_key, vec![request]));
            }
        }
    }
    groups
}

fn closed_resolution_days(members: &[&ServiceRequest]) -> Vec<i64> {
    members
        .iter()
        .filter(|r| r.status.is_closed())
        .filter_map(|r| r.actual_resolution_days)
        .collect()
}

fn count_status(members: &[&ServiceRequest], status: Status) -> usize {
    members.iter().filter(|r| r.status == status).count()
}

fn mean_rounded(days: &[i64]) -> Option<i64> {
    if days.is_empty() {
        return None;
    }
    let mean = days.iter().sum::<i64>() as f64 / days.len() as f64;
    Some(mean.round() as i64)
}

fn mean_one_decimal(days: &[i64]) -> Option<f64> {
    if days.is_empty() {
        return None;
    }
    let mean = days.iter().sum::<i64>() as f64 / days.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

fn compliance_pct(members: &[&ServiceRequest]) -> f64 {
    let closed = count_status(members, Status::Closed);
    if closed == 0 {
        return 0.0;
    }
    let met = members.iter().filter(|r| r.sla_met == Some(true)).count();
    met as f64 / closed as f64 * 100.0
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}
