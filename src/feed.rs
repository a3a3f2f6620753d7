use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{anyhow, Context};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::{DataBatch, DataSource, ServiceRequest, Status, TrackingEvent};
use crate::sample;
use crate::sla;

pub const DEFAULT_BASE_URL: &str = "https://data.seattle.gov/resource";
pub const REQUESTS_DATASET: &str = "5ngg-rpne";
pub const TRACKING_DATASET: &str = "43nw-pkdq";

const REQUESTS_DATE_FIELD: &str = "createddate";
const TRACKING_DATE_FIELD: &str = "updateddate";
const MILLIS_PER_DAY: i64 = 86_400_000;

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub base_url: String,
    pub request_limit: usize,
    pub tracking_limit: usize,
    pub timeout: Duration,
    pub app_token: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_limit: 10_000,
            tracking_limit: 3_000,
            timeout: Duration::from_secs(20),
            app_token: None,
        }
    }
}

// Upstream field names differ between the two feeds (and across portal
// exports), so every canonical field carries its candidate keys in priority
// order.
const REQUEST_NUMBER_KEYS: &[&str] = &["servicerequestnumber", "service_request_number"];
const REQUEST_TYPE_KEYS: &[&str] = &[
    "webintakeservicerequests",
    "servicerequesttype",
    "service_request_type",
];
const DEPARTMENT_KEYS: &[&str] = &["departmentname", "city_department", "department"];
const STATUS_KEYS: &[&str] = &["servicerequeststatusname", "status"];
const CREATED_DATE_KEYS: &[&str] = &["createddate", "created_date"];
const CLOSED_DATE_KEYS: &[&str] = &["closeddate", "closed_date", "resolutiondate"];
const METHOD_KEYS: &[&str] = &["methodreceivedname", "method_received"];
const LOCATION_KEYS: &[&str] = &["location", "reportedlocation"];
const DISTRICT_KEYS: &[&str] = &["councildistrict", "council_district"];
const NEIGHBORHOOD_KEYS: &[&str] = &["neighborhood"];
const ZIP_KEYS: &[&str] = &["zipcode", "zip_code"];
const LATITUDE_KEYS: &[&str] = &["latitude"];
const LONGITUDE_KEYS: &[&str] = &["longitude"];
const PRECINCT_KEYS: &[&str] = &["policeprecinct", "police_precinct"];

const TRACK_NUMBER_KEYS: &[&str] = &[
    "servicerequestnumber",
    "service_request_number",
    "linkedrequestnumber",
];
const TRACK_DEPARTMENT_KEYS: &[&str] = &["responsibledepartment", "department"];
const TRACK_CATEGORY_KEYS: &[&str] = &["statuscategory", "currentstatus", "status"];
const TRACK_UPDATE_KEYS: &[&str] = &["statusupdate", "status_update"];
const TRACK_ORDER_KEYS: &[&str] = &["statusorder", "status_order"];
const TRACK_UPDATED_KEYS: &[&str] = &["updateddate", "updated_at"];

pub async fn fetch_batch(config: &FeedConfig, target_year: i32, now: DateTime<Utc>) -> DataBatch {
    let sequence = next_sequence();
    info!(target_year, sequence, "fetching Seattle open data feeds");
    let (requests, tracking) = fetch_feeds(config, target_year, now).await;
    resolve_batch(requests, tracking, target_year, now, sequence)
}

/// Batch for offline/demo use: same shape as a fallback batch, but requested
/// deliberately rather than caused by a feed failure.
pub fn offline_batch(target_year: i32, now: DateTime<Utc>) -> DataBatch {
    let sequence = next_sequence();
    let (requests, tracking) = sample::generate(target_year, now);
    DataBatch {
        requests,
        tracking,
        source: DataSource::Sample,
        error: None,
        target_year,
        fetched_at: now,
        sequence,
    }
}

fn next_sequence() -> u64 {
    NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

async fn fetch_feeds(
    config: &FeedConfig,
    target_year: i32,
    now: DateTime<Utc>,
) -> (anyhow::Result<Vec<ServiceRequest>>, Vec<TrackingEvent>) {
    let client = match build_client(config) {
        Ok(client) => client,
        Err(err) => return (Err(err), Vec::new()),
    };

    let requests_call = fetch_feed(
        &client,
        config,
        REQUESTS_DATASET,
        REQUESTS_DATE_FIELD,
        config.request_limit,
        target_year,
    );
    let tracking_call = fetch_feed(
        &client,
        config,
        TRACKING_DATASET,
        TRACKING_DATE_FIELD,
        config.tracking_limit,
        target_year,
    );
    let (raw_requests, raw_tracking) = tokio::join!(requests_call, tracking_call);

    let tracking = match raw_tracking {
        Ok(raw) => {
            let events = normalize_tracking(&raw, now);
            info!(total = events.len(), "normalized tracking feed");
            events
        }
        Err(err) => {
            warn!(error = %err, "tracking feed unavailable; continuing without tracking events");
            Vec::new()
        }
    };

    let requests = raw_requests.and_then(|raw| normalize_requests(&raw, target_year, now));
    (requests, tracking)
}

/// Decides between the live outcome and the synthetic fallback. The caller
/// always gets a usable batch with at least one request in it.
pub fn resolve_batch(
    requests: anyhow::Result<Vec<ServiceRequest>>,
    tracking: Vec<TrackingEvent>,
    target_year: i32,
    now: DateTime<Utc>,
    sequence: u64,
) -> DataBatch {
    match requests {
        Ok(requests) => {
            info!(
                requests = requests.len(),
                tracking = tracking.len(),
                "live batch ready"
            );
            DataBatch {
                requests,
                tracking,
                source: DataSource::Live,
                error: None,
                target_year,
                fetched_at: now,
                sequence,
            }
        }
        Err(err) => {
            warn!(error = %err, "requests feed unusable; falling back to sample data");
            let (requests, tracking) = sample::generate(target_year, now);
            DataBatch {
                requests,
                tracking,
                source: DataSource::Sample,
                error: Some(format!("live feed unavailable: {err:#}")),
                target_year,
                fetched_at: now,
                sequence,
            }
        }
    }
}

fn build_client(config: &FeedConfig) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .context("failed to build HTTP client")
}

fn soql_params(date_field: &str, limit: usize, year: i32) -> [(String, String); 3] {
    let start = format!("{year}-01-01T00:00:00.000");
    let end = format!("{year}-12-31T23:59:59.999");
    [
        ("$limit".to_string(), limit.to_string()),
        (
            "$where".to_string(),
            format!("{date_field} between '{start}' and '{end}'"),
        ),
        ("$order".to_string(), format!("{date_field} DESC")),
    ]
}

async fn fetch_feed(
    client: &reqwest::Client,
    config: &FeedConfig,
    dataset: &str,
    date_field: &str,
    limit: usize,
    year: i32,
) -> anyhow::Result<Vec<Value>> {
    let url = format!("{}/{dataset}.json", config.base_url);
    let params = soql_params(date_field, limit, year);
    debug!(%url, where_clause = %params[1].1, "querying feed");

    let mut request = client
        .get(&url)
        .query(&params)
        .header("Accept", "application/json");
    if let Some(token) = &config.app_token {
        request = request.header("X-App-Token", token);
    }

    let response = request
        .send()
        .await
        .with_context(|| format!("request to dataset {dataset} failed"))?;
    if !response.status().is_success() {
        return Err(anyhow!("dataset {dataset} returned HTTP {}", response.status()));
    }

    let records: Vec<Value> = response
        .json()
        .await
        .with_context(|| format!("dataset {dataset} returned malformed JSON"))?;
    debug!(dataset, records = records.len(), "feed responded");
    Ok(records)
}

pub fn normalize_requests(
    raw: &[Value],
    target_year: i32,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<ServiceRequest>> {
    if raw.is_empty() {
        return Err(anyhow!("requests feed returned no records"));
    }

    let mut requests: Vec<ServiceRequest> =
        raw.iter().map(|record| map_request(record, now)).collect();

    // The portal is not guaranteed to honor the range filter, so verify the
    // reported creation dates before trusting the batch. Dates that fell
    // back to the default do not count.
    let matching = raw
        .iter()
        .filter_map(|record| date_field(record, CREATED_DATE_KEYS))
        .filter(|created| created.year() == target_year)
        .count();
    if matching == 0 {
        error!(
            target_year,
            total = requests.len(),
            "no records match the target year; rejecting the feed response"
        );
        return Err(anyhow!(
            "no {target_year} data available from the requests feed"
        ));
    }

    info!(
        total = requests.len(),
        matching, target_year, "normalized requests feed"
    );
    requests.sort_by(|a, b| b.created_date.cmp(&a.created_date));
    Ok(requests)
}

pub fn normalize_tracking(raw: &[Value], now: DateTime<Utc>) -> Vec<TrackingEvent> {
    let mut tracking: Vec<TrackingEvent> = raw
        .iter()
        .map(|record| map_tracking_event(record, now))
        .collect();
    tracking.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    tracking
}

fn map_request(record: &Value, now: DateTime<Utc>) -> ServiceRequest {
    let issue_type =
        text_field(record, REQUEST_TYPE_KEYS).unwrap_or_else(|| "Unknown".to_string());
    let expected = sla::expected_resolution_days(&issue_type);
    let created_date = date_field(record, CREATED_DATE_KEYS).unwrap_or(now);
    let status = normalize_status(text_field(record, STATUS_KEYS).as_deref());

    let mut closed_date_estimated = false;
    let closed_date = if status == Status::Closed {
        match date_field(record, CLOSED_DATE_KEYS) {
            Some(date) => Some(date),
            None => {
                // The requests feed usually omits closure timestamps, so the
                // closure is approximated from the SLA target and flagged as
                // an estimate rather than a measurement.
                closed_date_estimated = true;
                Some(created_date + chrono::Duration::days(expected))
            }
        }
    } else {
        None
    };

    let (actual_resolution_days, sla_met) = resolution_outcome(created_date, closed_date, expected);

    ServiceRequest {
        request_number: text_field(record, REQUEST_NUMBER_KEYS)
            .unwrap_or_else(|| format!("SR-{}", Uuid::new_v4().simple())),
        issue_type,
        department: text_field(record, DEPARTMENT_KEYS)
            .unwrap_or_else(|| "Unknown Department".to_string()),
        status,
        created_date,
        closed_date,
        closed_date_estimated,
        method_received: text_field(record, METHOD_KEYS).unwrap_or_else(|| "Unknown".to_string()),
        location: text_field(record, LOCATION_KEYS).unwrap_or_else(|| "Seattle, WA".to_string()),
        council_district: text_field(record, DISTRICT_KEYS).unwrap_or_else(|| "Unknown".to_string()),
        neighborhood: text_field(record, NEIGHBORHOOD_KEYS).unwrap_or_else(|| "Unknown".to_string()),
        zip_code: text_field(record, ZIP_KEYS),
        latitude: float_field(record, LATITUDE_KEYS),
        longitude: float_field(record, LONGITUDE_KEYS),
        police_precinct: text_field(record, PRECINCT_KEYS),
        expected_resolution_days: expected,
        actual_resolution_days,
        sla_met,
    }
}

fn map_tracking_event(record: &Value, now: DateTime<Utc>) -> TrackingEvent {
    TrackingEvent {
        request_number: text_field(record, TRACK_NUMBER_KEYS).unwrap_or_default(),
        department: text_field(record, TRACK_DEPARTMENT_KEYS)
            .unwrap_or_else(|| "Unknown".to_string()),
        status_category: text_field(record, TRACK_CATEGORY_KEYS)
            .unwrap_or_else(|| "In Progress".to_string()),
        status_update: text_field(record, TRACK_UPDATE_KEYS).unwrap_or_default(),
        status_order: int_field(record, TRACK_ORDER_KEYS).unwrap_or(0),
        updated_at: date_field(record, TRACK_UPDATED_KEYS).unwrap_or(now),
    }
}

pub fn normalize_status(raw: Option<&str>) -> Status {
    let Some(raw) = raw else {
        return Status::Open;
    };
    let lowered = raw.to_lowercase();
    if ["closed", "complete", "resolved"]
        .iter()
        .any(|needle| lowered.contains(needle))
    {
        return Status::Closed;
    }
    if ["progress", "assigned", "routed"]
        .iter()
        .any(|needle| lowered.contains(needle))
    {
        return Status::InProgress;
    }
    Status::Open
}

fn resolution_outcome(
    created: DateTime<Utc>,
    closed: Option<DateTime<Utc>>,
    expected: i64,
) -> (Option<i64>, Option<bool>) {
    let Some(closed) = closed else {
        return (None, None);
    };
    let days = whole_days_between(created, closed);
    if days < 0 {
        // Clock skew between feed fields; unknown beats a negative duration.
        (None, None)
    } else {
        (Some(days), Some(days <= expected))
    }
}

pub fn whole_days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

fn field<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !value.is_null())
}

fn text_field(record: &Value, keys: &[&str]) -> Option<String> {
    field(record, keys).and_then(|value| match value {
        Value::String(raw) => {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

fn float_field(record: &Value, keys: &[&str]) -> Option<f64> {
    field(record, keys).and_then(|value| match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    })
}

fn int_field(record: &Value, keys: &[&str]) -> Option<i64> {
    field(record, keys).and_then(|value| match value {
        Value::Number(number) => number.as_i64(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    })
}

fn date_field(record: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    text_field(record, keys).and_then(|raw| parse_feed_date(&raw))
}

fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Socrata floating timestamps carry no zone, e.g. 2025-03-04T10:30:00.000.
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&parsed));
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = parsed.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&midnight));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn status_normalization_follows_substring_precedence() {
        assert_eq!(normalize_status(Some("ROUTED")), Status::InProgress);
        assert_eq!(
            normalize_status(Some("Assigned - In Progress")),
            Status::InProgress
        );
        assert_eq!(normalize_status(Some("Work In Progress")), Status::InProgress);
        assert_eq!(
            normalize_status(Some("Resolved - No Action Needed")),
            Status::Closed
        );
        assert_eq!(normalize_status(Some("Request Received")), Status::Open);
        assert_eq!(normalize_status(Some("Totally Novel Label")), Status::Open);
        assert_eq!(normalize_status(None), Status::Open);
    }

    #[test]
    fn aliases_are_tried_in_priority_order() {
        let record = json!({
            "service_request_number": "fallback",
            "servicerequestnumber": "25-100001",
        });
        assert_eq!(
            text_field(&record, REQUEST_NUMBER_KEYS).as_deref(),
            Some("25-100001")
        );

        let renamed = json!({ "service_request_number": "25-200002" });
        assert_eq!(
            text_field(&renamed, REQUEST_NUMBER_KEYS).as_deref(),
            Some("25-200002")
        );

        let empty = json!({ "servicerequestnumber": "   " });
        assert_eq!(text_field(&empty, REQUEST_NUMBER_KEYS), None);
    }

    #[test]
    fn numeric_fields_accept_strings_and_numbers() {
        let record = json!({ "latitude": "47.61", "statusorder": 3 });
        assert_eq!(float_field(&record, LATITUDE_KEYS), Some(47.61));
        assert_eq!(int_field(&record, TRACK_ORDER_KEYS), Some(3));

        let stringly = json!({ "statusorder": "4" });
        assert_eq!(int_field(&stringly, TRACK_ORDER_KEYS), Some(4));
    }

    #[test]
    fn feed_dates_parse_in_all_known_shapes() {
        assert_eq!(
            parse_feed_date("2025-03-04T10:30:00.000"),
            Some(Utc.with_ymd_and_hms(2025, 3, 4, 10, 30, 0).unwrap())
        );
        assert_eq!(
            parse_feed_date("2025-03-04T10:30:00Z"),
            Some(Utc.with_ymd_and_hms(2025, 3, 4, 10, 30, 0).unwrap())
        );
        assert_eq!(
            parse_feed_date("2025-03-04"),
            Some(Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_feed_date("not a date"), None);
    }

    #[test]
    fn whole_days_floor_toward_negative_infinity() {
        let start = noon(2025, 1, 1);
        assert_eq!(whole_days_between(start, start + chrono::Duration::days(3)), 3);
        assert_eq!(whole_days_between(start, start + chrono::Duration::hours(36)), 1);
        assert_eq!(whole_days_between(start, start - chrono::Duration::hours(12)), -1);
    }

    #[test]
    fn mapped_records_get_defaults_for_missing_fields() {
        let now = noon(2025, 6, 15);
        let request = map_request(&json!({}), now);

        assert!(request.request_number.starts_with("SR-"));
        assert_eq!(request.issue_type, "Unknown");
        assert_eq!(request.department, "Unknown Department");
        assert_eq!(request.status, Status::Open);
        assert_eq!(request.created_date, now);
        assert_eq!(request.location, "Seattle, WA");
        assert_eq!(request.expected_resolution_days, sla::DEFAULT_EXPECTED_DAYS);
        assert_eq!(request.actual_resolution_days, None);
        assert_eq!(request.sla_met, None);
    }

    #[test]
    fn closed_records_without_closure_dates_are_estimated() {
        let now = noon(2025, 6, 15);
        let record = json!({
            "servicerequestnumber": "25-100001",
            "webintakeservicerequests": "Pothole",
            "servicerequeststatusname": "Closed",
            "createddate": "2025-02-01T08:00:00.000",
        });
        let request = map_request(&record, now);

        assert_eq!(request.status, Status::Closed);
        assert!(request.closed_date_estimated);
        assert_eq!(
            request.closed_date,
            Some(Utc.with_ymd_and_hms(2025, 2, 4, 8, 0, 0).unwrap())
        );
        assert_eq!(request.actual_resolution_days, Some(3));
        assert_eq!(request.sla_met, Some(true));
    }

    #[test]
    fn explicit_closure_dates_are_preferred_over_estimates() {
        let now = noon(2025, 6, 15);
        let record = json!({
            "webintakeservicerequests": "Pothole",
            "servicerequeststatusname": "Resolved",
            "createddate": "2025-02-01T08:00:00.000",
            "closeddate": "2025-02-06T08:00:00.000",
        });
        let request = map_request(&record, now);

        assert!(!request.closed_date_estimated);
        assert_eq!(request.actual_resolution_days, Some(5));
        assert_eq!(request.sla_met, Some(false));
    }

    #[test]
    fn open_records_leave_resolution_unknown() {
        let now = noon(2025, 6, 15);
        let record = json!({
            "servicerequeststatusname": "Open",
            "createddate": "2025-02-01T08:00:00.000",
            "closeddate": "2025-02-06T08:00:00.000",
        });
        let request = map_request(&record, now);

        assert_eq!(request.status, Status::Open);
        assert_eq!(request.closed_date, None);
        assert_eq!(request.actual_resolution_days, None);
        assert_eq!(request.sla_met, None);
    }

    #[test]
    fn negative_resolution_spans_clamp_to_unknown() {
        let now = noon(2025, 6, 15);
        let record = json!({
            "servicerequeststatusname": "Closed",
            "createddate": "2025-02-10T08:00:00.000",
            "closeddate": "2025-02-01T08:00:00.000",
        });
        let request = map_request(&record, now);

        assert_eq!(request.status, Status::Closed);
        assert_eq!(request.actual_resolution_days, None);
        assert_eq!(request.sla_met, None);
    }

    #[test]
    fn normalized_requests_sort_newest_first() {
        let now = noon(2025, 6, 15);
        let raw = vec![
            json!({ "createddate": "2025-01-05T00:00:00.000" }),
            json!({ "createddate": "2025-03-05T00:00:00.000" }),
            json!({ "createddate": "2025-02-05T00:00:00.000" }),
        ];
        let requests = normalize_requests(&raw, 2025, now).unwrap();
        assert_eq!(
            requests[0].created_date,
            Utc.with_ymd_and_hms(2025, 3, 5, 0, 0, 0).unwrap()
        );
        assert!(requests[0].created_date > requests[1].created_date);
        assert!(requests[1].created_date > requests[2].created_date);
    }

    #[test]
    fn empty_feed_is_an_error() {
        let now = noon(2025, 6, 15);
        assert!(normalize_requests(&[], 2025, now).is_err());
    }

    #[test]
    fn zero_year_match_fails_verification_and_falls_back() {
        let now = noon(2025, 6, 15);
        let raw = vec![json!({
            "servicerequestnumber": "24-000100",
            "createddate": "2024-03-01T00:00:00.000",
            "servicerequeststatusname": "Open",
        })];
        let outcome = normalize_requests(&raw, 2025, now);
        assert!(outcome.is_err());

        let batch = resolve_batch(outcome, Vec::new(), 2025, now, 7);
        assert_eq!(batch.source, DataSource::Sample);
        assert!(batch.error.is_some());
        assert!(!batch.requests.is_empty());
        assert_eq!(batch.sequence, 7);
    }

    #[test]
    fn defaulted_created_dates_do_not_pass_the_year_gate() {
        let now = noon(2025, 6, 15);
        let raw = vec![
            json!({ "servicerequestnumber": "25-000301", "createddate": "soon" }),
            json!({ "servicerequestnumber": "25-000302" }),
        ];
        assert!(normalize_requests(&raw, 2025, now).is_err());
    }

    #[test]
    fn one_reported_date_vouches_for_the_whole_batch() {
        let now = noon(2025, 6, 15);
        let raw = vec![
            json!({
                "servicerequestnumber": "25-000303",
                "createddate": "2025-03-04T10:30:00.000",
            }),
            json!({ "servicerequestnumber": "25-000304", "createddate": "not a date" }),
        ];
        let requests = normalize_requests(&raw, 2025, now).unwrap();
        assert_eq!(requests.len(), 2);
    }

    #[test]
    fn live_outcome_keeps_the_feed_records() {
        let now = noon(2025, 6, 15);
        let raw = vec![json!({
            "servicerequestnumber": "25-000100",
            "createddate": "2025-03-01T00:00:00.000",
            "servicerequeststatusname": "Open",
        })];
        let requests = normalize_requests(&raw, 2025, now);
        let batch = resolve_batch(requests, Vec::new(), 2025, now, 3);

        assert_eq!(batch.source, DataSource::Live);
        assert_eq!(batch.error, None);
        assert_eq!(batch.requests.len(), 1);
        assert_eq!(batch.requests[0].request_number, "25-000100");
    }

    #[test]
    fn tracking_events_map_and_sort_newest_first() {
        let now = noon(2025, 6, 15);
        let raw = vec![
            json!({
                "servicerequestnumber": "25-000001",
                "statuscategory": "Routed",
                "statusupdate": "Routed to SDOT",
                "statusorder": "1",
                "updateddate": "2025-02-01T00:00:00.000",
            }),
            json!({
                "servicerequestnumber": "25-000001",
                "statuscategory": "Assigned",
                "statusorder": 2,
                "updateddate": "2025-02-03T00:00:00.000",
            }),
        ];
        let tracking = normalize_tracking(&raw, now);

        assert_eq!(tracking.len(), 2);
        assert_eq!(tracking[0].status_category, "Assigned");
        assert_eq!(tracking[0].status_order, 2);
        assert_eq!(tracking[1].status_update, "Routed to SDOT");
        assert!(tracking[0].updated_at > tracking[1].updated_at);
    }

    #[test]
    fn refresh_sequences_strictly_increase() {
        let now = noon(2025, 6, 15);
        let first = offline_batch(2025, now);
        let second = offline_batch(2025, now);
        assert!(second.sequence > first.sequence);
    }

    #[test]
    fn soql_params_cover_the_whole_year() {
        let params = soql_params(REQUESTS_DATE_FIELD, 10_000, 2025);
        assert_eq!(params[0].1, "10000");
        assert_eq!(
            params[1].1,
            "createddate between '2025-01-01T00:00:00.000' and '2025-12-31T23:59:59.999'"
        );
        assert_eq!(params[2].1, "createddate DESC");
    }
}
