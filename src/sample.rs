use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::feed;
use crate::models::{ServiceRequest, Status, TrackingEvent};
use crate::sla;

const SAMPLE_REQUEST_COUNT: usize = 600;

const DEPARTMENTS: &[&str] = &[
    "SPD-Seattle Police Department",
    "SDOT-Seattle Department of Transportation",
    "SPU-Seattle Public Utilities",
    "Parks and Recreation",
    "Human Services Department",
    "SCL-Seattle City Light",
    "FAS-Finance and Administrative Services",
];

const REQUEST_TYPES: &[&str] = &[
    "Abandoned Vehicle",
    "Graffiti",
    "Pothole",
    "Parking Enforcement",
    "Unauthorized Encampment",
    "Street Light Out",
    "Illegal Dumping / Needles",
    "Tree Maintenance",
    "Traffic Signal Malfunction",
    "Sidewalk Repair",
    "Water Main Break",
    "General Inquiry - Police Department",
];

const NEIGHBORHOODS: &[&str] = &[
    "Capitol Hill",
    "Ballard",
    "Fremont",
    "Queen Anne",
    "University District",
    "Greenwood",
    "Wallingford",
    "Ravenna",
    "Green Lake",
    "Northgate",
    "Roosevelt",
    "Stevens",
    "Adams",
    "Meadowbrook",
];

const METHODS: &[&str] = &["Find It Fix It Apps", "Citizen Web", "Phone"];

// Every request walks the same intake ladder; hour offsets are measured from
// the created date.
const PROGRESS_LADDER: &[(&str, &str, i64)] = &[
    ("Request Received", "Open", 0),
    ("Routed to Department", "In Progress", 12),
    ("Assigned to Staff", "In Progress", 24),
    ("Work Scheduled", "In Progress", 72),
];

pub fn generate(target_year: i32, now: DateTime<Utc>) -> (Vec<ServiceRequest>, Vec<TrackingEvent>) {
    generate_with(&mut fastrand::Rng::new(), target_year, now)
}

pub fn generate_with(
    rng: &mut fastrand::Rng,
    target_year: i32,
    now: DateTime<Utc>,
) -> (Vec<ServiceRequest>, Vec<TrackingEvent>) {
    let start = Utc
        .with_ymd_and_hms(target_year, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(now);
    let end_of_year = Utc
        .with_ymd_and_hms(target_year, 12, 31, 23, 59, 59)
        .single()
        .unwrap_or(now);
    let end = now.min(end_of_year).max(start);
    let span_days = feed::whole_days_between(start, end);

    let mut requests = Vec::with_capacity(SAMPLE_REQUEST_COUNT);
    let mut tracking = Vec::new();

    for i in 0..SAMPLE_REQUEST_COUNT {
        let issue_type = REQUEST_TYPES[rng.usize(..REQUEST_TYPES.len())].to_string();
        let department = DEPARTMENTS[rng.usize(..DEPARTMENTS.len())].to_string();
        let neighborhood = NEIGHBORHOODS[rng.usize(..NEIGHBORHOODS.len())];
        let expected = sla::expected_resolution_days(&issue_type);

        let offset = if span_days > 0 { rng.i64(0..span_days) } else { 0 };
        let created_date = start + Duration::days(offset);

        let days_open = rng.i64(0..30);
        let closed_date = if rng.f64() > 0.3 {
            let candidate = created_date + Duration::days(days_open);
            (candidate <= end).then_some(candidate)
        } else {
            None
        };

        let status = match closed_date {
            Some(_) => Status::Closed,
            None if rng.f64() > 0.4 => Status::InProgress,
            None => Status::Open,
        };
        let (actual_resolution_days, sla_met) = match closed_date {
            Some(_) => (Some(days_open), Some(days_open <= expected)),
            None => (None, None),
        };

        let request = ServiceRequest {
            request_number: format!("{:02}-{:06}", target_year.rem_euclid(100), 10_000 + i),
            issue_type,
            department,
            status,
            created_date,
            closed_date,
            closed_date_estimated: false,
            method_received: METHODS[rng.usize(..METHODS.len())].to_string(),
            location: format!("{neighborhood}, Seattle, WA"),
            council_district: rng.u32(1..=7).to_string(),
            neighborhood: neighborhood.to_string(),
            zip_code: Some(format!("981{:02}", rng.u32(1..=30))),
            latitude: Some(47.6062 + (rng.f64() - 0.5) * 0.1),
            longitude: Some(-122.3321 + (rng.f64() - 0.5) * 0.1),
            police_precinct: None,
            expected_resolution_days: expected,
            actual_resolution_days,
            sla_met,
        };

        push_progress(&mut tracking, &request, days_open, end);
        requests.push(request);
    }

    requests.sort_by(|a, b| b.created_date.cmp(&a.created_date));
    tracking.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    (requests, tracking)
}

fn push_progress(
    tracking: &mut Vec<TrackingEvent>,
    request: &ServiceRequest,
    days_open: i64,
    end: DateTime<Utc>,
) {
    let mut ladder = PROGRESS_LADDER.to_vec();
    let steps = if request.status == Status::Closed {
        ladder.push(("Work Complete", "Closed", (days_open - 1).max(0) * 24));
        ladder.push(("Verified", "Closed", days_open * 24));
        ladder.len()
    } else {
        // Open and in-progress requests have not reached scheduling yet.
        3
    };

    for (order, (update, category, hours)) in ladder.iter().take(steps).enumerate() {
        let updated_at = request.created_date + Duration::hours(*hours);
        if updated_at <= end {
            tracking.push(TrackingEvent {
                request_number: request.request_number.clone(),
                department: request.department.clone(),
                status_category: (*category).to_string(),
                status_update: (*update).to_string(),
                status_order: order as i64,
                updated_at,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn generates_the_full_demo_population() {
        let mut rng = fastrand::Rng::with_seed(7);
        let (requests, tracking) = generate_with(&mut rng, 2025, fixed_now());
        assert_eq!(requests.len(), SAMPLE_REQUEST_COUNT);
        assert!(!tracking.is_empty());
    }

    #[test]
    fn request_numbers_are_unique_and_year_tagged() {
        let mut rng = fastrand::Rng::with_seed(7);
        let (requests, _) = generate_with(&mut rng, 2025, fixed_now());
        let numbers: HashSet<&str> = requests.iter().map(|r| r.request_number.as_str()).collect();
        assert_eq!(numbers.len(), SAMPLE_REQUEST_COUNT);
        assert!(numbers.iter().all(|n| n.starts_with("25-")));
    }

    #[test]
    fn created_dates_stay_inside_the_target_window() {
        let now = fixed_now();
        let mut rng = fastrand::Rng::with_seed(11);
        let (requests, _) = generate_with(&mut rng, 2025, now);
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert!(requests
            .iter()
            .all(|r| r.created_date >= start && r.created_date <= now));
        assert!(requests
            .windows(2)
            .all(|pair| pair[0].created_date >= pair[1].created_date));
    }

    #[test]
    fn past_years_fill_the_entire_year() {
        let now = fixed_now();
        let mut rng = fastrand::Rng::with_seed(11);
        let (requests, _) = generate_with(&mut rng, 2024, now);
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        assert!(requests
            .iter()
            .all(|r| r.created_date >= start && r.created_date <= end));
        assert!(requests.iter().all(|r| r.request_number.starts_with("24-")));
    }

    #[test]
    fn closure_fields_stay_consistent() {
        let now = fixed_now();
        let mut rng = fastrand::Rng::with_seed(13);
        let (requests, _) = generate_with(&mut rng, 2025, now);
        for request in &requests {
            match request.closed_date {
                Some(closed) => {
                    assert_eq!(request.status, Status::Closed);
                    assert!(closed <= now);
                    assert!(!request.closed_date_estimated);
                    let days = request.actual_resolution_days.unwrap();
                    assert_eq!(
                        request.sla_met,
                        Some(days <= request.expected_resolution_days)
                    );
                }
                None => {
                    assert_ne!(request.status, Status::Closed);
                    assert_eq!(request.actual_resolution_days, None);
                    assert_eq!(request.sla_met, None);
                }
            }
        }
    }

    #[test]
    fn expected_days_come_from_the_sla_table() {
        let mut rng = fastrand::Rng::with_seed(17);
        let (requests, _) = generate_with(&mut rng, 2025, fixed_now());
        for request in &requests {
            assert_eq!(
                request.expected_resolution_days,
                sla::expected_resolution_days(&request.issue_type)
            );
        }
    }

    #[test]
    fn tracking_events_link_back_to_generated_requests() {
        let mut rng = fastrand::Rng::with_seed(19);
        let (requests, tracking) = generate_with(&mut rng, 2025, fixed_now());
        let numbers: HashSet<&str> = requests.iter().map(|r| r.request_number.as_str()).collect();
        assert!(tracking
            .iter()
            .all(|t| numbers.contains(t.request_number.as_str())));
        assert!(tracking
            .windows(2)
            .all(|pair| pair[0].updated_at >= pair[1].updated_at));
    }

    #[test]
    fn closed_requests_reach_verification() {
        let mut rng = fastrand::Rng::with_seed(19);
        let (requests, tracking) = generate_with(&mut rng, 2025, fixed_now());
        let closed = requests
            .iter()
            .find(|r| r.status == Status::Closed && r.closed_date.map_or(false, |c| c <= fixed_now()))
            .unwrap();
        let updates: Vec<&str> = tracking
            .iter()
            .filter(|t| t.request_number == closed.request_number)
            .map(|t| t.status_update.as_str())
            .collect();
        assert!(updates.contains(&"Request Received"));
        assert!(updates.contains(&"Verified"));
    }

    #[test]
    fn same_seed_reproduces_the_same_batch() {
        let now = fixed_now();
        let first = generate_with(&mut fastrand::Rng::with_seed(23), 2025, now);
        let second = generate_with(&mut fastrand::Rng::with_seed(23), 2025, now);
        assert_eq!(first, second);
    }

    #[test]
    fn district_and_zip_values_look_like_seattle() {
        let mut rng = fastrand::Rng::with_seed(29);
        let (requests, _) = generate_with(&mut rng, 2025, fixed_now());
        for request in &requests {
            let district: u32 = request.council_district.parse().unwrap();
            assert!((1..=7).contains(&district));
            assert!(request.zip_code.as_deref().unwrap().starts_with("981"));
        }
    }
}
