use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Closed,
}

impl Status {
    pub fn is_closed(self) -> bool {
        matches!(self, Status::Closed)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Status::Open => "Open",
            Status::InProgress => "In Progress",
            Status::Closed => "Closed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceRequest {
    pub request_number: String,
    pub issue_type: String,
    pub department: String,
    pub status: Status,
    pub created_date: DateTime<Utc>,
    pub closed_date: Option<DateTime<Utc>>,
    pub closed_date_estimated: bool,
    pub method_received: String,
    pub location: String,
    pub council_district: String,
    pub neighborhood: String,
    pub zip_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub police_precinct: Option<String>,
    pub expected_resolution_days: i64,
    pub actual_resolution_days: Option<i64>,
    pub sla_met: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingEvent {
    pub request_number: String,
    pub department: String,
    pub status_category: String,
    pub status_update: String,
    pub status_order: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataSource {
    Live,
    Sample,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DataSource::Live => "Seattle Open Data Portal (live)",
            DataSource::Sample => "generated sample data (demo)",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct DataBatch {
    pub requests: Vec<ServiceRequest>,
    pub tracking: Vec<TrackingEvent>,
    pub source: DataSource,
    pub error: Option<String>,
    pub target_year: i32,
    pub fetched_at: DateTime<Utc>,
    /// Monotonic refresh tag: of two settled batches, the higher sequence is
    /// authoritative and the other should be discarded.
    pub sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentStats {
    pub department: String,
    pub total: usize,
    pub open: usize,
    pub in_progress: usize,
    pub closed: usize,
    pub avg_resolution_days: Option<i64>,
    pub min_resolution_days: Option<i64>,
    pub max_resolution_days: Option<i64>,
    pub sla_compliance_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueTypeStats {
    pub issue_type: String,
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    pub avg_resolution_days: Option<f64>,
    pub expected_resolution_days: i64,
    pub completion_pct: f64,
    pub sla_compliance_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyStats {
    pub year: i32,
    pub month: u32,
    pub total: usize,
    pub open: usize,
    pub in_progress: usize,
    pub closed: usize,
    pub avg_resolution_days: Option<i64>,
}

impl MonthlyStats {
    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(date) => date.format("%b %Y").to_string(),
            None => format!("{}-{:02}", self.year, self.month),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictStats {
    pub district: String,
    pub total: usize,
    pub share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacklogEntry {
    pub request: ServiceRequest,
    pub days_open: i64,
    pub expected_days: i64,
    pub past_due: bool,
    pub urgency_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsightKind {
    Seasonal,
    Bottleneck,
    Geographic,
    PredictiveBacklog,
    SlaCompliance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Impact {
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Impact::Medium => "Medium",
            Impact::High => "High",
            Impact::Critical => "Critical",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub impact: Impact,
    pub actions: Vec<String>,
}
