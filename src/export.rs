use std::path::Path;

use anyhow::Context;

use crate::models::ServiceRequest;

// Must match the ServiceRequest field order.
const CSV_HEADERS: [&str; 18] = [
    "request_number",
    "issue_type",
    "department",
    "status",
    "created_date",
    "closed_date",
    "closed_date_estimated",
    "method_received",
    "location",
    "council_district",
    "neighborhood",
    "zip_code",
    "latitude",
    "longitude",
    "police_precinct",
    "expected_resolution_days",
    "actual_resolution_days",
    "sla_met",
];

pub fn write_requests_csv(path: &Path, requests: &[ServiceRequest]) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    // Written up front so an empty batch still yields a header row.
    writer
        .write_record(CSV_HEADERS)
        .context("failed to write CSV header")?;
    for request in requests {
        writer
            .serialize(request)
            .with_context(|| format!("failed to encode request {}", request.request_number))?;
    }

    writer.flush().context("failed to flush CSV output")?;
    Ok(())
}
