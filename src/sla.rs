pub const DEFAULT_EXPECTED_DAYS: i64 = 5;

// Checked in order: specific entries must come before their shorter prefixes.
const SLA_TARGETS: &[(&str, i64)] = &[
    ("Abandoned Vehicle", 3),
    ("Graffiti", 7),
    ("Pothole", 3),
    ("Parking Enforcement", 1),
    ("Unauthorized Encampment", 5),
    ("Encampment", 5),
    ("Street Light", 5),
    ("Illegal Dumping", 7),
    ("Dumping", 7),
    ("Tree Maintenance", 14),
    ("Tree", 14),
    ("Traffic Signal", 2),
    ("Street Sign", 5),
    ("Sign", 5),
    ("Park Maintenance", 10),
    ("Park", 10),
    ("Sidewalk", 14),
    ("Water Main", 1),
    ("Sewer", 2),
    ("Noise Complaint", 2),
    ("General Inquiry", 3),
];

pub fn expected_resolution_days(issue_type: &str) -> i64 {
    if issue_type.is_empty() {
        return DEFAULT_EXPECTED_DAYS;
    }

    for (name, days) in SLA_TARGETS {
        if *name == issue_type {
            return *days;
        }
    }

    let lowered = issue_type.to_lowercase();
    for (name, days) in SLA_TARGETS {
        if lowered.contains(&name.to_lowercase()) {
            return *days;
        }
    }

    DEFAULT_EXPECTED_DAYS
}
