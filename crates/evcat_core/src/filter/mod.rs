use crate::domain::CanonicalRecord;

/// Literal placeholder the generation service emits for missing values.
pub const NULL_TOKEN: &str = "null";

fn is_null_equivalent(value: &str) -> bool {
    value.is_empty() || value == NULL_TOKEN
}

/// Remove keys whose value is empty or the exact `"null"` token.
pub fn filter_empty(record: &CanonicalRecord) -> CanonicalRecord {
    record
        .iter()
        .filter(|(_, v)| !is_null_equivalent(v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Filter a record and report `None` ("no valid evidence") when nothing survives.
pub fn retain_evidence(record: &CanonicalRecord) -> Option<CanonicalRecord> {
    let filtered = filter_empty(record);
    if filtered.is_empty() {
        None
    } else {
        Some(filtered)
    }
}
