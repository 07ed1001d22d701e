//! Identifier and timestamp helpers.
//!
//! Identifiers are time-based with a random suffix, so two ids minted in the
//! same millisecond still differ.

use uuid::Uuid;

/// Current time as an RFC 3339 string (UTC).
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn random_suffix(len: usize) -> String {
    let simple = Uuid::new_v4().simple().to_string();
    simple[..len.min(simple.len())].to_string()
}

/// New session or message id: `<millis>-<8 hex chars>`.
pub fn new_id() -> String {
    format!("{}-{}", chrono::Utc::now().timestamp_millis(), random_suffix(8))
}

/// New per-installation identity: `user_<millis>_<6 hex chars>`.
pub fn new_identity() -> String {
    format!(
        "user_{}_{}",
        chrono::Utc::now().timestamp_millis(),
        random_suffix(6)
    )
}

/// Epoch milliseconds as an RFC 3339 string. `None` if out of range.
pub fn millis_to_rfc3339(millis: i64) -> Option<String> {
    chrono::DateTime::from_timestamp_millis(millis).map(|t| t.to_rfc3339())
}
