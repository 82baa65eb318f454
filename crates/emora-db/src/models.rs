//! Database row types. These map directly to SQLite rows and stay as plain
//! strings; conversion to the typed models happens in emora-core.

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub age: i64,
    pub dob: String,
    pub guardian_email: Option<String>,
    pub guardian_phone: Option<String>,
    pub username: String,
    pub password_hash: String,
    pub created_at: String,
}

pub struct ChatRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub category: String,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub chat_id: String,
    pub role: String,
    pub content: String,
    pub created_at: String,
}

/// Fixed-width UTC text that sorts lexically in time order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time at the precision `format_timestamp` keeps, so a value
/// handed back to a caller equals the one read from disk later.
pub fn now_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Parses stored timestamps. Rows written by older builds carry no offset
/// and are read as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| anyhow!("invalid timestamp {:?}: {}", raw, e))
}
