use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// One recorded command execution, as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    #[serde(skip)]
    pub id: i64,
    pub command: String,
    pub directory: String,
    pub timestamp: DateTime<Utc>,
    pub exit_code: i32,
    pub hostname: String,
    pub process_id: i64,
}

/// Parameters for recording one history entry.
///
/// `timestamp = None` lets the store stamp the row with its insertion time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub command: String,
    pub directory: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub exit_code: i32,
    pub hostname: String,
    pub process_id: i64,
}

/// Fixed-width UTC text form used in the `timestamp` column. Six fractional
/// digits keep lexical order identical to chronological order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Parse a stored timestamp.
///
/// Besides the native [`format_timestamp`] shape this accepts the
/// `YYYY-MM-DD HH:MM:SS[.f][±hh:mm]` forms left behind by `CURRENT_TIMESTAMP`
/// defaults and by older writers, so existing databases stay readable.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
