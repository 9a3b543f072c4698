use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use trackr_core::enums::AuditAction;

/// Parse a snake_case enum value using serde-deserialization.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let normalized = raw.trim().replace('-', "_");
    let json = format!("\"{normalized}\"");
    serde_json::from_str(&json).map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}

/// Audit actions are stored upper-case (`STATUS_CHANGE`); accept any case.
pub fn parse_action(raw: &str) -> anyhow::Result<AuditAction> {
    parse_enum(&raw.to_uppercase(), "action")
}

/// Accept a full RFC 3339 timestamp or a bare date (midnight UTC).
pub fn parse_due_date(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("invalid due date '{raw}': expected YYYY-MM-DD or RFC 3339"))?;
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| anyhow::anyhow!("invalid due date '{raw}'"))
}
