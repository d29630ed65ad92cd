use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::error::SessionStoreError;

/// Local wall-clock time, falling back to UTC when the offset is unknown.
#[must_use]
pub fn now_local() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

pub fn now_rfc3339() -> Result<String, SessionStoreError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(SessionStoreError::ClockFormat)
}

#[must_use]
pub fn parse_rfc3339(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).ok()
}

/// `YYYY-MM-DD`
pub fn date_string(at: OffsetDateTime) -> Result<String, SessionStoreError> {
    at.format(format_description!("[year]-[month]-[day]"))
        .map_err(SessionStoreError::ClockFormat)
}

/// `HH:MM`
pub fn time_string(at: OffsetDateTime) -> Result<String, SessionStoreError> {
    at.format(format_description!("[hour]:[minute]"))
        .map_err(SessionStoreError::ClockFormat)
}
