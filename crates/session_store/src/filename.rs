use std::sync::OnceLock;

use regex::Regex;

/// Short id reported for files written before per-session ids existed.
pub const NO_ID: &str = "no-id";
pub const SESSION_SUFFIX: &str = "-session.tmp";
pub const MIN_SHORT_ID_LEN: usize = 8;

fn session_filename_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"^([0-9]{4}-[0-9]{2}-[0-9]{2})(?:-([a-z0-9]{8,}))?-session\.tmp$")
            .expect("session filename regex must compile")
    })
}

/// Identity recovered from a session filename alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFileName {
    pub filename: String,
    pub date: String,
    pub short_id: String,
}

impl SessionFileName {
    #[must_use]
    pub fn is_legacy(&self) -> bool {
        self.short_id == NO_ID
    }
}

/// Builds `YYYY-MM-DD-<shortId>-session.tmp`, or the legacy form when no id
/// (or the sentinel) is given.
#[must_use]
pub fn encode_session_filename(date: &str, short_id: Option<&str>) -> String {
    match short_id {
        Some(id) if id != NO_ID => format!("{date}-{id}{SESSION_SUFFIX}"),
        _ => format!("{date}{SESSION_SUFFIX}"),
    }
}

#[must_use]
pub fn decode_session_filename(filename: &str) -> Option<SessionFileName> {
    let captures = session_filename_regex().captures(filename)?;
    let date = captures.get(1)?.as_str().to_string();
    let short_id = captures
        .get(2)
        .map_or_else(|| NO_ID.to_string(), |m| m.as_str().to_string());

    Some(SessionFileName {
        filename: filename.to_string(),
        date,
        short_id,
    })
}

/// Whether `candidate` could be embedded in a filename and decoded back.
#[must_use]
pub fn is_valid_short_id(candidate: &str) -> bool {
    candidate.len() >= MIN_SHORT_ID_LEN
        && candidate
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}
