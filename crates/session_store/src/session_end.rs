use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::clock::{date_string, time_string};
use crate::error::SessionStoreError;
use crate::filename::{encode_session_filename, is_valid_short_id, MIN_SHORT_ID_LEN};
use crate::fs_io::write_text;
use crate::store::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEndOutcome {
    Created(PathBuf),
    Updated(PathBuf),
}

impl SessionEndOutcome {
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Created(path) | Self::Updated(path) => path,
        }
    }
}

fn last_updated_line_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"\*\*Last Updated:\*\*.*").expect("last-updated regex must compile")
    })
}

/// Skeleton written the first time a session ends on a given day.
#[must_use]
pub fn session_template(date: &str, clock_time: &str) -> String {
    format!(
        "# Session: {date}
**Date:** {date}
**Started:** {clock_time}
**Last Updated:** {clock_time}

---

## Current State

[Session context goes here]

### Completed
- [ ]

### In Progress
- [ ]

### Notes for Next Session
-

### Context to Load
```
[relevant files]
```
"
    )
}

/// Short id for a new session file.
///
/// Uses the tail of the host's session identifier when it has enough
/// filename-safe characters, otherwise a random one.
#[must_use]
pub fn derive_short_id(session_id: Option<&str>) -> String {
    if let Some(session_id) = session_id {
        let safe = session_id
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect::<Vec<_>>();
        if safe.len() >= MIN_SHORT_ID_LEN {
            let tail = safe[safe.len() - MIN_SHORT_ID_LEN..].iter().collect::<String>();
            if is_valid_short_id(&tail) {
                return tail;
            }
        }
    }

    Uuid::new_v4().simple().to_string()[..MIN_SHORT_ID_LEN].to_string()
}

impl SessionStore {
    /// Creates today's file for `short_id` from the template, or bumps its
    /// `**Last Updated:**` line when it already exists.
    pub fn record_session_end(
        &self,
        short_id: &str,
        now: OffsetDateTime,
    ) -> Result<SessionEndOutcome, SessionStoreError> {
        if !is_valid_short_id(short_id) {
            return Err(SessionStoreError::InvalidShortId(short_id.to_string()));
        }

        let date = date_string(now)?;
        let clock_time = time_string(now)?;
        let path = self.session_path(&encode_session_filename(&date, Some(short_id)));

        if self.exists(&path) {
            let content = fs::read_to_string(&path)
                .map_err(|source| SessionStoreError::io("reading session file", &path, source))?;
            let updated = last_updated_line_regex()
                .replace(&content, format!("**Last Updated:** {clock_time}").as_str());
            write_text(&path, &updated)?;
            tracing::debug!(path = %path.display(), "updated session file");
            return Ok(SessionEndOutcome::Updated(path));
        }

        write_text(&path, &session_template(&date, &clock_time))?;
        tracing::debug!(path = %path.display(), "created session file");
        Ok(SessionEndOutcome::Created(path))
    }
}

#[cfg(test)]
mod tests {
    use crate::metadata::parse_metadata;

    use super::*;

    #[test]
    fn template_parses_back_into_metadata() {
        let metadata = parse_metadata(&session_template("2026-02-01", "09:15"));

        assert_eq!(metadata.title.as_deref(), Some("Session: 2026-02-01"));
        assert_eq!(metadata.date.as_deref(), Some("2026-02-01"));
        assert_eq!(metadata.started.as_deref(), Some("09:15"));
        assert_eq!(metadata.last_updated.as_deref(), Some("09:15"));
        assert!(metadata.completed.is_empty());
        assert!(metadata.in_progress.is_empty());
        assert_eq!(metadata.notes, "-");
        assert_eq!(metadata.context, "[relevant files]");
    }

    #[test]
    fn short_id_uses_session_identifier_tail() {
        assert_eq!(
            derive_short_id(Some("3F2A-11EE-9C0B-A1B2C3D4")),
            "a1b2c3d4"
        );
    }

    #[test]
    fn short_id_falls_back_to_random() {
        for input in [None, Some(""), Some("abc")] {
            let id = derive_short_id(input);
            assert!(is_valid_short_id(&id), "{id} should be a valid short id");
            assert_eq!(id.len(), MIN_SHORT_ID_LEN);
        }
    }
}
