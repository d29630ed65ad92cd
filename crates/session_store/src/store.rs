use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::filename::{decode_session_filename, SessionFileName, NO_ID};
use crate::fs_io::{append_text, read_text, write_text};
use crate::metadata::{parse_metadata, SessionMetadata, SessionStats};
use crate::paths::StorePaths;

pub const DEFAULT_LIST_LIMIT: usize = 50;
pub const UNTITLED_SESSION: &str = "Untitled Session";

/// Filters and pagination for [`SessionStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub date: Option<String>,
    /// Substring matched against the short id.
    pub search: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            date: None,
            search: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

impl ListQuery {
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub filename: String,
    pub date: String,
    pub short_id: String,
    pub path: PathBuf,
    pub size: u64,
    pub has_content: bool,
    pub modified: SystemTime,
    pub created: Option<SystemTime>,
    /// Present only when requested from [`SessionStore::get_by_id`].
    pub contents: Option<SessionContents>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContents {
    pub content: String,
    pub metadata: SessionMetadata,
    pub stats: SessionStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPage {
    pub records: Vec<SessionRecord>,
    /// Size of the filtered set before pagination.
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
}

type IdMatcher = fn(&SessionRecord, &str) -> bool;

/// Id resolution rules in precedence order. Each rule is tried against the
/// whole directory before the next one is consulted.
const ID_MATCHERS: [IdMatcher; 3] = [
    matches_short_id_prefix,
    matches_filename,
    matches_legacy_date,
];

fn matches_short_id_prefix(record: &SessionRecord, id: &str) -> bool {
    record.short_id != NO_ID && record.short_id.starts_with(id)
}

fn matches_filename(record: &SessionRecord, id: &str) -> bool {
    record.filename == id || record.filename == format!("{id}.tmp")
}

fn matches_legacy_date(record: &SessionRecord, id: &str) -> bool {
    record.short_id == NO_ID && record.filename == format!("{id}-session.tmp")
}

/// CRUD and listing over the directory of markdown session files.
///
/// Single-file operations report failure as `false`/`None` and log the cause;
/// a `false` always means nothing was changed by that call.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions_dir: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(paths: &StorePaths) -> Self {
        Self::at(paths.sessions_dir.clone())
    }

    #[must_use]
    pub fn at(sessions_dir: impl Into<PathBuf>) -> Self {
        Self {
            sessions_dir: sessions_dir.into(),
        }
    }

    #[must_use]
    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    #[must_use]
    pub fn session_path(&self, filename: &str) -> PathBuf {
        self.sessions_dir.join(filename)
    }

    #[must_use]
    pub fn list(&self, query: &ListQuery) -> SessionPage {
        let mut records = self
            .scan()
            .into_iter()
            .filter(|record| {
                query
                    .date
                    .as_deref()
                    .map_or(true, |date| record.date == date)
            })
            .filter(|record| {
                query
                    .search
                    .as_deref()
                    .map_or(true, |search| record.short_id.contains(search))
            })
            .collect::<Vec<_>>();
        sort_newest_first(&mut records);

        let total = records.len();
        let records = records
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();

        SessionPage {
            records,
            total,
            offset: query.offset,
            limit: query.limit,
            has_more: query.offset.saturating_add(query.limit) < total,
        }
    }

    /// Looks a session up by short-id prefix, exact filename, or legacy date.
    ///
    /// Within one rule the most recently modified file wins.
    #[must_use]
    pub fn get_by_id(&self, id: &str, include_content: bool) -> Option<SessionRecord> {
        let id = id.trim();
        if id.is_empty() {
            return None;
        }

        let mut records = self.scan();
        sort_newest_first(&mut records);

        let index = ID_MATCHERS
            .iter()
            .find_map(|matcher| records.iter().position(|record| matcher(record, id)))?;
        let mut record = records.swap_remove(index);

        if include_content {
            let content = self.content(&record.path).unwrap_or_default();
            record.contents = Some(SessionContents {
                metadata: parse_metadata(&content),
                stats: SessionStats::from_content(&content),
                content,
            });
        }

        Some(record)
    }

    /// Sessions modified within `max_age`, newest first.
    #[must_use]
    pub fn recent(&self, max_age: Duration) -> Vec<SessionRecord> {
        let now = SystemTime::now();
        let mut records = self
            .scan()
            .into_iter()
            .filter(|record| {
                now.duration_since(record.modified)
                    .map_or(true, |age| age <= max_age)
            })
            .collect::<Vec<_>>();
        sort_newest_first(&mut records);
        records
    }

    #[must_use]
    pub fn content(&self, path: &Path) -> Option<String> {
        read_text(path)
    }

    #[must_use]
    pub fn stats(&self, path: &Path) -> SessionStats {
        SessionStats::from_content(&self.content(path).unwrap_or_default())
    }

    #[must_use]
    pub fn title(&self, path: &Path) -> String {
        self.content(path)
            .and_then(|content| parse_metadata(&content).title)
            .unwrap_or_else(|| UNTITLED_SESSION.to_string())
    }

    #[must_use]
    pub fn size_label(&self, path: &Path) -> String {
        fs::metadata(path)
            .map(|metadata| format_size(metadata.len()))
            .unwrap_or_else(|_| format_size(0))
    }

    pub fn write(&self, path: &Path, content: &str) -> bool {
        match write_text(path, content) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(%error, "failed to write session");
                false
            }
        }
    }

    pub fn append(&self, path: &Path, content: &str) -> bool {
        match append_text(path, content) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(%error, "failed to append to session");
                false
            }
        }
    }

    /// Removes the file; `false` when it did not exist or could not be removed.
    pub fn delete(&self, path: &Path) -> bool {
        if !path.exists() {
            return false;
        }

        match fs::remove_file(path) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "failed to delete session");
                false
            }
        }
    }

    #[must_use]
    pub fn exists(&self, path: &Path) -> bool {
        fs::metadata(path).is_ok_and(|metadata| metadata.is_file())
    }

    fn scan(&self) -> Vec<SessionRecord> {
        let entries = match fs::read_dir(&self.sessions_dir) {
            Ok(entries) => entries,
            Err(error) => {
                tracing::debug!(
                    dir = %self.sessions_dir.display(),
                    %error,
                    "sessions directory not readable"
                );
                return Vec::new();
            }
        };

        entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
            .filter_map(|entry| {
                let filename = entry.file_name().into_string().ok()?;
                let decoded = decode_session_filename(&filename)?;
                let path = entry.path();
                match entry.metadata() {
                    Ok(metadata) => Some(record_from(decoded, path, &metadata)),
                    Err(error) => {
                        tracing::debug!(path = %path.display(), %error, "skipping session entry");
                        None
                    }
                }
            })
            .collect()
    }
}

fn record_from(decoded: SessionFileName, path: PathBuf, metadata: &fs::Metadata) -> SessionRecord {
    let size = metadata.len();
    SessionRecord {
        filename: decoded.filename,
        date: decoded.date,
        short_id: decoded.short_id,
        path,
        size,
        has_content: size > 0,
        modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        created: metadata.created().ok(),
        contents: None,
    }
}

fn sort_newest_first(records: &mut [SessionRecord]) {
    records.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| a.filename.cmp(&b.filename))
    });
}

#[must_use]
pub fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;

    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(filename: &str) -> SessionRecord {
        let decoded = decode_session_filename(filename).expect("test filename decodes");
        SessionRecord {
            filename: decoded.filename,
            date: decoded.date,
            short_id: decoded.short_id,
            path: PathBuf::from(filename),
            size: 0,
            has_content: false,
            modified: SystemTime::UNIX_EPOCH,
            created: None,
            contents: None,
        }
    }

    #[test]
    fn short_id_prefix_ignores_legacy_records() {
        let legacy = record("2026-02-01-session.tmp");
        let current = record("2026-02-01-a1b2c3d4-session.tmp");

        assert!(!matches_short_id_prefix(&legacy, "no"));
        assert!(matches_short_id_prefix(&current, "a1b2"));
        assert!(!matches_short_id_prefix(&current, "b2"));
    }

    #[test]
    fn filename_matcher_accepts_name_with_or_without_extension() {
        let current = record("2026-02-01-a1b2c3d4-session.tmp");

        assert!(matches_filename(&current, "2026-02-01-a1b2c3d4-session.tmp"));
        assert!(matches_filename(&current, "2026-02-01-a1b2c3d4-session"));
        assert!(!matches_filename(&current, "2026-02-01"));
    }

    #[test]
    fn legacy_date_matcher_only_applies_to_sentinel_records() {
        let legacy = record("2026-02-01-session.tmp");
        let current = record("2026-02-01-a1b2c3d4-session.tmp");

        assert!(matches_legacy_date(&legacy, "2026-02-01"));
        assert!(!matches_legacy_date(&current, "2026-02-01"));
    }

    #[test]
    fn size_labels() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
