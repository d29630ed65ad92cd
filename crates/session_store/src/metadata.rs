//! Structured fields recovered from a session's markdown body.
//!
//! Every rule below is an independent scan over the whole text. A missing
//! section yields an empty value, never an error.

use std::sync::OnceLock;

use regex::Regex;

pub const COMPLETED_MARKER: &str = "### Completed";
pub const IN_PROGRESS_MARKER: &str = "### In Progress";
pub const NOTES_MARKER: &str = "### Notes for Next Session";
pub const CONTEXT_MARKER: &str = "### Context to Load";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionMetadata {
    pub title: Option<String>,
    pub date: Option<String>,
    pub started: Option<String>,
    pub last_updated: Option<String>,
    pub completed: Vec<String>,
    pub in_progress: Vec<String>,
    pub notes: String,
    pub context: String,
}

/// Derived counts reported alongside a session's content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub total_items: usize,
    pub completed_items: usize,
    pub in_progress_items: usize,
    pub line_count: usize,
    pub has_notes: bool,
    pub has_context: bool,
}

impl SessionStats {
    #[must_use]
    pub fn from_content(content: &str) -> Self {
        let metadata = parse_metadata(content);
        let line_count = if content.is_empty() {
            0
        } else {
            content.split('\n').count()
        };

        Self {
            total_items: metadata.completed.len() + metadata.in_progress.len(),
            completed_items: metadata.completed.len(),
            in_progress_items: metadata.in_progress.len(),
            line_count,
            has_notes: !metadata.notes.is_empty(),
            has_context: !metadata.context.is_empty(),
        }
    }
}

struct Patterns {
    title: Regex,
    date: Regex,
    started: Regex,
    last_updated: Regex,
    checked_item: Regex,
    unchecked_item: Regex,
    context: Regex,
}

fn patterns() -> &'static Patterns {
    static CACHED: OnceLock<Patterns> = OnceLock::new();
    CACHED.get_or_init(|| Patterns {
        title: compile(r"(?m)^#\s+(.+)$"),
        date: compile(r"\*\*Date:\*\*\s*([0-9]{4}-[0-9]{2}-[0-9]{2})"),
        started: compile(r"\*\*Started:\*\*\s*([0-9:]+)"),
        last_updated: compile(r"\*\*Last Updated:\*\*\s*([0-9:]+)"),
        checked_item: compile(r"- \[x\]\s*(.+)"),
        unchecked_item: compile(r"- \[ \]\s*(.+)"),
        context: compile(&format!(
            r"{}\s*\n```\n((?s:.*?))```",
            regex::escape(CONTEXT_MARKER)
        )),
    })
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("metadata regex must compile")
}

#[must_use]
pub fn parse_metadata(content: &str) -> SessionMetadata {
    SessionMetadata {
        title: parse_title(content),
        date: parse_date(content),
        started: parse_started(content),
        last_updated: parse_last_updated(content),
        completed: parse_completed(content),
        in_progress: parse_in_progress(content),
        notes: parse_notes(content),
        context: parse_context(content),
    }
}

/// First top-level `# ` heading.
#[must_use]
pub fn parse_title(content: &str) -> Option<String> {
    first_capture(&patterns().title, content)
}

#[must_use]
pub fn parse_date(content: &str) -> Option<String> {
    first_capture(&patterns().date, content)
}

#[must_use]
pub fn parse_started(content: &str) -> Option<String> {
    first_capture(&patterns().started, content)
}

#[must_use]
pub fn parse_last_updated(content: &str) -> Option<String> {
    first_capture(&patterns().last_updated, content)
}

#[must_use]
pub fn parse_completed(content: &str) -> Vec<String> {
    section_body(content, COMPLETED_MARKER)
        .map(|body| checklist_items(&patterns().checked_item, body))
        .unwrap_or_default()
}

#[must_use]
pub fn parse_in_progress(content: &str) -> Vec<String> {
    section_body(content, IN_PROGRESS_MARKER)
        .map(|body| checklist_items(&patterns().unchecked_item, body))
        .unwrap_or_default()
}

#[must_use]
pub fn parse_notes(content: &str) -> String {
    section_body(content, NOTES_MARKER)
        .map(|body| body.trim().to_string())
        .unwrap_or_default()
}

/// Text inside the fenced block that follows the context marker.
#[must_use]
pub fn parse_context(content: &str) -> String {
    first_capture(&patterns().context, content).unwrap_or_default()
}

fn first_capture(regex: &Regex, content: &str) -> Option<String> {
    regex
        .captures(content)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn checklist_items(regex: &Regex, body: &str) -> Vec<String> {
    regex
        .captures_iter(body)
        .filter_map(|captures| captures.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

/// Text after the first `marker` that is followed by a line break, up to the
/// next `###`, the next blank line, or the end of the document.
///
/// Whitespace between the marker and the body is skipped through its last
/// line break, so leading blank lines do not end the section early.
fn section_body<'a>(content: &'a str, marker: &str) -> Option<&'a str> {
    let mut search_from = 0;
    while let Some(found) = content[search_from..].find(marker) {
        let after_marker = search_from + found + marker.len();
        let rest = &content[after_marker..];
        let whitespace_len = rest.len() - rest.trim_start().len();

        if let Some(newline) = rest[..whitespace_len].rfind('\n') {
            let body = &rest[newline + 1..];
            let end = [body.find("###"), body.find("\n\n")]
                .into_iter()
                .flatten()
                .min()
                .unwrap_or(body.len());
            return Some(&body[..end]);
        }

        search_from = after_marker;
    }

    None
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const SAMPLE: &str = "# Session: 2026-02-01
**Date:** 2026-02-01
**Started:** 09:15
**Last Updated:** 11:42

---

## Current State

### Completed
- [x] Wire the alias index
- [x]   Trim whitespace

### In Progress
- [ ] Pagination
- [x] not an in-progress entry

### Notes for Next Session
Check rename rollback.
Then cleanup.

### Context to Load
```
src/store.rs
src/aliases.rs
```
";

    #[test]
    fn empty_content_yields_defaults() {
        assert_eq!(parse_metadata(""), SessionMetadata::default());
        let metadata = parse_metadata("");
        assert_eq!(metadata.title, None);
        assert!(metadata.completed.is_empty());
        assert_eq!(metadata.notes, "");
    }

    #[test]
    fn parses_full_document() {
        let metadata = parse_metadata(SAMPLE);

        assert_eq!(
            metadata,
            SessionMetadata {
                title: Some("Session: 2026-02-01".to_string()),
                date: Some("2026-02-01".to_string()),
                started: Some("09:15".to_string()),
                last_updated: Some("11:42".to_string()),
                completed: vec![
                    "Wire the alias index".to_string(),
                    "Trim whitespace".to_string()
                ],
                in_progress: vec!["Pagination".to_string()],
                notes: "Check rename rollback.\nThen cleanup.".to_string(),
                context: "src/store.rs\nsrc/aliases.rs".to_string(),
            }
        );
    }

    #[test]
    fn title_requires_single_hash_heading() {
        assert_eq!(parse_title("## Not top level\n# Real"), Some("Real".to_string()));
        assert_eq!(parse_title("no heading"), None);
    }

    #[test]
    fn labels_take_first_occurrence() {
        let content = "**Started:** 08:00\n**Started:** 09:00\n**Date:** not-a-date";
        assert_eq!(parse_started(content), Some("08:00".to_string()));
        assert_eq!(parse_date(content), None);
        assert_eq!(parse_last_updated(content), None);
    }

    #[test]
    fn completed_section_stops_at_blank_line() {
        let content = "### Completed\n- [x] one\n\n- [x] outside\n";
        assert_eq!(parse_completed(content), vec!["one".to_string()]);
    }

    #[test]
    fn completed_section_skips_leading_blank_lines() {
        let content = "### Completed\n\n- [x] after gap\n";
        assert_eq!(parse_completed(content), vec!["after gap".to_string()]);
    }

    #[test]
    fn completed_section_stops_at_next_heading() {
        let content = "### Completed\n- [x] one\n### In Progress\n- [ ] two";
        assert_eq!(parse_completed(content), vec!["one".to_string()]);
        assert_eq!(parse_in_progress(content), vec!["two".to_string()]);
    }

    #[test]
    fn empty_sections_yield_empty_values() {
        let content = "### Completed\n### Notes for Next Session\n### In Progress\n- [ ]\n";
        assert!(parse_completed(content).is_empty());
        assert!(parse_in_progress(content).is_empty());
        assert_eq!(parse_notes(content), "");
    }

    #[test]
    fn duplicate_markers_use_first_occurrence() {
        let content = "### Notes for Next Session\nfirst\n\n### Notes for Next Session\nsecond\n";
        assert_eq!(parse_notes(content), "first");
    }

    #[test]
    fn marker_without_line_break_is_skipped() {
        let content = "### Notes for Next Session (old)\nignored\n\n### Notes for Next Session\nkept";
        assert_eq!(parse_notes(content), "kept");
    }

    #[test]
    fn context_requires_fenced_block() {
        assert_eq!(parse_context("### Context to Load\nplain text\n"), "");
        assert_eq!(
            parse_context("### Context to Load\n```\n  a.rs\n```"),
            "a.rs".to_string()
        );
    }

    #[test]
    fn stats_count_items_and_lines() {
        let stats = SessionStats::from_content(SAMPLE);
        assert_eq!(stats.completed_items, 2);
        assert_eq!(stats.in_progress_items, 1);
        assert_eq!(stats.total_items, 3);
        assert_eq!(stats.line_count, SAMPLE.split('\n').count());
        assert!(stats.has_notes);
        assert!(stats.has_context);

        assert_eq!(SessionStats::from_content(""), SessionStats::default());
    }

    #[test]
    fn context_block_follows_marker_constant() {
        let content = format!("{CONTEXT_MARKER}\n```\nsrc/lib.rs\n```\n");
        assert_eq!(parse_context(&content), "src/lib.rs");
        assert_eq!(parse_context("### Context\n```\nsrc/lib.rs\n```\n"), "");
    }
}
