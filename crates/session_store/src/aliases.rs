use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use crate::atomic::AtomicFile;
use crate::clock::{now_rfc3339, parse_rfc3339};
use crate::error::{AliasError, SessionStoreError};
use crate::paths::StorePaths;

pub const ALIAS_VERSION: &str = "1.0";
pub const RESERVED_ALIASES: [&str; 6] = ["list", "help", "remove", "delete", "create", "set"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub session_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AliasMetadata {
    pub total_count: usize,
    pub last_updated: Option<String>,
}

/// The whole alias file. `metadata` is rewritten on every save.
///
/// Only `aliases` is required; a null or malformed `version` or `metadata`
/// falls back to its default instead of rejecting the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasDocument {
    #[serde(default = "default_version", deserialize_with = "lenient_version")]
    pub version: String,
    pub aliases: BTreeMap<String, AliasEntry>,
    #[serde(default, deserialize_with = "lenient_metadata")]
    pub metadata: AliasMetadata,
}

fn default_version() -> String {
    ALIAS_VERSION.to_string()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_version<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(version)) if !version.is_empty() => version,
        _ => default_version(),
    })
}

fn lenient_metadata<'de, D>(deserializer: D) -> Result<AliasMetadata, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default())
}

impl Default for AliasDocument {
    fn default() -> Self {
        Self {
            version: default_version(),
            aliases: BTreeMap::new(),
            metadata: AliasMetadata::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub name: String,
    pub session_path: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub title: Option<String>,
}

impl Alias {
    fn from_entry(name: &str, entry: &AliasEntry) -> Self {
        Self {
            name: name.to_string(),
            session_path: entry.session_path.clone(),
            created_at: entry.created_at.clone(),
            updated_at: entry.updated_at.clone(),
            title: entry.title.clone(),
        }
    }

    fn recency(&self) -> OffsetDateTime {
        self.updated_at
            .as_deref()
            .and_then(parse_rfc3339)
            .or_else(|| parse_rfc3339(&self.created_at))
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasSet {
    pub alias: Alias,
    pub is_new: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasDeleted {
    pub name: String,
    pub session_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRenamed {
    pub old_name: String,
    pub new_name: String,
    pub session_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub total_checked: usize,
    pub removed: usize,
    pub removed_aliases: Vec<AliasDeleted>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasQuery {
    /// Case-insensitive substring of the name or title.
    pub search: Option<String>,
    /// `None` or `Some(0)` returns everything.
    pub limit: Option<usize>,
}

/// `^[a-zA-Z0-9_-]+$`
#[must_use]
pub fn is_well_formed_alias(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

pub fn validate_alias_name(name: &str) -> Result<(), AliasError> {
    if name.is_empty() {
        return Err(AliasError::EmptyName);
    }
    if !is_well_formed_alias(name) {
        return Err(AliasError::InvalidName(name.to_string()));
    }
    let lowered = name.to_ascii_lowercase();
    if RESERVED_ALIASES.contains(&lowered.as_str()) {
        return Err(AliasError::ReservedName(name.to_string()));
    }
    Ok(())
}

/// Short names for session paths, kept in one JSON document.
///
/// Every mutation loads the document, changes it, and writes it back through
/// [`AtomicFile`]. The index never checks that a session path exists.
#[derive(Debug, Clone)]
pub struct AliasIndex {
    file: AtomicFile,
}

impl AliasIndex {
    #[must_use]
    pub fn new(paths: &StorePaths) -> Self {
        Self::at(paths.aliases_path())
    }

    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            file: AtomicFile::new(path),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Current document, or an empty one when the file is absent or unparsable.
    #[must_use]
    pub fn load(&self) -> AliasDocument {
        let Some(content) = self.file.read() else {
            return AliasDocument::default();
        };
        if content.trim().is_empty() {
            return AliasDocument::default();
        }

        match serde_json::from_str::<AliasDocument>(&content) {
            Ok(mut document) => {
                if document.metadata.last_updated.is_none() {
                    document.metadata.total_count = document.aliases.len();
                }
                document
            }
            Err(error) => {
                tracing::warn!(path = %self.path().display(), %error, "invalid aliases file, starting empty");
                AliasDocument::default()
            }
        }
    }

    fn save(&self, document: &mut AliasDocument) -> Result<(), SessionStoreError> {
        document.metadata = AliasMetadata {
            total_count: document.aliases.len(),
            last_updated: Some(now_rfc3339()?),
        };
        let json = serde_json::to_string_pretty(document)
            .map_err(|source| SessionStoreError::json_serialize(self.path(), source))?;
        self.file.write(json.as_bytes())
    }

    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Alias> {
        if !is_well_formed_alias(name) {
            return None;
        }

        self.load()
            .aliases
            .get(name)
            .map(|entry| Alias::from_entry(name, entry))
    }

    /// Alias target when `alias_or_id` names an alias, otherwise the input.
    #[must_use]
    pub fn resolve_session(&self, alias_or_id: &str) -> String {
        self.resolve(alias_or_id)
            .map_or_else(|| alias_or_id.to_string(), |alias| alias.session_path)
    }

    pub fn set(
        &self,
        name: &str,
        session_path: &str,
        title: Option<&str>,
    ) -> Result<AliasSet, AliasError> {
        validate_alias_name(name)?;

        let mut document = self.load();
        let existing = document.aliases.get(name);
        let is_new = existing.is_none();
        let now = now_rfc3339()?;
        let entry = AliasEntry {
            session_path: session_path.to_string(),
            created_at: existing.map_or_else(|| now.clone(), |e| e.created_at.clone()),
            updated_at: Some(later_of(existing.and_then(|e| e.updated_at.as_deref()), now)),
            title: title.filter(|t| !t.is_empty()).map(str::to_string),
        };
        let alias = Alias::from_entry(name, &entry);
        document.aliases.insert(name.to_string(), entry);

        self.save(&mut document)?;
        Ok(AliasSet { alias, is_new })
    }

    /// Aliases ordered by most recent update, then filtered and truncated.
    #[must_use]
    pub fn list(&self, query: &AliasQuery) -> Vec<Alias> {
        let mut aliases = self
            .load()
            .aliases
            .iter()
            .map(|(name, entry)| Alias::from_entry(name, entry))
            .collect::<Vec<_>>();
        aliases.sort_by_key(|alias| Reverse(alias.recency()));

        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            aliases.retain(|alias| {
                alias.name.to_lowercase().contains(&needle)
                    || alias
                        .title
                        .as_deref()
                        .is_some_and(|title| title.to_lowercase().contains(&needle))
            });
        }

        if let Some(limit) = query.limit.filter(|limit| *limit > 0) {
            aliases.truncate(limit);
        }

        aliases
    }

    pub fn delete(&self, name: &str) -> Result<AliasDeleted, AliasError> {
        let mut document = self.load();
        let removed = document
            .aliases
            .remove(name)
            .ok_or_else(|| AliasError::NotFound(name.to_string()))?;

        self.save(&mut document)?;
        Ok(AliasDeleted {
            name: name.to_string(),
            session_path: removed.session_path,
        })
    }

    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<AliasRenamed, AliasError> {
        let mut document = self.load();
        if !document.aliases.contains_key(old_name) {
            return Err(AliasError::NotFound(old_name.to_string()));
        }
        if document.aliases.contains_key(new_name) {
            return Err(AliasError::AlreadyExists(new_name.to_string()));
        }
        validate_alias_name(new_name)?;

        let now = now_rfc3339()?;
        let Some(mut entry) = document.aliases.remove(old_name) else {
            return Err(AliasError::NotFound(old_name.to_string()));
        };
        let previous = entry.clone();
        entry.updated_at = Some(later_of(entry.updated_at.as_deref(), now));
        let session_path = entry.session_path.clone();
        document.aliases.insert(new_name.to_string(), entry);

        if let Err(error) = self.save(&mut document) {
            // The file still holds the old name; keep the loaded copy in step.
            document.aliases.remove(new_name);
            document.aliases.insert(old_name.to_string(), previous);
            return Err(error.into());
        }

        Ok(AliasRenamed {
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
            session_path,
        })
    }

    pub fn update_title(&self, name: &str, title: Option<&str>) -> Result<Alias, AliasError> {
        let mut document = self.load();
        let now = now_rfc3339()?;
        let entry = document
            .aliases
            .get_mut(name)
            .ok_or_else(|| AliasError::NotFound(name.to_string()))?;
        entry.title = title.map(str::to_string);
        entry.updated_at = Some(later_of(entry.updated_at.as_deref(), now));
        let alias = Alias::from_entry(name, entry);

        self.save(&mut document)?;
        Ok(alias)
    }

    #[must_use]
    pub fn aliases_for_session(&self, session_path: &str) -> Vec<Alias> {
        self.load()
            .aliases
            .iter()
            .filter(|(_, entry)| entry.session_path == session_path)
            .map(|(name, entry)| Alias::from_entry(name, entry))
            .collect()
    }

    /// Drops every alias whose session no longer exists, saving once.
    pub fn cleanup<F>(&self, session_exists: F) -> Result<CleanupReport, AliasError>
    where
        F: Fn(&str) -> bool,
    {
        let mut document = self.load();
        let total_checked = document.aliases.len();
        let mut removed_aliases = Vec::new();

        document.aliases.retain(|name, entry| {
            let keep = session_exists(&entry.session_path);
            if !keep {
                removed_aliases.push(AliasDeleted {
                    name: name.clone(),
                    session_path: entry.session_path.clone(),
                });
            }
            keep
        });

        if !removed_aliases.is_empty() {
            self.save(&mut document)?;
        }

        Ok(CleanupReport {
            total_checked,
            removed: removed_aliases.len(),
            removed_aliases,
        })
    }
}

/// `now`, unless a previous timestamp is already later.
fn later_of(previous: Option<&str>, now: String) -> String {
    match (previous, parse_rfc3339(&now)) {
        (Some(previous), Some(now_at)) if parse_rfc3339(previous).is_some_and(|p| p > now_at) => {
            previous.to_string()
        }
        _ => now,
    }
}
