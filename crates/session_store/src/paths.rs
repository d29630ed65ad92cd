use std::path::{Path, PathBuf};

use crate::error::SessionStoreError;

pub const CONFIG_DIR_NAME: &str = ".claude";
pub const SESSIONS_DIR_NAME: &str = "sessions";
pub const ALIASES_FILE_NAME: &str = "session-aliases.json";

/// Well-known directories the store and alias index operate on.
///
/// Built once by the caller and handed to [`crate::SessionStore`] and
/// [`crate::AliasIndex`]; nothing inside the crate looks these up on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub config_root: PathBuf,
    pub sessions_dir: PathBuf,
    pub temp_dir: PathBuf,
}

impl StorePaths {
    /// Resolves `$HOME/.claude` and its `sessions` subdirectory.
    pub fn from_env() -> Result<Self, SessionStoreError> {
        let home = dirs::home_dir().ok_or(SessionStoreError::HomeDirNotFound)?;
        Ok(Self::with_config_root(home.join(CONFIG_DIR_NAME)))
    }

    #[must_use]
    pub fn with_config_root(config_root: impl Into<PathBuf>) -> Self {
        let config_root = config_root.into();
        Self {
            sessions_dir: config_root.join(SESSIONS_DIR_NAME),
            config_root,
            temp_dir: std::env::temp_dir(),
        }
    }

    #[must_use]
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    #[must_use]
    pub fn aliases_path(&self) -> PathBuf {
        self.config_root.join(ALIASES_FILE_NAME)
    }

    #[must_use]
    pub fn session_path(&self, filename: &str) -> PathBuf {
        self.sessions_dir.join(filename)
    }
}

/// Appends `suffix` to the full file name, so `a.json` becomes `a.json.tmp`.
#[must_use]
pub fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_derived_from_config_root() {
        let paths = StorePaths::with_config_root("/home/dev/.claude");

        assert_eq!(paths.sessions_dir, PathBuf::from("/home/dev/.claude/sessions"));
        assert_eq!(
            paths.aliases_path(),
            PathBuf::from("/home/dev/.claude/session-aliases.json")
        );
        assert_eq!(
            paths.session_path("2026-02-01-session.tmp"),
            PathBuf::from("/home/dev/.claude/sessions/2026-02-01-session.tmp")
        );
    }

    #[test]
    fn sibling_suffix_keeps_extension() {
        let tmp = sibling_with_suffix(Path::new("/x/session-aliases.json"), ".tmp");
        assert_eq!(tmp, PathBuf::from("/x/session-aliases.json.tmp"));
    }
}
