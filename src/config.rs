//! Environment configuration.

use std::env;
use std::path::PathBuf;

use session_store::{SessionStoreError, StorePaths};

pub const CONFIG_DIR_VAR: &str = "SESSIONS_CONFIG_DIR";
pub const SESSION_ID_VAR: &str = "CLAUDE_SESSION_ID";
pub const LOG_VAR: &str = "SESSIONS_LOG";

#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub config_dir: Option<PathBuf>,
    pub session_id: Option<String>,
    pub log_filter: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            config_dir: env_string_opt(CONFIG_DIR_VAR).map(PathBuf::from),
            session_id: env_string_opt(SESSION_ID_VAR),
            log_filter: env_string_opt(LOG_VAR),
        }
    }

    /// Store layout under `override_dir`, the configured root, or `$HOME/.claude`.
    pub fn store_paths(
        &self,
        override_dir: Option<PathBuf>,
    ) -> Result<StorePaths, SessionStoreError> {
        match override_dir.or_else(|| self.config_dir.clone()) {
            Some(dir) => Ok(StorePaths::with_config_root(dir)),
            None => StorePaths::from_env(),
        }
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn env_defaults_are_empty() {
        let _lock = env_lock();
        let _g1 = set_env_guard(CONFIG_DIR_VAR, None);
        let _g2 = set_env_guard(SESSION_ID_VAR, None);
        let _g3 = set_env_guard(LOG_VAR, None);

        let config = EnvConfig::from_env();
        assert!(config.config_dir.is_none());
        assert!(config.session_id.is_none());
        assert!(config.log_filter.is_none());
    }

    #[test]
    fn env_values_are_read() {
        let _lock = env_lock();
        let _g1 = set_env_guard(CONFIG_DIR_VAR, Some("/tmp/sessions-root"));
        let _g2 = set_env_guard(SESSION_ID_VAR, Some("0f9e8d7c-a1b2c3d4"));
        let _g3 = set_env_guard(LOG_VAR, Some("debug"));

        let config = EnvConfig::from_env();
        assert_eq!(config.config_dir, Some(PathBuf::from("/tmp/sessions-root")));
        assert_eq!(config.session_id.as_deref(), Some("0f9e8d7c-a1b2c3d4"));
        assert_eq!(config.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn empty_values_are_ignored() {
        let _lock = env_lock();
        let _g1 = set_env_guard(SESSION_ID_VAR, Some("  "));
        let config = EnvConfig::from_env();
        assert!(config.session_id.is_none());
    }

    #[test]
    fn flag_overrides_configured_root() {
        let config = EnvConfig {
            config_dir: Some(PathBuf::from("/from/env")),
            ..EnvConfig::default()
        };

        let paths = config
            .store_paths(Some(PathBuf::from("/from/flag")))
            .expect("explicit root resolves");
        assert_eq!(paths.config_root, PathBuf::from("/from/flag"));

        let paths = config.store_paths(None).expect("env root resolves");
        assert_eq!(paths.sessions_dir, PathBuf::from("/from/env/sessions"));
    }
}
