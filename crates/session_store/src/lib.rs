//! On-disk session records and the alias index that names them.
//!
//! Session files are markdown under the sessions directory, identified by
//! their filename alone. Aliases live in a single JSON document that is only
//! ever replaced through a backup-protected rename.

mod aliases;
mod atomic;
mod clock;
mod error;
mod filename;
mod fs_io;
mod metadata;
mod paths;
mod session_end;
mod store;

pub use aliases::{
    is_well_formed_alias, validate_alias_name, Alias, AliasDeleted, AliasDocument, AliasEntry,
    AliasIndex, AliasMetadata, AliasQuery, AliasRenamed, AliasSet, CleanupReport, ALIAS_VERSION,
    RESERVED_ALIASES,
};
pub use atomic::{AtomicFile, Recovery, WriteStage};
pub use clock::{now_local, now_rfc3339};
pub use error::{AliasError, SessionStoreError};
pub use filename::{
    decode_session_filename, encode_session_filename, is_valid_short_id, SessionFileName, NO_ID,
};
pub use fs_io::{append_text, ensure_dir, read_text, write_text};
pub use metadata::{parse_metadata, SessionMetadata, SessionStats};
pub use paths::StorePaths;
pub use session_end::{derive_short_id, session_template, SessionEndOutcome};
pub use store::{
    format_size, ListQuery, SessionContents, SessionPage, SessionRecord, SessionStore,
    DEFAULT_LIST_LIMIT, UNTITLED_SESSION,
};
