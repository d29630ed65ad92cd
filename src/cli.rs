use std::path::PathBuf;

use clap::{Parser, Subcommand};
use session_store::DEFAULT_LIST_LIMIT;

#[derive(Debug, Parser)]
#[command(name = "sessions")]
#[command(about = "Browse saved agent sessions and manage their aliases", long_about = None)]
pub struct Cli {
    /// Directory holding `sessions/` and `session-aliases.json` (default: ~/.claude)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List sessions, most recently modified first
    List {
        /// Only sessions from this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Substring of the short id
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Show one session by alias, short id, filename, or legacy date
    Show { target: String },
    /// Manage session aliases
    Alias {
        #[command(subcommand)]
        action: AliasAction,
    },
    /// Create or touch today's session file for this session id
    End {
        #[arg(long)]
        session_id: Option<String>,
    },
    /// Summarise recent sessions and available aliases
    Start,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum AliasAction {
    /// Point an alias at a session id or path
    Set {
        name: String,
        session: String,
        #[arg(long)]
        title: Option<String>,
    },
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    #[command(alias = "remove")]
    Rm { name: String },
    Rename { old: String, new: String },
    Title { name: String, title: String },
    /// Drop aliases whose session file is gone
    Cleanup,
}
