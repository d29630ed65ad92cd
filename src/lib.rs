//! Command-line front end for the `session_store` crate.
//!
//! Every subcommand calls one store or alias operation and renders its result;
//! failures come back as the operation's error text.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;

pub use cli::{AliasAction, Cli, Command};
pub use commands::{run, Context};
pub use config::EnvConfig;
