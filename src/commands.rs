use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use session_store::{
    derive_short_id, now_local, Alias, AliasIndex, AliasQuery, ListQuery, SessionEndOutcome,
    SessionRecord, SessionStore, StorePaths,
};

use crate::cli::{AliasAction, Command};

pub const RECENT_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const START_ALIAS_LIMIT: usize = 5;

/// Store handles shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Context {
    pub store: SessionStore,
    pub aliases: AliasIndex,
    pub session_id: Option<String>,
}

impl Context {
    pub fn new(paths: &StorePaths, session_id: Option<String>) -> Self {
        Self {
            store: SessionStore::new(paths),
            aliases: AliasIndex::new(paths),
            session_id,
        }
    }
}

pub fn run(command: Command, ctx: &Context, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::List {
            date,
            search,
            limit,
            offset,
        } => list_sessions(ctx, ListQuery { date, search, limit, offset }, out),
        Command::Show { target } => show_session(ctx, &target, out),
        Command::Alias { action } => run_alias(ctx, action, out),
        Command::End { session_id } => end_session(ctx, session_id, out),
        Command::Start => summarise_start(ctx, out),
    }
}

fn list_sessions(ctx: &Context, query: ListQuery, out: &mut dyn Write) -> Result<()> {
    let page = ctx.store.list(&query);
    if page.records.is_empty() {
        writeln!(out, "No sessions found.")?;
        return Ok(());
    }

    for record in &page.records {
        writeln!(
            out,
            "{}  {:<16}  {:>8}  {}",
            record.date,
            record.short_id,
            ctx.store.size_label(&record.path),
            ctx.store.title(&record.path)
        )?;
    }

    let shown_to = page.offset + page.records.len();
    writeln!(out, "Showing {}-{} of {}", page.offset + 1, shown_to, page.total)?;
    if page.has_more {
        writeln!(out, "More sessions available (use --offset {shown_to}).")?;
    }
    Ok(())
}

fn find_session(ctx: &Context, target: &str) -> Option<SessionRecord> {
    if let Some(alias) = ctx.aliases.resolve(target) {
        let filename = Path::new(&alias.session_path)
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string);
        if let Some(record) = filename.and_then(|name| ctx.store.get_by_id(&name, true)) {
            return Some(record);
        }
    }

    ctx.store.get_by_id(target, true)
}

fn show_session(ctx: &Context, target: &str, out: &mut dyn Write) -> Result<()> {
    let Some(record) = find_session(ctx, target) else {
        bail!("Session not found: {target}");
    };

    writeln!(out, "Session: {}", record.filename)?;
    writeln!(out, "Path:    {}", record.path.display())?;
    writeln!(out, "Date:    {}", record.date)?;
    writeln!(out, "Size:    {}", ctx.store.size_label(&record.path))?;

    let names = ctx
        .aliases
        .aliases_for_session(&record.path.display().to_string())
        .into_iter()
        .map(|alias| alias.name)
        .collect::<Vec<_>>();
    if !names.is_empty() {
        writeln!(out, "Aliases: {}", names.join(", "))?;
    }

    if let Some(contents) = record.contents {
        let metadata = &contents.metadata;
        if let Some(title) = &metadata.title {
            writeln!(out, "Title:   {title}")?;
        }
        if let Some(started) = &metadata.started {
            writeln!(out, "Started: {started}")?;
        }
        if let Some(last_updated) = &metadata.last_updated {
            writeln!(out, "Updated: {last_updated}")?;
        }
        writeln!(
            out,
            "Items:   {} completed, {} in progress",
            contents.stats.completed_items, contents.stats.in_progress_items
        )?;
        for item in &metadata.in_progress {
            writeln!(out, "  - [ ] {item}")?;
        }
        if !metadata.notes.is_empty() {
            writeln!(out, "Notes:\n{}", metadata.notes)?;
        }
        if !metadata.context.is_empty() {
            writeln!(out, "Context:\n{}", metadata.context)?;
        }
    }
    Ok(())
}

fn run_alias(ctx: &Context, action: AliasAction, out: &mut dyn Write) -> Result<()> {
    match action {
        AliasAction::Set {
            name,
            session,
            title,
        } => {
            let session_path = ctx
                .store
                .get_by_id(&session, false)
                .map_or(session, |record| record.path.display().to_string());
            let set = ctx.aliases.set(&name, &session_path, title.as_deref())?;
            let verb = if set.is_new { "Created" } else { "Updated" };
            writeln!(out, "{verb} alias '{}' -> {}", set.alias.name, set.alias.session_path)?;
        }
        AliasAction::List { search, limit } => {
            let aliases = ctx.aliases.list(&AliasQuery { search, limit });
            if aliases.is_empty() {
                writeln!(out, "No aliases found.")?;
            }
            for alias in &aliases {
                write_alias(alias, out)?;
            }
        }
        AliasAction::Rm { name } => {
            let deleted = ctx.aliases.delete(&name)?;
            writeln!(out, "Removed alias '{}' ({})", deleted.name, deleted.session_path)?;
        }
        AliasAction::Rename { old, new } => {
            let renamed = ctx.aliases.rename(&old, &new)?;
            writeln!(out, "Renamed alias '{}' to '{}'", renamed.old_name, renamed.new_name)?;
        }
        AliasAction::Title { name, title } => {
            let alias = ctx.aliases.update_title(&name, Some(&title))?;
            writeln!(out, "Updated title of '{}'", alias.name)?;
        }
        AliasAction::Cleanup => {
            let report = ctx
                .aliases
                .cleanup(|path| ctx.store.exists(Path::new(path)))?;
            for removed in &report.removed_aliases {
                writeln!(out, "Removed '{}' ({})", removed.name, removed.session_path)?;
            }
            writeln!(
                out,
                "Checked {} aliases, removed {}",
                report.total_checked, report.removed
            )?;
        }
    }
    Ok(())
}

fn write_alias(alias: &Alias, out: &mut dyn Write) -> Result<()> {
    match &alias.title {
        Some(title) => writeln!(out, "{:<20} {}  ({title})", alias.name, alias.session_path)?,
        None => writeln!(out, "{:<20} {}", alias.name, alias.session_path)?,
    }
    Ok(())
}

fn end_session(ctx: &Context, session_id: Option<String>, out: &mut dyn Write) -> Result<()> {
    let session_id = session_id.or_else(|| ctx.session_id.clone());
    let short_id = derive_short_id(session_id.as_deref());

    match ctx.store.record_session_end(&short_id, now_local())? {
        SessionEndOutcome::Created(path) => {
            writeln!(out, "Created session file: {}", path.display())?;
        }
        SessionEndOutcome::Updated(path) => {
            writeln!(out, "Updated session file: {}", path.display())?;
        }
    }
    Ok(())
}

fn summarise_start(ctx: &Context, out: &mut dyn Write) -> Result<()> {
    let recent = ctx.store.recent(RECENT_WINDOW);
    if let Some(latest) = recent.first() {
        writeln!(out, "Found {} recent session(s)", recent.len())?;
        writeln!(out, "Latest: {}", latest.path.display())?;
    }

    let aliases = ctx.aliases.list(&AliasQuery {
        search: None,
        limit: Some(START_ALIAS_LIMIT),
    });
    if !aliases.is_empty() {
        let names = aliases
            .iter()
            .map(|alias| alias.name.as_str())
            .collect::<Vec<_>>();
        writeln!(out, "{} alias(es) available: {}", aliases.len(), names.join(", "))?;
        writeln!(out, "Use `sessions show <alias>` to resume a previous session.")?;
    }
    Ok(())
}
