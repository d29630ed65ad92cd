use std::fs;

use clap::Parser;
use pretty_assertions::assert_eq;
use session_store::StorePaths;
use sessions::{run, AliasAction, Cli, Command, Context};
use tempfile::TempDir;

fn context() -> (TempDir, Context) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let paths = StorePaths::with_config_root(dir.path());
    fs::create_dir_all(&paths.sessions_dir).expect("sessions dir should be created");
    let ctx = Context::new(&paths, Some("3f2a11ee-9c0b-a1b2c3d4".to_string()));
    (dir, ctx)
}

fn run_args(ctx: &Context, args: &[&str]) -> Result<String, String> {
    let cli = Cli::try_parse_from(args).map_err(|error| error.to_string())?;
    let mut out = Vec::new();
    run(cli.command, ctx, &mut out).map_err(|error| error.to_string())?;
    Ok(String::from_utf8(out).expect("output is UTF-8"))
}

#[test]
fn parses_alias_subcommands() {
    let cli = Cli::try_parse_from([
        "sessions",
        "--config-dir",
        "/tmp/root",
        "alias",
        "set",
        "work",
        "a1b2c3d4",
        "--title",
        "My Work",
    ])
    .expect("arguments parse");

    assert_eq!(
        cli.config_dir.as_deref(),
        Some(std::path::Path::new("/tmp/root"))
    );
    assert_eq!(
        cli.command,
        Command::Alias {
            action: AliasAction::Set {
                name: "work".to_string(),
                session: "a1b2c3d4".to_string(),
                title: Some("My Work".to_string()),
            }
        }
    );

    let remove = Cli::try_parse_from(["sessions", "alias", "remove", "work"]).expect("alias parses");
    assert_eq!(
        remove.command,
        Command::Alias {
            action: AliasAction::Rm {
                name: "work".to_string()
            }
        }
    );
}

#[test]
fn list_defaults_to_first_page() {
    let cli = Cli::try_parse_from(["sessions", "list"]).expect("arguments parse");
    assert_eq!(
        cli.command,
        Command::List {
            date: None,
            search: None,
            limit: 50,
            offset: 0,
        }
    );
}

#[test]
fn end_then_show_by_alias() {
    let (_dir, ctx) = context();

    let created = run_args(&ctx, &["sessions", "end"]).expect("end succeeds");
    assert!(created.starts_with("Created session file:"));
    assert!(created.contains("-a1b2c3d4-session.tmp"));

    let updated = run_args(&ctx, &["sessions", "end"]).expect("second end succeeds");
    assert!(updated.starts_with("Updated session file:"));

    let set = run_args(&ctx, &["sessions", "alias", "set", "work", "a1b2c3d4"])
        .expect("alias set succeeds");
    assert!(set.starts_with("Created alias 'work'"));

    let shown = run_args(&ctx, &["sessions", "show", "work"]).expect("show succeeds");
    assert!(shown.contains("a1b2c3d4-session.tmp"));
    assert!(shown.contains("Aliases: work"));
    assert!(shown.contains("Title:   Session: "));
}

#[test]
fn reserved_alias_reports_reason() {
    let (_dir, ctx) = context();

    let error = run_args(&ctx, &["sessions", "alias", "set", "list", "/s/x.tmp"])
        .expect_err("reserved alias must fail");
    assert_eq!(error, "'list' is a reserved alias name");
}

#[test]
fn show_unknown_session_fails() {
    let (_dir, ctx) = context();

    let error = run_args(&ctx, &["sessions", "show", "nothing"]).expect_err("show must fail");
    assert_eq!(error, "Session not found: nothing");
}

#[test]
fn cleanup_removes_dangling_aliases() {
    let (_dir, ctx) = context();
    run_args(&ctx, &["sessions", "alias", "set", "gone", "/nowhere/x.tmp"]).expect("set");

    let report = run_args(&ctx, &["sessions", "alias", "cleanup"]).expect("cleanup succeeds");
    assert!(report.contains("Removed 'gone' (/nowhere/x.tmp)"));
    assert!(report.contains("Checked 1 aliases, removed 1"));

    let listed = run_args(&ctx, &["sessions", "alias", "list"]).expect("list succeeds");
    assert_eq!(listed, "No aliases found.\n");
}

#[test]
fn list_and_start_on_empty_store() {
    let (_dir, ctx) = context();

    assert_eq!(
        run_args(&ctx, &["sessions", "list"]).expect("list succeeds"),
        "No sessions found.\n"
    );
    assert_eq!(run_args(&ctx, &["sessions", "start"]).expect("start succeeds"), "");
}
