//! Entry commands: `add`, `check`, `rename`, `describe`, `move`, `delete`.
//!
//! Each one turns its arguments into a single command record, applies it to
//! the list and saves, holding the store lock for the whole round trip.

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use wetodo_core::entry::{EntryKind, escape_description};
use wetodo_core::{Command, Entry, List};

use super::{EntryView, Session, entry_id};
use crate::output::{pretty_kv, render_mode};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// List UUID or unique prefix.
    pub list: String,
    /// Title of the new entry.
    pub title: String,
    /// Entry type: `check`, `note`, `rule`, or any other lowercase name.
    #[arg(long, default_value = "check")]
    pub kind: String,
}

#[derive(Args, Debug)]
pub struct EntryArgs {
    /// List UUID or unique prefix.
    pub list: String,
    /// Entry id.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct RenameArgs {
    /// List UUID or unique prefix.
    pub list: String,
    /// Entry id.
    pub id: String,
    /// New title.
    pub title: String,
}

#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// List UUID or unique prefix.
    pub list: String,
    /// Entry id.
    pub id: String,
    /// New description; may span several lines. Empty clears it.
    pub text: String,
}

#[derive(Args, Debug)]
pub struct MoveArgs {
    /// List UUID or unique prefix.
    pub list: String,
    /// Entry id.
    pub id: String,
    /// Position to move to, counted among the current entries.
    pub position: usize,
}

pub async fn run_add(args: &AddArgs, session: &Session) -> Result<()> {
    let kind = EntryKind::parse(&args.kind).context("Entry kind must not be empty")?;
    if args.kind.contains('|') {
        bail!("Entry kind must not contain '|'");
    }

    let _lock = session.lock()?;
    let mut list = session.find_list(&args.list).await?;
    let id = list.next_id();
    session
        .issue(&mut list, Command::Create, format!("{kind}|{}", args.title))
        .await?;
    tracing::info!(uuid = list.uuid(), id, "added entry");
    print_entry(session, &list, id)
}

pub async fn run_check(args: &EntryArgs, session: &Session) -> Result<()> {
    let id = entry_id(&args.id)?;
    let _lock = session.lock()?;
    let mut list = session.find_list(&args.list).await?;
    session.issue(&mut list, Command::Check, id.to_string()).await?;
    print_entry(session, &list, id)
}

pub async fn run_rename(args: &RenameArgs, session: &Session) -> Result<()> {
    let id = entry_id(&args.id)?;
    let _lock = session.lock()?;
    let mut list = session.find_list(&args.list).await?;
    session
        .issue(&mut list, Command::Rename, format!("{id}|{}", args.title))
        .await?;
    print_entry(session, &list, id)
}

pub async fn run_describe(args: &DescribeArgs, session: &Session) -> Result<()> {
    let id = entry_id(&args.id)?;
    let _lock = session.lock()?;
    let mut list = session.find_list(&args.list).await?;
    let text = escape_description(&args.text);
    session
        .issue(&mut list, Command::ChangeDesc, format!("{id}|{text}"))
        .await?;
    print_entry(session, &list, id)
}

pub async fn run_move(args: &MoveArgs, session: &Session) -> Result<()> {
    let id = entry_id(&args.id)?;
    let _lock = session.lock()?;
    let mut list = session.find_list(&args.list).await?;
    session
        .issue(&mut list, Command::Relocate, format!("{id}|{}", args.position))
        .await?;
    print_entry(session, &list, id)
}

#[derive(Debug, Serialize)]
struct Deleted<'a> {
    list: &'a str,
    id: u64,
    deleted: bool,
    remaining: usize,
}

pub async fn run_delete(args: &EntryArgs, session: &Session) -> Result<()> {
    let id = entry_id(&args.id)?;
    let _lock = session.lock()?;
    let mut list = session.find_list(&args.list).await?;
    session.issue(&mut list, Command::Delete, id.to_string()).await?;

    let result = Deleted {
        list: list.uuid(),
        id,
        deleted: true,
        remaining: list.entries().len(),
    };
    render_mode(
        session.output,
        &result,
        |r, w| writeln!(w, "deleted\t{}", r.id),
        |r, w| writeln!(w, "Deleted entry {} ({} remaining)", r.id, r.remaining),
    )
}

fn print_entry(session: &Session, list: &List, id: u64) -> Result<()> {
    let entry = list
        .entry_by_id(id)
        .with_context(|| format!("Entry {id} is not in the list after applying the command"))?;
    let view = EntryView {
        list: list.uuid(),
        entry,
    };
    render_mode(
        session.output,
        &view,
        |v, w| writeln!(w, "{}", entry_row(v.entry)),
        |v, w| pretty_entry(v.entry, w),
    )
}

/// One tab-separated line: id, kind, checked, title.
pub fn entry_row(entry: &Entry) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        entry.id(),
        entry.kind(),
        if entry.checked() { "x" } else { "-" },
        entry.title()
    )
}

/// A check box (or marker) for the entry kind.
pub fn entry_marker(entry: &Entry) -> &'static str {
    match (entry.kind(), entry.checked()) {
        (EntryKind::Rule, _) => "---",
        (EntryKind::Note, _) => " * ",
        (_, true) => "[x]",
        (_, false) => "[ ]",
    }
}

fn pretty_entry(entry: &Entry, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "{} {}", entry_marker(entry), entry.title())?;
    pretty_kv(w, "id", entry.id().to_string())?;
    pretty_kv(w, "kind", entry.kind().as_str())?;
    if let Some(text) = entry.description_text() {
        pretty_kv(w, "details", text.replace('\n', "\n           "))?;
    }
    for change in entry.changes() {
        pretty_kv(
            w,
            change.kind.as_str(),
            format!("{} by {}", change.time.format("%Y-%m-%d %H:%M:%S"), change.user),
        )?;
    }
    Ok(())
}
