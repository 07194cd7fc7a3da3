//! List commands: `new`, `lists`, `show`, `retitle`, `clear`, `log`,
//! `favorite`, `share` and `remove`.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use wetodo_core::store::load_lists;
use wetodo_core::{Command, Entry, List, ListStore, UserId};

use super::Session;
use super::entry::{entry_marker, entry_row};
use crate::output::{pretty_kv, pretty_rule, pretty_section, render_mode, short_uuid};

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Title of the list. A trailing `*` marks it as a favorite.
    pub title: String,
    /// Mark the list as a favorite.
    #[arg(long)]
    pub favorite: bool,
}

#[derive(Args, Debug)]
pub struct ListArg {
    /// List UUID or unique prefix.
    pub list: String,
}

#[derive(Args, Debug)]
pub struct RetitleArgs {
    /// List UUID or unique prefix.
    pub list: String,
    /// New title.
    pub title: String,
}

#[derive(Args, Debug)]
pub struct FavoriteArgs {
    /// List UUID or unique prefix.
    pub list: String,
    /// Remove the favorite mark instead of setting it.
    #[arg(long)]
    pub off: bool,
}

#[derive(Args, Debug)]
pub struct ShareArgs {
    /// List UUID or unique prefix.
    pub list: String,
    /// User to add, as `<provider>:<id>`.
    #[arg(value_name = "USER")]
    pub member: String,
}

/// Summary of a list for `new`, `lists` and metadata commands.
#[derive(Debug, Serialize)]
pub struct ListSummary {
    pub uuid: String,
    pub title: String,
    pub favorite: bool,
    pub shared: bool,
    pub users: Vec<String>,
    pub entries: usize,
    pub checked: usize,
}

impl ListSummary {
    fn of(list: &List) -> Self {
        Self {
            uuid: list.uuid().to_string(),
            title: list.title().to_string(),
            favorite: list.is_favorite(),
            shared: list.is_shared(),
            users: list.users().iter().map(ToString::to_string).collect(),
            entries: list.entries().len(),
            checked: list.entries().iter().filter(|e| e.checked()).count(),
        }
    }

    fn row(&self) -> String {
        format!(
            "{}\t{}\t{}/{}\t{}",
            self.uuid,
            if self.favorite { "*" } else { "-" },
            self.checked,
            self.entries,
            self.title
        )
    }

    fn pretty_line(&self) -> String {
        format!(
            "{}  {}{}  ({}/{} done{})",
            short_uuid(&self.uuid),
            self.title,
            if self.favorite { " ★" } else { "" },
            self.checked,
            self.entries,
            if self.shared { ", shared" } else { "" }
        )
    }
}

fn render_summary(session: &Session, list: &List) -> Result<()> {
    let summary = ListSummary::of(list);
    render_mode(
        session.output,
        &summary,
        |s, w| writeln!(w, "{}", s.row()),
        |s, w| writeln!(w, "{}", s.pretty_line()),
    )
}

pub async fn run_new(args: &NewArgs, session: &Session) -> Result<()> {
    let mut list = List::new(&args.title);
    if args.favorite {
        list.set_favorite(true);
    }
    list.add_user(session.user().clone());

    let _lock = session.lock()?;
    session.save(&list).await?;
    tracing::info!(uuid = list.uuid(), "created list");
    render_summary(session, &list)
}

pub async fn run_lists(session: &Session) -> Result<()> {
    let loaded = load_lists(&session.store).await?;
    let mut summaries: Vec<ListSummary> =
        loaded.iter().map(|l| ListSummary::of(&l.list)).collect();
    summaries.sort_by(|a, b| b.favorite.cmp(&a.favorite).then_with(|| a.title.cmp(&b.title)));

    render_mode(
        session.output,
        &summaries,
        |rows, w| {
            for row in rows {
                writeln!(w, "{}", row.row())?;
            }
            Ok(())
        },
        |rows, w| {
            if rows.is_empty() {
                return writeln!(w, "No lists yet. Create one with `wetodo new <title>`.");
            }
            pretty_section(w, "Lists")?;
            for row in rows {
                writeln!(w, "{}", row.pretty_line())?;
            }
            Ok(())
        },
    )
}

#[derive(Debug, Serialize)]
struct Member {
    id: String,
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListDetail<'a> {
    uuid: &'a str,
    title: &'a str,
    favorite: bool,
    shared: bool,
    users: Vec<Member>,
    next_id: u64,
    entries: &'a [Entry],
}

pub async fn run_show(args: &ListArg, session: &Session) -> Result<()> {
    let list = session.find_list(&args.list).await?;

    let resolved = list.resolve_users(&session.resolver).await;
    let users = list
        .users()
        .iter()
        .zip(resolved)
        .map(|(user, profile)| Member {
            id: user.to_string(),
            name: profile.ok().map(|p| p.display_name),
        })
        .collect();

    let detail = ListDetail {
        uuid: list.uuid(),
        title: list.title(),
        favorite: list.is_favorite(),
        shared: list.is_shared(),
        users,
        next_id: list.next_id(),
        entries: list.entries(),
    };

    render_mode(
        session.output,
        &detail,
        |d, w| {
            for entry in d.entries {
                writeln!(w, "{}", entry_row(entry))?;
            }
            Ok(())
        },
        |d, w| {
            let star = if d.favorite { " ★" } else { "" };
            pretty_section(w, &format!("{}{star}", d.title))?;
            pretty_kv(w, "uuid", d.uuid)?;
            let members: Vec<String> = d
                .users
                .iter()
                .map(|m| match &m.name {
                    Some(name) => format!("{name} ({})", m.id),
                    None => m.id.clone(),
                })
                .collect();
            pretty_kv(w, "members", members.join(", "))?;
            pretty_rule(w)?;
            if d.entries.is_empty() {
                writeln!(w, "(empty)")?;
            }
            for entry in d.entries {
                writeln!(w, "{} {:>3}  {}", entry_marker(entry), entry.id(), entry.title())?;
                if let Some(text) = entry.description_text() {
                    for line in text.lines() {
                        writeln!(w, "         {line}")?;
                    }
                }
            }
            Ok(())
        },
    )
}

pub async fn run_retitle(args: &RetitleArgs, session: &Session) -> Result<()> {
    let _lock = session.lock()?;
    let mut list = session.find_list(&args.list).await?;
    session
        .issue(&mut list, Command::ListRename, args.title.clone())
        .await?;
    render_summary(session, &list)
}

pub async fn run_clear(args: &ListArg, session: &Session) -> Result<()> {
    let _lock = session.lock()?;
    let mut list = session.find_list(&args.list).await?;
    let watermark = list.next_id().to_string();
    session.issue(&mut list, Command::Clear, watermark).await?;
    tracing::info!(uuid = list.uuid(), "cleared list");
    render_summary(session, &list)
}

#[derive(Debug, Serialize)]
struct LogLine {
    time: i64,
    command: &'static str,
    user: String,
    data: String,
}

pub async fn run_log(args: &ListArg, session: &Session) -> Result<()> {
    let list = session.find_list(&args.list).await?;
    let lines: Vec<LogLine> = list
        .modifications()
        .iter()
        .map(|m| LogLine {
            time: m.epoch_millis(),
            command: m.command().as_str(),
            user: m.user().to_string(),
            data: m.data().to_string(),
        })
        .collect();

    render_mode(
        session.output,
        &lines,
        |lines, w| {
            for l in lines {
                writeln!(w, "{} {} {} {}", l.time, l.command, l.user, l.data)?;
            }
            Ok(())
        },
        |lines, w| {
            for l in lines {
                let when = chrono::DateTime::from_timestamp_millis(l.time)
                    .map_or_else(|| l.time.to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string());
                writeln!(w, "{when}  {:<10} {:<10} {}", l.command, l.user, l.data)?;
            }
            Ok(())
        },
    )
}

pub async fn run_favorite(args: &FavoriteArgs, session: &Session) -> Result<()> {
    let _lock = session.lock()?;
    let mut list = session.find_list(&args.list).await?;
    list.set_favorite(!args.off);
    session.save(&list).await?;
    render_summary(session, &list)
}

pub async fn run_share(args: &ShareArgs, session: &Session) -> Result<()> {
    let user = UserId::parse(&args.member)
        .with_context(|| format!("Cannot share with '{}'", args.member))?;

    let _lock = session.lock()?;
    let mut list = session.find_list(&args.list).await?;
    if list.add_user(user.clone()) {
        session.save(&list).await?;
        tracing::info!(uuid = list.uuid(), user = %user, "shared list");
    }
    render_summary(session, &list)
}

#[derive(Debug, Serialize)]
struct Removed {
    uuid: String,
    removed: bool,
}

pub async fn run_remove(args: &ListArg, session: &Session) -> Result<()> {
    let _lock = session.lock()?;
    let list = session.find_list(&args.list).await?;
    session.store.delete(list.uuid()).await?;
    tracing::info!(uuid = list.uuid(), "removed list");

    let removed = Removed {
        uuid: list.uuid().to_string(),
        removed: true,
    };
    render_mode(
        session.output,
        &removed,
        |r, w| writeln!(w, "removed\t{}", r.uuid),
        |r, w| writeln!(w, "Removed list {}", short_uuid(&r.uuid)),
    )
}
