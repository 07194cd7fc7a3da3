//! State transitions for every registered command.
//!
//! | Command      | Payload                     |
//! |--------------|-----------------------------|
//! | `CREATE`     | `<type>\|<title>`           |
//! | `DELETE`     | `<entryId>`                 |
//! | `CHECK`      | `<entryId>`                 |
//! | `RENAME`     | `<entryId>\|<title>`        |
//! | `CHANGEDESC` | `<entryId>\|<description>`  |
//! | `RELOCATE`   | `<entryId>\|<index>`        |
//! | `LISTRENAME` | `<title>`                   |
//! | `CLEAR`      | `<next id watermark>`       |

use tracing::debug;

use super::Command;
use crate::entry::{ChangeKind, Entry, EntryKind};
use crate::error::ErrorCode;
use crate::list::ReplayContext;
use crate::modification::Modification;

/// Why a handler refused a modification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    /// The addressed entry is not in the list.
    #[error("entry {id} not found")]
    EntryNotFound { id: u64 },

    /// Allocating or reserving this id would exhaust the id counter.
    #[error("entry id {id} is beyond the id space")]
    IdSpaceExhausted { id: u64 },

    /// The payload does not match the command's grammar.
    #[error("invalid {command} payload '{data}': {reason}")]
    InvalidPayload {
        command: Command,
        data: String,
        reason: &'static str,
    },

    /// `apply` was asked for a log position that does not exist.
    #[error("no modification at index {index} (log has {len})")]
    MissingModification { index: usize, len: usize },
}

impl HandlerError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::EntryNotFound { .. } => ErrorCode::EntryNotFound,
            Self::IdSpaceExhausted { .. } => ErrorCode::IdSpaceExhausted,
            Self::InvalidPayload { .. } => ErrorCode::InvalidPayload,
            Self::MissingModification { .. } => ErrorCode::InternalUnexpected,
        }
    }
}

fn invalid(m: &Modification, reason: &'static str) -> HandlerError {
    HandlerError::InvalidPayload {
        command: m.command(),
        data: m.data().to_string(),
        reason,
    }
}

/// Split `<entryId>|<rest>`.
fn id_and_rest(m: &Modification) -> Result<(u64, &str), HandlerError> {
    let (id, rest) = m
        .data()
        .split_once('|')
        .ok_or_else(|| invalid(m, "expected <entryId>|<value>"))?;
    let id = id.parse().map_err(|_| invalid(m, "entry id is not an integer"))?;
    Ok((id, rest))
}

fn bare_id(m: &Modification) -> Result<u64, HandlerError> {
    m.data()
        .parse()
        .map_err(|_| invalid(m, "entry id is not an integer"))
}

pub(crate) fn create(m: &Modification, ctx: &mut ReplayContext<'_>) -> Result<(), HandlerError> {
    let (kind, title) = m
        .data()
        .split_once('|')
        .ok_or_else(|| invalid(m, "expected <type>|<title>"))?;
    let kind = EntryKind::parse(kind).ok_or_else(|| invalid(m, "entry type is empty"))?;

    let id = ctx.allocate_id()?;
    ctx.push_entry(Entry::created_by(id, kind, title, m));
    Ok(())
}

/// Remove the entry, then prune the log of records that only served it.
///
/// `CHECK`, `RENAME` and `CHANGEDESC` records aimed at the id always go.
/// Records that depend on the entry's position are only pruned when no
/// other entry was relocated while it was live: its `RELOCATE` records go,
/// and so does its originating `CREATE` if it holds the newest id. During
/// replay, a `DELETE` for an id at or above the counter is what such a
/// pruned log replays into: it reserves the id instead of failing. A freshly
/// issued `DELETE` for a missing entry always fails.
pub(crate) fn delete(m: &Modification, ctx: &mut ReplayContext<'_>) -> Result<(), HandlerError> {
    let id = bare_id(m)?;

    let Some(index) = ctx.entry_index(id) else {
        if ctx.replaying() && id >= ctx.next_id() {
            ctx.reserve_id(id)?;
            return Ok(());
        }
        return Err(HandlerError::EntryNotFound { id });
    };

    let newest = id.saturating_add(1) == ctx.next_id();
    let entry = ctx.remove_entry_at(index);
    let origin = entry.origin();
    let positional = !others_relocated_since(ctx, origin, id);
    let mut origin_pending = newest && positional;

    let pruned = ctx.prune_log(|other| {
        if other.command().addresses_entry() && other.targets_entry(id) {
            return other.command() != Command::Relocate || positional;
        }
        if origin_pending && other == origin {
            origin_pending = false;
            return true;
        }
        false
    });
    debug!(id, pruned, "deleted entry");
    Ok(())
}

/// Whether any entry other than `id` was relocated between `origin` and the
/// modification being applied. True when `origin` is no longer in the log.
fn others_relocated_since(ctx: &ReplayContext<'_>, origin: &Modification, id: u64) -> bool {
    let log = &ctx.log()[..ctx.cursor()];
    let Some(start) = log.iter().rposition(|other| other == origin) else {
        return true;
    };
    log[start + 1..]
        .iter()
        .any(|other| other.command() == Command::Relocate && !other.targets_entry(id))
}

pub(crate) fn check(m: &Modification, ctx: &mut ReplayContext<'_>) -> Result<(), HandlerError> {
    let id = bare_id(m)?;
    let entry = ctx
        .entry_mut(id)
        .ok_or(HandlerError::EntryNotFound { id })?;

    let kind = if entry.toggle() {
        ChangeKind::Check
    } else {
        ChangeKind::Uncheck
    };
    entry.record(m, kind);
    Ok(())
}

pub(crate) fn rename(m: &Modification, ctx: &mut ReplayContext<'_>) -> Result<(), HandlerError> {
    let (id, title) = id_and_rest(m)?;
    let entry = ctx
        .entry_mut(id)
        .ok_or(HandlerError::EntryNotFound { id })?;

    entry.set_title(title);
    entry.record(m, ChangeKind::Edit);
    Ok(())
}

pub(crate) fn change_description(
    m: &Modification,
    ctx: &mut ReplayContext<'_>,
) -> Result<(), HandlerError> {
    let (id, description) = id_and_rest(m)?;
    let entry = ctx
        .entry_mut(id)
        .ok_or(HandlerError::EntryNotFound { id })?;

    entry.set_description(description);
    entry.record(m, ChangeKind::Edit);
    Ok(())
}

/// Move an entry, addressed by id, to a position among the live entries.
///
/// The target is the slot before which the entry lands, counted before the
/// entry is taken out, so a forward move shifts the target back by one.
/// Targets past the end clamp to the end. Unparseable payloads and negative
/// targets are ignored.
pub(crate) fn relocate(m: &Modification, ctx: &mut ReplayContext<'_>) -> Result<(), HandlerError> {
    let Some((id, target)) = m.data().split_once('|').and_then(|(id, target)| {
        Some((id.parse::<u64>().ok()?, target.parse::<usize>().ok()?))
    }) else {
        debug!(data = m.data(), "ignoring malformed RELOCATE");
        return Ok(());
    };

    let from = ctx
        .entry_index(id)
        .ok_or(HandlerError::EntryNotFound { id })?;

    let mut to = target.min(ctx.entry_count());
    if to > from {
        to -= 1;
    }
    if to == from {
        return Ok(());
    }

    ctx.move_entry(from, to);
    if let Some(entry) = ctx.entry_mut(id) {
        entry.record(m, ChangeKind::Relocate);
    }
    Ok(())
}

pub(crate) fn rename_list(
    m: &Modification,
    ctx: &mut ReplayContext<'_>,
) -> Result<(), HandlerError> {
    ctx.set_title(m.data());
    Ok(())
}

/// Collapse the history up to this command into the command itself and drop
/// every entry.
///
/// A numeric payload is the id counter at the time the list was cleared;
/// honouring it keeps ids fresh when the compacted log is replayed.
pub(crate) fn clear(m: &Modification, ctx: &mut ReplayContext<'_>) -> Result<(), HandlerError> {
    if let Some(watermark) = m.data().parse::<u64>().ok().and_then(|w| w.checked_sub(1)) {
        ctx.reserve_id(watermark)?;
    }

    if ctx.log_len() > 1 {
        ctx.drop_log_before_current();
    }
    ctx.clear_entries();
    Ok(())
}
