//! The mutation capability handed to command handlers.
//!
//! Handlers never see a [`List`](super::List) directly. They get a
//! [`ReplayContext`] that borrows the list's state for the duration of one
//! modification and exposes only the operations a handler may perform. The
//! context also tracks where the modification being applied sits in the log,
//! so handlers that prune the log leave the replay cursor on the right record.

use crate::command::HandlerError;
use crate::entry::Entry;
use crate::modification::Modification;

/// Borrowed view of a list's mutable state during one handler call.
pub struct ReplayContext<'a> {
    pub(super) title: &'a mut String,
    pub(super) entries: &'a mut Vec<Entry>,
    pub(super) modifications: &'a mut Vec<Modification>,
    pub(super) next_id: &'a mut u64,
    pub(super) cursor: usize,
    pub(super) replaying: bool,
}

impl ReplayContext<'_> {
    /// Whether the modification comes from replaying the stored log rather
    /// than from a command that was just issued.
    #[must_use]
    pub const fn replaying(&self) -> bool {
        self.replaying
    }

    /// Take the next entry id.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::IdSpaceExhausted`] once the counter is at
    /// `u64::MAX`; the counter is left untouched.
    pub fn allocate_id(&mut self) -> Result<u64, HandlerError> {
        let id = *self.next_id;
        *self.next_id = id
            .checked_add(1)
            .ok_or(HandlerError::IdSpaceExhausted { id })?;
        Ok(id)
    }

    /// Make sure `id` is never handed out by [`allocate_id`](Self::allocate_id).
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::IdSpaceExhausted`] if reserving `id` would
    /// push the counter to `u64::MAX`.
    pub fn reserve_id(&mut self, id: u64) -> Result<(), HandlerError> {
        if id < *self.next_id {
            return Ok(());
        }
        *self.next_id = id
            .checked_add(1)
            .filter(|next| *next < u64::MAX)
            .ok_or(HandlerError::IdSpaceExhausted { id })?;
        Ok(())
    }

    /// The id the next `CREATE` will receive.
    #[must_use]
    pub fn next_id(&self) -> u64 {
        *self.next_id
    }

    pub fn push_entry(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Current position of the entry with `id`.
    #[must_use]
    pub fn entry_index(&self, id: u64) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    pub fn entry_mut(&mut self, id: u64) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.id() == id)
    }

    /// Remove and return the entry at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds; callers take it from
    /// [`entry_index`](Self::entry_index).
    pub fn remove_entry_at(&mut self, index: usize) -> Entry {
        self.entries.remove(index)
    }

    /// Remove the entry at `from` and insert it at `to` (post-removal index).
    pub fn move_entry(&mut self, from: usize, to: usize) {
        let entry = self.entries.remove(from);
        let to = to.min(self.entries.len());
        self.entries.insert(to, entry);
    }

    pub fn clear_entries(&mut self) {
        self.entries.clear();
    }

    pub fn set_title(&mut self, title: &str) {
        title.clone_into(self.title);
    }

    /// The log as it stands, including the modification being applied.
    #[must_use]
    pub fn log(&self) -> &[Modification] {
        self.modifications
    }

    /// Position of the modification being applied.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of modifications currently in the log.
    #[must_use]
    pub fn log_len(&self) -> usize {
        self.modifications.len()
    }

    /// Remove every modification other than the one being applied for
    /// which `doomed` returns true. Returns how many were removed.
    ///
    /// Removals before the cursor shift it back, so replay resumes right
    /// after the current modification.
    pub fn prune_log(&mut self, mut doomed: impl FnMut(&Modification) -> bool) -> usize {
        let mut removed = 0;
        let mut i = 0;
        while i < self.modifications.len() {
            if i != self.cursor && doomed(&self.modifications[i]) {
                self.modifications.remove(i);
                if i < self.cursor {
                    self.cursor -= 1;
                }
                removed += 1;
                continue;
            }
            i += 1;
        }
        removed
    }

    /// Drop every modification recorded before the one being applied.
    ///
    /// For a freshly issued command this leaves it as the only record;
    /// during replay the records after it survive.
    pub fn drop_log_before_current(&mut self) {
        self.modifications.drain(..self.cursor);
        self.cursor = 0;
    }
}
