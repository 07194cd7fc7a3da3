//! Lists and the replay engine.
//!
//! A [`List`] owns an ordered log of [`Modification`]s and the entries
//! derived from it. The log is kept sorted by time (stable, so equal
//! timestamps keep insertion order). Entries are never loaded or edited
//! directly: they only change by applying log records through the command
//! registry, and [`List::reset`] rebuilds them from an empty state.
//!
//! Applying a single record ([`List::apply`], [`List::apply_last`],
//! [`List::modify`]) reports handler failures to the caller. Bulk replay
//! ([`List::apply_from`], [`List::reset`]) logs them and keeps going.

pub mod codec;
mod context;

pub use codec::{ListParseError, ParseReport, SkippedLine, parse_list};
pub use context::ReplayContext;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::command::HandlerError;
use crate::entry::Entry;
use crate::modification::Modification;
use crate::user::{ResolveError, UserId, UserProfile, UserResolver};

/// Marker appended to the serialized title of a favorite list.
pub const FAVORITE_MARKER: char = '*';

/// A modification that failed during bulk replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayFailure {
    /// Log position of the failed modification at the time it was applied.
    pub index: usize,
    /// Canonical text of the failed modification.
    pub line: String,
    pub error: HandlerError,
}

/// Outcome of [`List::apply_from`] / [`List::reset`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Number of modifications applied successfully.
    pub applied: usize,
    pub failures: Vec<ReplayFailure>,
}

impl ReplayReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A to-do list: identity, metadata, command log, and derived entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    uuid: String,
    title: String,
    is_favorite: bool,
    users: Vec<UserId>,
    modifications: Vec<Modification>,
    entries: Vec<Entry>,
    next_id: u64,
}

impl List {
    /// Create an empty list with a fresh v4 UUID.
    ///
    /// A trailing `*` on `title` marks the list as a favorite and is not
    /// kept in the title.
    #[must_use]
    pub fn new(title: &str) -> Self {
        Self::with_uuid(Uuid::new_v4().to_string(), title)
    }

    /// Create an empty list with a known UUID.
    #[must_use]
    pub fn with_uuid(uuid: impl Into<String>, title: &str) -> Self {
        let (title, is_favorite) = split_favorite(title);
        Self {
            uuid: uuid.into(),
            title,
            is_favorite,
            users: Vec::new(),
            modifications: Vec::new(),
            entries: Vec::new(),
            next_id: 0,
        }
    }

    #[must_use]
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub const fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    pub const fn set_favorite(&mut self, favorite: bool) {
        self.is_favorite = favorite;
    }

    /// Members of the list; the first is conventionally the owner.
    #[must_use]
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    /// Add a member. Returns false if they were already present.
    pub fn add_user(&mut self, user: UserId) -> bool {
        if self.users.contains(&user) {
            return false;
        }
        self.users.push(user);
        true
    }

    /// A list is shared once it has more than one member.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        self.users.len() > 1
    }

    /// The command log, sorted by time.
    #[must_use]
    pub fn modifications(&self) -> &[Modification] {
        &self.modifications
    }

    /// The live entries in display order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// The id the next created entry will receive.
    #[must_use]
    pub const fn next_id(&self) -> u64 {
        self.next_id
    }

    #[must_use]
    pub fn entry_by_id(&self, id: u64) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Current position of the entry with `id`, if it is still live.
    #[must_use]
    pub fn entry_index_from_id(&self, id: u64) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    /// Append a modification and restore time order. Entries are untouched.
    pub fn add_modification(&mut self, modification: Modification) {
        self.modifications.push(modification);
        self.sort_log();
    }

    /// Apply the modification at `index` as a freshly issued command.
    ///
    /// Unlike bulk replay, a `DELETE` of an entry that is not live fails here
    /// even when its id is past the counter.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::MissingModification`] if `index` is past the
    /// end of the log, or the handler's error. A failed modification leaves
    /// the list unchanged.
    pub fn apply(&mut self, index: usize) -> Result<(), HandlerError> {
        self.apply_at(index, false).map(|_| ())
    }

    /// Apply the most recent modification: the path for a command the user
    /// just issued.
    ///
    /// # Errors
    ///
    /// Same as [`List::apply`].
    pub fn apply_last(&mut self) -> Result<(), HandlerError> {
        let len = self.modifications.len();
        let last = len
            .checked_sub(1)
            .ok_or(HandlerError::MissingModification { index: 0, len })?;
        self.apply(last)
    }

    /// Apply every modification from `start` onward, in log order.
    ///
    /// Failures are logged and collected in the report; they never stop
    /// the replay.
    pub fn apply_from(&mut self, start: usize) -> ReplayReport {
        let mut report = ReplayReport::default();
        let mut i = start;
        while i < self.modifications.len() {
            match self.apply_at(i, true) {
                Ok(cursor) => {
                    report.applied += 1;
                    i = cursor + 1;
                }
                Err(error) => {
                    let line = self.modifications[i].to_string();
                    warn!(
                        list = %self.uuid,
                        index = i,
                        line = %line,
                        error = %error,
                        "skipping modification that failed to apply"
                    );
                    report.failures.push(ReplayFailure {
                        index: i,
                        line,
                        error,
                    });
                    i += 1;
                }
            }
        }
        report
    }

    /// Rebuild the entries from scratch by replaying the whole log.
    ///
    /// The id counter restarts with the entries, so a replay hands out the
    /// same ids every time.
    pub fn reset(&mut self) -> ReplayReport {
        self.entries.clear();
        self.next_id = 0;
        self.apply_from(0)
    }

    /// Record and apply a new modification.
    ///
    /// This is the in-memory half of `modify_and_save`; persisting is up to
    /// the storage collaborator. On error the modification stays in the log
    /// (it is still the user's recorded intent) but has no effect.
    ///
    /// # Errors
    ///
    /// Returns the handler's error.
    pub fn modify(&mut self, modification: Modification) -> Result<(), HandlerError> {
        let position = self.insert_sorted(modification);
        self.apply(position)
    }

    /// Resolve display data for every member, in member order.
    pub async fn resolve_users(
        &self,
        resolver: &UserResolver,
    ) -> Vec<Result<UserProfile, ResolveError>> {
        let mut resolved = Vec::with_capacity(self.users.len());
        for user in &self.users {
            resolved.push(resolver.resolve(user).await);
        }
        resolved
    }

    /// Apply one modification and return where it sits in the log afterwards.
    fn apply_at(&mut self, index: usize, replaying: bool) -> Result<usize, HandlerError> {
        let len = self.modifications.len();
        let modification = self
            .modifications
            .get(index)
            .cloned()
            .ok_or(HandlerError::MissingModification { index, len })?;

        let mut ctx = ReplayContext {
            title: &mut self.title,
            entries: &mut self.entries,
            modifications: &mut self.modifications,
            next_id: &mut self.next_id,
            cursor: index,
            replaying,
        };
        (modification.command().handler())(&modification, &mut ctx)?;
        let cursor = ctx.cursor;

        debug!(list = %self.uuid, index, line = %modification, "applied modification");
        Ok(cursor)
    }

    /// Insert keeping time order, after any records with the same time.
    fn insert_sorted(&mut self, modification: Modification) -> usize {
        let time = modification.time();
        let position = self.modifications.partition_point(|m| m.time() <= time);
        self.modifications.insert(position, modification);
        position
    }

    fn sort_log(&mut self) {
        self.modifications.sort_by_key(Modification::time);
    }

    /// Push without sorting; the codec sorts once after loading.
    pub(crate) fn push_unsorted(&mut self, modification: Modification) {
        self.modifications.push(modification);
    }

    pub(crate) fn finish_load(&mut self) -> ReplayReport {
        self.sort_log();
        self.reset()
    }
}

/// Split a trailing favorite marker off a title and strip line breaks.
fn split_favorite(raw: &str) -> (String, bool) {
    let (title, favorite) = match raw.strip_suffix(FAVORITE_MARKER) {
        Some(stripped) => (stripped, true),
        None => (raw, false),
    };
    (title.replace(['\n', '\r'], " "), favorite)
}
