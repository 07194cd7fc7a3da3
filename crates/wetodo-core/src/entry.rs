//! Entries: the rows of a list, derived by replay.
//!
//! An entry is created by a `CREATE` modification and afterwards only changed
//! by handlers. Each handler that edits an entry appends a [`Change`] to its
//! audit trail.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::modification::Modification;
use crate::user::UserId;

/// What kind of row an entry is.
///
/// `note`, `check` and `rule` are understood by the handlers and renderers;
/// any other lowercase name is preserved as [`EntryKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Free text.
    Note,
    /// A checkable task.
    Check,
    /// A non-interactive separator.
    Rule,
    /// A kind this build does not interpret.
    Other(String),
}

impl EntryKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Note => "note",
            Self::Check => "check",
            Self::Rule => "rule",
            Self::Other(raw) => raw,
        }
    }

    /// Parse a kind name. Returns `None` only for an empty name.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "" => None,
            "note" => Some(Self::Note),
            "check" => Some(Self::Check),
            "rule" => Some(Self::Rule),
            other => Some(Self::Other(other.to_string())),
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EntryKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Kind of edit recorded in an entry's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Create,
    Check,
    Uncheck,
    Edit,
    Relocate,
}

impl ChangeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Check => "CHECK",
            Self::Uncheck => "UNCHECK",
            Self::Edit => "EDIT",
            Self::Relocate => "RELOCATE",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit record: who changed the entry, when, and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub time: DateTime<Utc>,
    pub user: UserId,
    pub kind: ChangeKind,
}

/// A task, note or rule inside a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    id: u64,
    kind: EntryKind,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    checked: bool,
    changes: Vec<Change>,
    #[serde(skip)]
    origin: Modification,
}

impl Entry {
    /// Build the entry created by `origin`, recording it as the first change.
    pub(crate) fn created_by(
        id: u64,
        kind: EntryKind,
        title: impl Into<String>,
        origin: &Modification,
    ) -> Self {
        let mut entry = Self {
            id,
            kind,
            title: title.into(),
            description: None,
            checked: false,
            changes: Vec::new(),
            origin: origin.clone(),
        };
        entry.record(origin, ChangeKind::Create);
        entry
    }

    /// Stable id assigned at creation.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub const fn kind(&self) -> &EntryKind {
        &self.kind
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The description as stored in the log, with `\n` escapes intact.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The description with `\n` escapes turned back into line breaks.
    #[must_use]
    pub fn description_text(&self) -> Option<String> {
        self.description.as_deref().map(unescape_description)
    }

    #[must_use]
    pub const fn checked(&self) -> bool {
        self.checked
    }

    /// Audit trail in the order the changes were applied.
    #[must_use]
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// The `CREATE` modification this entry came from.
    #[must_use]
    pub const fn origin(&self) -> &Modification {
        &self.origin
    }

    pub(crate) fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Empty descriptions are stored as absent.
    pub(crate) fn set_description(&mut self, description: &str) {
        self.description = if description.is_empty() {
            None
        } else {
            Some(description.to_string())
        };
    }

    /// Flip the checked flag, returning the new state.
    pub(crate) const fn toggle(&mut self) -> bool {
        self.checked = !self.checked;
        self.checked
    }

    pub(crate) fn record(&mut self, modification: &Modification, kind: ChangeKind) {
        self.changes.push(Change {
            time: modification.time(),
            user: modification.user().clone(),
            kind,
        });
    }
}

/// Encode a multi-line description for a one-line `CHANGEDESC` payload.
///
/// Backslashes are doubled and line breaks become `\n`.
#[must_use]
pub fn escape_description(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

/// Inverse of [`escape_description`]. Unknown escapes are kept verbatim.
#[must_use]
pub fn unescape_description(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;

    fn origin() -> Modification {
        Modification::parse_line("1000 CREATE local:0 check|Buy milk").expect("parse")
    }

    #[test]
    fn created_entry_records_create_change() {
        let origin = origin();
        let entry = Entry::created_by(3, EntryKind::Check, "Buy milk", &origin);
        assert_eq!(entry.id(), 3);
        assert_eq!(entry.title(), "Buy milk");
        assert!(!entry.checked());
        assert_eq!(entry.changes().len(), 1);
        assert_eq!(entry.changes()[0].kind, ChangeKind::Create);
        assert_eq!(entry.changes()[0].user.as_str(), "local:0");
        assert_eq!(entry.origin(), &origin);
    }

    #[test]
    fn kind_names_round_trip() {
        for raw in ["note", "check", "rule", "heading"] {
            let kind = EntryKind::parse(raw).expect("non-empty");
            assert_eq!(kind.as_str(), raw);
        }
        assert_eq!(
            EntryKind::parse("heading"),
            Some(EntryKind::Other("heading".into()))
        );
        assert_eq!(EntryKind::parse(""), None);
    }

    #[test]
    fn empty_description_is_absent() {
        let mut entry = Entry::created_by(0, EntryKind::Note, "n", &origin());
        entry.set_description("details");
        assert_eq!(entry.description(), Some("details"));
        entry.set_description("");
        assert_eq!(entry.description(), None);
    }

    #[test]
    fn description_escapes_round_trip() {
        let text = "line one\nline two \\ with slash";
        let escaped = escape_description(text);
        assert!(!escaped.contains('\n'));
        assert_eq!(unescape_description(&escaped), text);
    }

    #[test]
    fn description_text_unescapes() {
        let mut entry = Entry::created_by(0, EntryKind::Note, "n", &origin());
        entry.set_description("a\\nb");
        assert_eq!(entry.description_text().as_deref(), Some("a\nb"));
    }

    #[test]
    fn serializes_for_json_output() {
        let mut entry = Entry::created_by(2, EntryKind::Rule, "----", &origin());
        let check = Modification::parse_line("2000 CHECK local:1 2").expect("parse");
        assert_eq!(check.command(), Command::Check);
        entry.record(&check, ChangeKind::Edit);

        let json = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(json["id"], 2);
        assert_eq!(json["kind"], "rule");
        assert_eq!(json["title"], "----");
        assert!(json.get("description").is_none());
        assert!(json.get("origin").is_none());
        assert_eq!(json["changes"][1]["kind"], "EDIT");
        assert_eq!(json["changes"][1]["user"], "local:1");
    }
}
