//! Flat-text persistence format for a list.
//!
//! ```text
//! <title>[*]
//! <user1> <user2> ...
//! <epoch-ms> <COMMAND> <user> <data>
//! ...
//! ```
//!
//! Parsing is lenient: a bad user or modification line is skipped with a
//! warning, so a partly corrupt file still loads whatever subset replays.

use std::fmt;

use tracing::warn;

use super::{FAVORITE_MARKER, List, ReplayReport};
use crate::error::ErrorCode;
use crate::modification::{Modification, ParseError};
use crate::user::UserId;

/// Errors that make a stored text unusable as a list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListParseError {
    /// No title line.
    #[error("list text is empty")]
    Empty,
}

impl ListParseError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Empty => ErrorCode::EmptyListText,
        }
    }
}

/// A line dropped while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number in the stored text.
    pub line_no: usize,
    pub line: String,
    pub error: ParseError,
}

/// What happened while turning stored text back into a list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub skipped: Vec<SkippedLine>,
    /// Outcome of the replay that rebuilt the entries.
    pub replay: ReplayReport,
}

impl ParseReport {
    /// True when every line parsed and every modification applied.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.replay.is_clean()
    }
}

impl List {
    /// Serialize the list in its persisted form.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())?;
        if self.is_favorite() {
            write!(f, "{FAVORITE_MARKER}")?;
        }
        writeln!(f)?;

        let mut first = true;
        for user in self.users() {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            f.write_str(user.as_str())?;
        }

        // Lines are separated, not terminated: no newline after the last.
        for modification in self.modifications() {
            write!(f, "\n{modification}")?;
        }
        Ok(())
    }
}

/// Parse a stored list and replay its log.
///
/// # Errors
///
/// Returns [`ListParseError::Empty`] if `text` has no title line. Every
/// other defect is recorded in the [`ParseReport`].
pub fn parse_list(uuid: &str, text: &str) -> Result<(List, ParseReport), ListParseError> {
    if text.trim().is_empty() {
        return Err(ListParseError::Empty);
    }

    let mut lines = text.lines().enumerate();
    let title = lines.next().map_or("", |(_, line)| line);
    let mut list = List::with_uuid(uuid, title);
    let mut report = ParseReport::default();

    if let Some((idx, users)) = lines.next() {
        for raw in users.split_whitespace() {
            match UserId::parse(raw) {
                Ok(user) => {
                    list.add_user(user);
                }
                Err(err) => skip(&mut report, uuid, idx, raw, err.into()),
            }
        }
    }

    for (idx, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        match Modification::parse_line(line) {
            Ok(modification) => list.push_unsorted(modification),
            Err(err) => skip(&mut report, uuid, idx, line, err),
        }
    }

    report.replay = list.finish_load();
    Ok((list, report))
}

fn skip(report: &mut ParseReport, uuid: &str, idx: usize, line: &str, error: ParseError) {
    warn!(list = uuid, line_no = idx + 1, line, error = %error, "skipping malformed line");
    report.skipped.push(SkippedLine {
        line_no: idx + 1,
        line: line.to_string(),
        error,
    });
}
