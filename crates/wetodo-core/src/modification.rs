//! Modification records: one immutable, timestamped command per log line.
//!
//! # Line format
//!
//! ```text
//! <epoch-ms> <COMMAND> <provider:id> <data>
//! ```
//!
//! Fields are separated by single spaces. The data field runs to the end of
//! the line and may itself contain spaces and `|`-separated sub-fields; its
//! grammar depends on the command. A parsed modification writes back out
//! byte-for-byte, so timestamps with leading zeros are rejected rather than
//! normalized.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::command::{Command, UnknownCommand};
use crate::error::ErrorCode;
use crate::user::{InvalidUserId, ResolveError, UserId, UserProfile, UserResolver};

/// Errors from parsing or constructing a [`Modification`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The line does not have the four space-separated fields.
    #[error("bad log line '{0}': expected `<epoch-ms> <COMMAND> <provider:id> <data>`")]
    BadLine(String),

    /// The timestamp is not a canonical non-negative millisecond count.
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    /// The command field is not an uppercase name.
    #[error("invalid command name '{0}'")]
    InvalidCommandName(String),

    /// The command name is well-formed but not registered.
    #[error(transparent)]
    UnknownCommand(#[from] UnknownCommand),

    /// The user field is not a `<provider>:<id>` id.
    #[error(transparent)]
    InvalidUser(#[from] InvalidUserId),

    /// The data field is empty.
    #[error("data payload is empty")]
    EmptyPayload,

    /// The data field would break the one-line-per-record invariant.
    #[error("data payload contains a line break")]
    LineBreakInPayload,
}

impl ParseError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownCommand(_) => ErrorCode::UnknownCommand,
            Self::InvalidUser(_) => ErrorCode::InvalidUser,
            Self::EmptyPayload | Self::LineBreakInPayload => ErrorCode::InvalidPayload,
            Self::BadLine(_) | Self::InvalidTimestamp(_) | Self::InvalidCommandName(_) => {
                ErrorCode::MalformedLine
            }
        }
    }
}

/// One command record in a list's log.
///
/// Fields are private: a modification never changes after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    time: DateTime<Utc>,
    command: Command,
    user: UserId,
    data: String,
}

impl Modification {
    /// Build a modification from its parts.
    ///
    /// `time` is truncated to millisecond precision.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidTimestamp`] for times before the epoch,
    /// and [`ParseError::EmptyPayload`] / [`ParseError::LineBreakInPayload`]
    /// for data that cannot be written as one line.
    pub fn new(
        time: DateTime<Utc>,
        command: Command,
        user: UserId,
        data: impl Into<String>,
    ) -> Result<Self, ParseError> {
        let millis = time.timestamp_millis();
        if millis < 0 {
            return Err(ParseError::InvalidTimestamp(millis.to_string()));
        }
        let time = DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| ParseError::InvalidTimestamp(millis.to_string()))?;

        let data = data.into();
        validate_data(&data)?;

        Ok(Self {
            time,
            command,
            user,
            data,
        })
    }

    /// Build a modification stamped with the current time.
    ///
    /// This is the path for commands issued by a user right now.
    ///
    /// # Errors
    ///
    /// Same as [`Modification::new`].
    pub fn create(
        command: Command,
        user: UserId,
        data: impl Into<String>,
    ) -> Result<Self, ParseError> {
        Self::new(Utc::now(), command, user, data)
    }

    /// Parse one canonical log line.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] describing the first field that fails
    /// validation. Unknown command names are
    /// [`ParseError::UnknownCommand`].
    pub fn parse_line(line: &str) -> Result<Self, ParseError> {
        let line = line.trim_end_matches('\n').trim_end_matches('\r');

        let mut fields = line.splitn(4, ' ');
        let (Some(ts), Some(command), Some(user), Some(data)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(ParseError::BadLine(line.to_string()));
        };

        let millis = parse_millis(ts)?;
        let time = DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| ParseError::InvalidTimestamp(ts.to_string()))?;

        if command.is_empty() || !command.bytes().all(|b| b.is_ascii_uppercase() || b == b'_') {
            return Err(ParseError::InvalidCommandName(command.to_string()));
        }
        let command: Command = command.parse()?;

        let user = UserId::parse(user)?;

        validate_data(data)?;

        Ok(Self {
            time,
            command,
            user,
            data: data.to_string(),
        })
    }

    #[must_use]
    pub const fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Milliseconds since the Unix epoch, as written in the log.
    #[must_use]
    pub fn epoch_millis(&self) -> i64 {
        self.time.timestamp_millis()
    }

    #[must_use]
    pub const fn command(&self) -> Command {
        self.command
    }

    #[must_use]
    pub const fn user(&self) -> &UserId {
        &self.user
    }

    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// The entry id at the head of the payload, for entry-addressed commands.
    ///
    /// Returns `None` for whole-list commands and for payloads whose leading
    /// field is not an integer.
    #[must_use]
    pub fn entry_target(&self) -> Option<u64> {
        if !self.command.addresses_entry() {
            return None;
        }
        let head = self.data.split_once('|').map_or(self.data.as_str(), |(h, _)| h);
        head.parse().ok()
    }

    /// Whether the payload is aimed at entry `id`: exactly `<id>` or
    /// starting with `<id>|`.
    #[must_use]
    pub fn targets_entry(&self, id: u64) -> bool {
        let id = id.to_string();
        self.data == id
            || self
                .data
                .strip_prefix(id.as_str())
                .is_some_and(|rest| rest.starts_with('|'))
    }

    /// Resolve display data for the acting user.
    ///
    /// # Errors
    ///
    /// Propagates the resolver's [`ResolveError`]; the modification itself
    /// is unaffected.
    pub async fn resolve_user(&self, resolver: &UserResolver) -> Result<UserProfile, ResolveError> {
        resolver.resolve(&self.user).await
    }
}

impl fmt::Display for Modification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.time.timestamp_millis(),
            self.command,
            self.user,
            self.data
        )
    }
}

impl FromStr for Modification {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_line(s)
    }
}

fn parse_millis(raw: &str) -> Result<i64, ParseError> {
    let canonical = !raw.is_empty()
        && raw.bytes().all(|b| b.is_ascii_digit())
        && (raw == "0" || !raw.starts_with('0'));
    if !canonical {
        return Err(ParseError::InvalidTimestamp(raw.to_string()));
    }
    raw.parse()
        .map_err(|_| ParseError::InvalidTimestamp(raw.to_string()))
}

fn validate_data(data: &str) -> Result<(), ParseError> {
    if data.is_empty() {
        return Err(ParseError::EmptyPayload);
    }
    if data.contains(['\n', '\r']) {
        return Err(ParseError::LineBreakInPayload);
    }
    Ok(())
}
