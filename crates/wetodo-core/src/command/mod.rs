//! The command registry.
//!
//! Each log line names one of a closed set of commands. The name is
//! resolved to a [`Command`] when the line is parsed, so an unknown name is
//! rejected at the boundary and never reaches replay. Every command maps to
//! exactly one [`Handler`] through [`Command::handler`].

pub mod handlers;

use std::fmt;
use std::str::FromStr;

use crate::error::ErrorCode;
use crate::list::ReplayContext;
use crate::modification::Modification;

pub use handlers::HandlerError;

/// State-transition function for one command.
///
/// Handlers validate their payload before touching the context, so a
/// returned error means the modification had no effect.
pub type Handler = fn(&Modification, &mut ReplayContext<'_>) -> Result<(), HandlerError>;

/// Every command a list log may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Create a new entry: `<type>|<title>`.
    Create,
    /// Remove an entry and prune its dependents: `<entryId>`.
    Delete,
    /// Toggle an entry's checked state: `<entryId>`.
    Check,
    /// Retitle an entry: `<entryId>|<title>`.
    Rename,
    /// Replace an entry's description: `<entryId>|<description>`.
    ChangeDesc,
    /// Move an entry to a position: `<entryId>|<index>`.
    Relocate,
    /// Retitle the list itself: `<title>`.
    ListRename,
    /// Compact the whole log down to this command.
    Clear,
}

/// Error returned when a command name is not in the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "unknown command '{raw}': expected one of CREATE, DELETE, CHECK, RENAME, \
     CHANGEDESC, RELOCATE, LISTRENAME, CLEAR"
)]
pub struct UnknownCommand {
    /// The unrecognised input string.
    pub raw: String,
}

impl UnknownCommand {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::UnknownCommand
    }
}

impl Command {
    /// All registered commands.
    pub const ALL: [Self; 8] = [
        Self::Create,
        Self::Delete,
        Self::Check,
        Self::Rename,
        Self::ChangeDesc,
        Self::Relocate,
        Self::ListRename,
        Self::Clear,
    ];

    /// Uppercase name used in the log.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Delete => "DELETE",
            Self::Check => "CHECK",
            Self::Rename => "RENAME",
            Self::ChangeDesc => "CHANGEDESC",
            Self::Relocate => "RELOCATE",
            Self::ListRename => "LISTRENAME",
            Self::Clear => "CLEAR",
        }
    }

    /// Whether the payload starts with the id of the entry it targets.
    #[must_use]
    pub const fn addresses_entry(self) -> bool {
        matches!(
            self,
            Self::Delete | Self::Check | Self::Rename | Self::ChangeDesc | Self::Relocate
        )
    }

    /// The handler implementing this command.
    #[must_use]
    pub fn handler(self) -> Handler {
        match self {
            Self::Create => handlers::create,
            Self::Delete => handlers::delete,
            Self::Check => handlers::check,
            Self::Rename => handlers::rename,
            Self::ChangeDesc => handlers::change_description,
            Self::Relocate => handlers::relocate,
            Self::ListRename => handlers::rename_list,
            Self::Clear => handlers::clear,
        }
    }
}

/// Resolve a command name, returning `None` if it is not registered.
#[must_use]
pub fn lookup(name: &str) -> Option<Command> {
    Command::ALL.into_iter().find(|c| c.as_str() == name)
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(s).ok_or_else(|| UnknownCommand { raw: s.to_string() })
    }
}
