use std::fmt;

/// Machine-readable error codes shared by every error type in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    MalformedLine,
    UnknownCommand,
    InvalidUser,
    InvalidPayload,
    EntryNotFound,
    IdSpaceExhausted,
    ListNotFound,
    EmptyListText,
    QuotaExceeded,
    StorageSecurity,
    StorageInvalidState,
    StorageIo,
    LockContention,
    ConfigParseError,
    UnknownProvider,
    UnknownLocalUser,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MalformedLine => "E1001",
            Self::UnknownCommand => "E1002",
            Self::InvalidUser => "E1003",
            Self::InvalidPayload => "E1004",
            Self::EntryNotFound => "E2001",
            Self::IdSpaceExhausted => "E2004",
            Self::ListNotFound => "E2002",
            Self::EmptyListText => "E2003",
            Self::QuotaExceeded => "E3001",
            Self::StorageSecurity => "E3002",
            Self::StorageInvalidState => "E3003",
            Self::StorageIo => "E3004",
            Self::LockContention => "E3005",
            Self::ConfigParseError => "E4001",
            Self::UnknownProvider => "E5001",
            Self::UnknownLocalUser => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MalformedLine => "Malformed log line",
            Self::UnknownCommand => "Unknown command",
            Self::InvalidUser => "Invalid user id",
            Self::InvalidPayload => "Invalid command payload",
            Self::EntryNotFound => "Entry not found",
            Self::IdSpaceExhausted => "Entry id space exhausted",
            Self::ListNotFound => "List not found",
            Self::EmptyListText => "List text is empty",
            Self::QuotaExceeded => "Storage quota exceeded",
            Self::StorageSecurity => "Storage access denied",
            Self::StorageInvalidState => "Storage in invalid state",
            Self::StorageIo => "Storage I/O failure",
            Self::LockContention => "Lock contention",
            Self::ConfigParseError => "Config file parse error",
            Self::UnknownProvider => "Unknown user provider",
            Self::UnknownLocalUser => "Unknown local user",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::MalformedLine => {
                Some("Log lines look like `<epoch-ms> <COMMAND> <provider:id> <data>`.")
            }
            Self::UnknownCommand => Some(
                "Use one of CREATE, DELETE, CHECK, RENAME, CHANGEDESC, RELOCATE, LISTRENAME, CLEAR.",
            ),
            Self::InvalidUser => Some("User ids look like `local:0` or `gh:1234`."),
            Self::InvalidPayload => None,
            Self::EntryNotFound => Some("The entry may have been deleted; run `wetodo show`."),
            Self::IdSpaceExhausted => Some("Clear the list or start a new one."),
            Self::ListNotFound => Some("Run `wetodo lists` to see stored lists."),
            Self::EmptyListText => None,
            Self::QuotaExceeded => Some("Free disk space and retry."),
            Self::StorageSecurity => Some("Check permissions on the data directory."),
            Self::StorageInvalidState => Some("Retry once the data directory is stable."),
            Self::StorageIo => Some("Check disk space and write permissions."),
            Self::LockContention => {
                Some("Retry after the other `wetodo` process releases its lock.")
            }
            Self::ConfigParseError => Some("Fix syntax in wetodo/config.toml and retry."),
            Self::UnknownProvider => None,
            Self::UnknownLocalUser => Some("Local users are local:0 through local:2."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
