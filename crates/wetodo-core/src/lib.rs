//! wetodo-core library.
//!
//! A list is an append-only log of timestamped [`Modification`]s; its
//! entries are whatever replaying that log through the [`command`] registry
//! produces.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums per module, each with a `code()`
//!   mapping to [`ErrorCode`]; `anyhow::Result` only for configuration.
//! - **Logging**: `tracing` macros. Replay failures are `warn!`, per-record
//!   detail is `debug!`.

pub mod command;
pub mod config;
pub mod entry;
pub mod error;
pub mod list;
pub mod lock;
pub mod modification;
pub mod store;
pub mod user;

pub use command::{Command, HandlerError};
pub use entry::{Change, ChangeKind, Entry, EntryKind};
pub use error::ErrorCode;
pub use list::{List, ReplayReport};
pub use modification::Modification;
pub use store::{FsStore, ListStore, MemoryStore, StoreError, modify_and_save};
pub use user::{UserId, UserResolver};
