//! List persistence.
//!
//! The core never touches the file system directly: it talks to a
//! [`ListStore`], which stores each list's flat text under its UUID.
//! [`FsStore`] keeps one file per list in `<data_dir>/lists/`;
//! [`MemoryStore`] keeps them in memory.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::command::HandlerError;
use crate::error::ErrorCode;
use crate::list::{List, ParseReport, parse_list};
use crate::modification::Modification;

/// Directory under the data dir that holds list files.
pub const LIST_DIR: &str = "lists";

/// Storage failures, classified the same way for every backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("list '{0}' not found")]
    NotFound(String),

    #[error("storage access denied: {0}")]
    Security(String),

    #[error("storage in invalid state: {0}")]
    InvalidState(String),

    #[error("storage I/O failure: {0}")]
    Io(#[source] io::Error),
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::QuotaExceeded(_) => ErrorCode::QuotaExceeded,
            Self::NotFound(_) => ErrorCode::ListNotFound,
            Self::Security(_) => ErrorCode::StorageSecurity,
            Self::InvalidState(_) => ErrorCode::StorageInvalidState,
            Self::Io(_) => ErrorCode::StorageIo,
        }
    }

    /// Classify an I/O error raised while working on `what`.
    fn from_io(err: io::Error, what: &str) -> Self {
        match err.kind() {
            io::ErrorKind::StorageFull => Self::QuotaExceeded(format!("{what}: {err}")),
            io::ErrorKind::NotFound => Self::NotFound(what.to_string()),
            io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
                Self::Security(format!("{what}: {err}"))
            }
            _ => Self::Io(err),
        }
    }
}

/// Stored text of one list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredList {
    pub uuid: String,
    pub text: String,
}

/// Storage collaborator for lists.
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Write the list's current text, replacing any previous version.
    async fn save(&self, list: &List) -> Result<(), StoreError>;

    /// Raw text of one list, or `None` if it is not stored.
    async fn read(&self, uuid: &str) -> Result<Option<String>, StoreError>;

    /// Every stored list, sorted by UUID.
    async fn read_all(&self) -> Result<Vec<StoredList>, StoreError>;

    /// Remove a stored list.
    async fn delete(&self, uuid: &str) -> Result<(), StoreError>;
}

/// One file per list under `<data_dir>/lists/`.
#[derive(Debug, Clone)]
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    /// Open (and create if needed) the store rooted at `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the list directory cannot be created.
    pub async fn open(data_dir: &Path) -> Result<Self, StoreError> {
        let dir = data_dir.join(LIST_DIR);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::from_io(e, &dir.display().to_string()))?;
        debug!(path = %dir.display(), "list store opened");
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a list file, refusing names that would escape the directory.
    fn list_path(&self, uuid: &str) -> Result<PathBuf, StoreError> {
        if uuid.is_empty()
            || uuid.starts_with('.')
            || uuid.contains('/')
            || uuid.contains('\\')
            || uuid.contains("..")
        {
            return Err(StoreError::Security(format!("invalid list id '{uuid}'")));
        }
        Ok(self.dir.join(uuid))
    }
}

#[async_trait]
impl ListStore for FsStore {
    async fn save(&self, list: &List) -> Result<(), StoreError> {
        let path = self.list_path(list.uuid())?;
        let tmp = self.dir.join(format!(".{}.tmp", list.uuid()));
        let text = list.to_text();

        fs::write(&tmp, text.as_bytes())
            .await
            .map_err(|e| StoreError::from_io(e, list.uuid()))?;
        if let Err(err) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StoreError::from_io(err, list.uuid()));
        }

        debug!(uuid = list.uuid(), bytes = text.len(), "saved list");
        Ok(())
    }

    async fn read(&self, uuid: &str) -> Result<Option<String>, StoreError> {
        let path = self.list_path(uuid)?;
        match fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::from_io(err, uuid)),
        }
    }

    async fn read_all(&self) -> Result<Vec<StoredList>, StoreError> {
        let dir_name = self.dir.display().to_string();
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| StoreError::from_io(e, &dir_name))?;

        let mut lists = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::from_io(e, &dir_name))?
        {
            let Some(uuid) = entry.file_name().to_str().map(ToString::to_string) else {
                continue;
            };
            if uuid.starts_with('.') {
                continue;
            }
            if entry.file_type().await.is_ok_and(|kind| kind.is_dir()) {
                warn!(uuid, "skipping directory in list store");
                continue;
            }
            // One unreadable file must not hide the others.
            match self.read(&uuid).await {
                Ok(Some(text)) => lists.push(StoredList { uuid, text }),
                Ok(None) => {}
                Err(err) => warn!(uuid, error = %err, "skipping unreadable list file"),
            }
        }

        lists.sort_by(|a, b| a.uuid.cmp(&b.uuid));
        Ok(lists)
    }

    async fn delete(&self, uuid: &str) -> Result<(), StoreError> {
        let path = self.list_path(uuid)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| StoreError::from_io(e, uuid))?;
        debug!(uuid, "deleted list");
        Ok(())
    }
}

/// Lists kept in memory, keyed by UUID.
#[derive(Debug, Default)]
pub struct MemoryStore {
    lists: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw text directly, bypassing serialization.
    pub async fn insert_text(&self, uuid: impl Into<String>, text: impl Into<String>) {
        self.lists.lock().await.insert(uuid.into(), text.into());
    }
}

#[async_trait]
impl ListStore for MemoryStore {
    async fn save(&self, list: &List) -> Result<(), StoreError> {
        self.insert_text(list.uuid(), list.to_text()).await;
        Ok(())
    }

    async fn read(&self, uuid: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lists.lock().await.get(uuid).cloned())
    }

    async fn read_all(&self) -> Result<Vec<StoredList>, StoreError> {
        Ok(self
            .lists
            .lock()
            .await
            .iter()
            .map(|(uuid, text)| StoredList {
                uuid: uuid.clone(),
                text: text.clone(),
            })
            .collect())
    }

    async fn delete(&self, uuid: &str) -> Result<(), StoreError> {
        self.lists
            .lock()
            .await
            .remove(uuid)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(uuid.to_string()))
    }
}

/// A list loaded from storage together with what went wrong loading it.
#[derive(Debug, Clone)]
pub struct LoadedList {
    pub list: List,
    pub report: ParseReport,
}

/// Load and replay every stored list.
///
/// Lists whose text is unusable are skipped with a warning; lines that fail
/// inside a usable list are reported on that list.
///
/// # Errors
///
/// Returns a [`StoreError`] only if the store itself cannot be read.
pub async fn load_lists(store: &dyn ListStore) -> Result<Vec<LoadedList>, StoreError> {
    let stored = store.read_all().await?;
    let mut loaded = Vec::with_capacity(stored.len());
    for StoredList { uuid, text } in stored {
        match parse_list(&uuid, &text) {
            Ok((list, report)) => {
                if !report.is_clean() {
                    warn!(
                        uuid,
                        skipped = report.skipped.len(),
                        failed = report.replay.failures.len(),
                        "list loaded with errors"
                    );
                }
                loaded.push(LoadedList { list, report });
            }
            Err(err) => warn!(uuid, error = %err, "skipping unreadable list"),
        }
    }
    Ok(loaded)
}

/// Load and replay one stored list.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] if the list is not stored, or
/// [`StoreError::InvalidState`] if its text is unusable.
pub async fn load_list(store: &dyn ListStore, uuid: &str) -> Result<LoadedList, StoreError> {
    let text = store
        .read(uuid)
        .await?
        .ok_or_else(|| StoreError::NotFound(uuid.to_string()))?;
    let (list, report) =
        parse_list(uuid, &text).map_err(|e| StoreError::InvalidState(format!("{uuid}: {e}")))?;
    Ok(LoadedList { list, report })
}

/// Failure of [`modify_and_save`].
#[derive(Debug, thiserror::Error)]
pub enum ModifyError {
    /// The modification was rejected; nothing was saved.
    #[error(transparent)]
    Rejected(#[from] HandlerError),

    /// The modification applied in memory but could not be persisted.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ModifyError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Rejected(err) => err.code(),
            Self::Store(err) => err.code(),
        }
    }
}

/// Record and apply a user-issued modification, then persist the list.
///
/// A store failure is returned but does not roll anything back: the
/// modification stays applied in memory.
///
/// # Errors
///
/// Returns [`ModifyError::Rejected`] if the handler refuses the
/// modification, or [`ModifyError::Store`] if saving fails.
pub async fn modify_and_save(
    list: &mut List,
    modification: Modification,
    store: &dyn ListStore,
) -> Result<(), ModifyError> {
    list.modify(modification)?;
    store.save(list).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::user::UserId;

    fn issue(command: Command, data: &str) -> Modification {
        Modification::create(command, UserId::local_default(), data).expect("valid")
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryStore::new();
        let mut list = List::with_uuid("b", "second");
        let m = issue(Command::Create, "note|x");
        modify_and_save(&mut list, m, &store).await.expect("save");
        store.save(&List::with_uuid("a", "first")).await.expect("save");

        let all = store.read_all().await.expect("read_all");
        assert_eq!(
            all.iter().map(|s| s.uuid.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );

        let loaded = load_list(&store, "b").await.expect("load");
        assert_eq!(loaded.list.entries().len(), 1);
        assert!(loaded.report.is_clean());
    }

    #[tokio::test]
    async fn memory_store_delete_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.delete("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(err.code(), ErrorCode::ListNotFound);
    }

    #[tokio::test]
    async fn load_lists_skips_unusable_text() {
        let store = MemoryStore::new();
        store.insert_text("empty", "").await;
        store
            .insert_text("ok", "t\nlocal:0\n1 CREATE local:0 note|a\nbroken\n")
            .await;

        let loaded = load_lists(&store).await.expect("load");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].list.uuid(), "ok");
        assert_eq!(loaded[0].report.skipped.len(), 1);
        assert_eq!(loaded[0].list.entries().len(), 1);
    }

    #[tokio::test]
    async fn rejected_modification_is_not_saved() {
        let store = MemoryStore::new();
        let mut list = List::with_uuid("l", "t");
        let m = issue(Command::Check, "4");
        let err = modify_and_save(&mut list, m, &store).await.unwrap_err();
        assert!(matches!(err, ModifyError::Rejected(HandlerError::EntryNotFound { id: 4 })));
        assert_eq!(err.code(), ErrorCode::EntryNotFound);
        assert_eq!(store.read("l").await.expect("read"), None);
    }

    struct BrokenStore;

    #[async_trait]
    impl ListStore for BrokenStore {
        async fn save(&self, _list: &List) -> Result<(), StoreError> {
            Err(StoreError::QuotaExceeded("full".into()))
        }
        async fn read(&self, _uuid: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }
        async fn read_all(&self) -> Result<Vec<StoredList>, StoreError> {
            Ok(Vec::new())
        }
        async fn delete(&self, uuid: &str) -> Result<(), StoreError> {
            Err(StoreError::NotFound(uuid.to_string()))
        }
    }

    #[tokio::test]
    async fn store_failure_keeps_in_memory_state() {
        let mut list = List::with_uuid("l", "t");
        let m = issue(Command::Create, "check|kept");
        let err = modify_and_save(&mut list, m, &BrokenStore).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::QuotaExceeded);
        assert_eq!(list.modifications().len(), 1);
        assert_eq!(list.entries()[0].title(), "kept");
    }

    #[test]
    fn io_errors_are_classified() {
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert!(matches!(StoreError::from_io(denied, "x"), StoreError::Security(_)));
        let full = io::Error::from(io::ErrorKind::StorageFull);
        assert!(matches!(StoreError::from_io(full, "x"), StoreError::QuotaExceeded(_)));
        let missing = io::Error::from(io::ErrorKind::NotFound);
        assert!(matches!(StoreError::from_io(missing, "x"), StoreError::NotFound(_)));
        let other = io::Error::from(io::ErrorKind::Interrupted);
        assert!(matches!(StoreError::from_io(other, "x"), StoreError::Io(_)));
    }
}
