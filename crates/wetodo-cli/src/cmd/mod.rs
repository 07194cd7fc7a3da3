pub mod completions;
pub mod entry;
pub mod list;

use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;
use wetodo_core::config::EffectiveConfig;
use wetodo_core::lock::{DEFAULT_LOCK_TIMEOUT, StoreLock};
use wetodo_core::store::{LoadedList, load_list};
use wetodo_core::{
    Command, Entry, FsStore, List, ListStore, Modification, UserId, UserResolver, modify_and_save,
};

use crate::output::OutputMode;

/// Everything a command needs: resolved config, the store and the resolver.
pub struct Session {
    pub config: EffectiveConfig,
    pub output: OutputMode,
    pub store: FsStore,
    pub resolver: UserResolver,
}

impl Session {
    pub async fn open(config: EffectiveConfig) -> Result<Self> {
        let output = OutputMode::from_resolved(&config.resolved_output);
        let store = FsStore::open(&config.data_dir)
            .await
            .with_context(|| format!("Failed to open data dir {}", config.data_dir.display()))?;
        Ok(Self {
            config,
            output,
            store,
            resolver: UserResolver::new(),
        })
    }

    pub fn user(&self) -> &UserId {
        &self.config.user
    }

    /// Take the writer lock for the data directory.
    pub fn lock(&self) -> Result<StoreLock> {
        StoreLock::acquire(&self.config.data_dir, DEFAULT_LOCK_TIMEOUT).map_err(|err| {
            let hint = err.hint().unwrap_or_default();
            anyhow!("{err}. {hint}")
        })
    }

    /// Find a list by exact UUID or unique UUID prefix and replay it.
    pub async fn find_list(&self, query: &str) -> Result<List> {
        let uuid = self.resolve_uuid(query).await?;
        let LoadedList { list, report } = load_list(&self.store, &uuid).await?;
        if !report.is_clean() {
            tracing::warn!(
                uuid,
                skipped = report.skipped.len(),
                failed = report.replay.failures.len(),
                "list loaded with errors"
            );
        }
        Ok(list)
    }

    async fn resolve_uuid(&self, query: &str) -> Result<String> {
        let stored = self.store.read_all().await?;
        if stored.iter().any(|s| s.uuid == query) {
            return Ok(query.to_string());
        }

        let mut matches = stored.into_iter().filter(|s| s.uuid.starts_with(query));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Ok(only.uuid),
            (None, _) => bail!(
                "{}: no list matches '{query}'. Run `wetodo lists` to see stored lists.",
                wetodo_core::ErrorCode::ListNotFound.code()
            ),
            (Some(first), Some(second)) => bail!(
                "list prefix '{query}' is ambiguous: matches {} and {} at least",
                first.uuid,
                second.uuid
            ),
        }
    }

    /// Record a command issued by the current user, apply it and save.
    pub async fn issue(&self, list: &mut List, command: Command, data: String) -> Result<()> {
        let modification = Modification::create(command, self.user().clone(), data)
            .with_context(|| format!("Invalid {command} command"))?;
        modify_and_save(list, modification, &self.store)
            .await
            .map_err(|err| match err.code().hint() {
                Some(hint) => anyhow!("{}: {err}. {hint}", err.code().code()),
                None => anyhow!("{}: {err}", err.code().code()),
            })
    }

    /// Save list metadata changed outside the log.
    pub async fn save(&self, list: &List) -> Result<()> {
        self.store.save(list).await?;
        Ok(())
    }
}

/// JSON/text view of one entry together with the list it belongs to.
#[derive(Debug, Serialize)]
pub struct EntryView<'a> {
    pub list: &'a str,
    #[serde(flatten)]
    pub entry: &'a Entry,
}

/// Parse an entry id argument.
pub fn entry_id(raw: &str) -> Result<u64> {
    raw.parse()
        .with_context(|| format!("Entry id '{raw}' is not a non-negative integer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_id_rejects_garbage() {
        assert_eq!(entry_id("12").unwrap(), 12);
        assert!(entry_id("-1").is_err());
        assert!(entry_id("x").is_err());
    }
}
