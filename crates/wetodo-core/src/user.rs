//! User identities and display-name resolution.
//!
//! Every modification is attributed to a [`UserId`] of the form
//! `<provider>:<id>` (`local:0`, `gh:1234`). Turning an id into something
//! displayable is the job of a [`ProviderResolver`] registered for that
//! provider. The [`UserResolver`] owns the provider table and a cache of
//! resolved profiles; it is constructed once by the application and handed
//! to whatever needs display names. Replay never depends on it.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::ErrorCode;

/// Display names of the built-in `local` provider, indexed by uid.
pub const LOCAL_USERS: [&str; 3] = ["WeToDo", "John Doe", "Jane Doe"];

/// Provider name served by [`LocalProviderResolver`].
pub const LOCAL_PROVIDER: &str = "local";

// ---------------------------------------------------------------------------
// UserId
// ---------------------------------------------------------------------------

/// A validated `<provider>:<id>` user identifier.
///
/// The provider is one or more ASCII lowercase letters and the id one or
/// more ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

/// Error returned when a string is not a valid `<provider>:<id>` user id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid user id '{raw}': expected <provider>:<digits>, e.g. local:0")]
pub struct InvalidUserId {
    /// The rejected input.
    pub raw: String,
}

impl InvalidUserId {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InvalidUser
    }
}

impl UserId {
    /// Parse and validate a user id.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidUserId`] if `raw` does not match `[a-z]+:[0-9]+`.
    pub fn parse(raw: &str) -> Result<Self, InvalidUserId> {
        let valid = raw.split_once(':').is_some_and(|(provider, uid)| {
            !provider.is_empty()
                && provider.bytes().all(|b| b.is_ascii_lowercase())
                && !uid.is_empty()
                && uid.bytes().all(|b| b.is_ascii_digit())
        });

        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(InvalidUserId {
                raw: raw.to_string(),
            })
        }
    }

    /// The full `<provider>:<id>` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The provider part (before the colon).
    #[must_use]
    pub fn provider(&self) -> &str {
        self.0.split_once(':').map_or("", |(provider, _)| provider)
    }

    /// The provider-local id (after the colon).
    #[must_use]
    pub fn uid(&self) -> &str {
        self.0.split_once(':').map_or("", |(_, uid)| uid)
    }

    /// The first local user, used when nothing else is configured.
    #[must_use]
    pub fn local_default() -> Self {
        Self(format!("{LOCAL_PROVIDER}:0"))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = InvalidUserId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Display data for a resolved user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub display_name: String,
}

/// Errors from user resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No resolver is registered for the user's provider.
    #[error("unknown user provider: '{provider}'")]
    UnknownProvider { provider: String },

    /// The `local` provider has no user with this uid.
    #[error("unknown local user: '{uid}'")]
    UnknownLocalUser { uid: String },

    /// A provider failed to look the user up.
    #[error("provider '{provider}' failed to resolve '{uid}': {message}")]
    Lookup {
        provider: String,
        uid: String,
        message: String,
    },
}

impl ResolveError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownProvider { .. } => ErrorCode::UnknownProvider,
            Self::UnknownLocalUser { .. } => ErrorCode::UnknownLocalUser,
            Self::Lookup { .. } => ErrorCode::InternalUnexpected,
        }
    }
}

/// Resolves provider-local uids to profiles for one provider.
#[async_trait]
pub trait ProviderResolver: Send + Sync {
    /// Provider name this resolver serves (the part before the colon).
    fn provider(&self) -> &str;

    /// Look up the profile for `uid`.
    async fn resolve(&self, uid: &str) -> Result<UserProfile, ResolveError>;
}

/// The built-in `local` provider backed by [`LOCAL_USERS`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalProviderResolver;

#[async_trait]
impl ProviderResolver for LocalProviderResolver {
    fn provider(&self) -> &str {
        LOCAL_PROVIDER
    }

    async fn resolve(&self, uid: &str) -> Result<UserProfile, ResolveError> {
        uid.parse::<usize>()
            .ok()
            .and_then(|index| LOCAL_USERS.get(index))
            .map(|name| UserProfile {
                display_name: (*name).to_string(),
            })
            .ok_or_else(|| ResolveError::UnknownLocalUser {
                uid: uid.to_string(),
            })
    }
}

/// Provider table plus a cache of resolved profiles.
///
/// The cache lives as long as the resolver and is never cleared implicitly.
pub struct UserResolver {
    providers: HashMap<String, Arc<dyn ProviderResolver>>,
    cache: RwLock<HashMap<UserId, UserProfile>>,
}

impl UserResolver {
    /// A resolver with no providers registered.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// A resolver with the built-in `local` provider registered.
    #[must_use]
    pub fn new() -> Self {
        let mut resolver = Self::empty();
        resolver.register(Arc::new(LocalProviderResolver));
        resolver
    }

    /// Register (or replace) the resolver for its provider.
    pub fn register(&mut self, resolver: Arc<dyn ProviderResolver>) {
        self.providers
            .insert(resolver.provider().to_string(), resolver);
    }

    /// Whether a resolver exists for `provider`.
    #[must_use]
    pub fn has_provider(&self, provider: &str) -> bool {
        self.providers.contains_key(provider)
    }

    /// Resolve `user`, consulting the cache first.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnknownProvider`] when no resolver is
    /// registered for the user's provider, or whatever the provider reports.
    pub async fn resolve(&self, user: &UserId) -> Result<UserProfile, ResolveError> {
        if let Some(profile) = self.cache.read().await.get(user) {
            return Ok(profile.clone());
        }

        let provider = self.providers.get(user.provider()).ok_or_else(|| {
            ResolveError::UnknownProvider {
                provider: user.provider().to_string(),
            }
        })?;

        let profile = provider.resolve(user.uid()).await?;
        debug!(user = %user, name = %profile.display_name, "resolved user");
        self.cache
            .write()
            .await
            .insert(user.clone(), profile.clone());
        Ok(profile)
    }

    /// Return a cached profile without resolving.
    pub async fn cached(&self, user: &UserId) -> Option<UserProfile> {
        self.cache.read().await.get(user).cloned()
    }
}

impl Default for UserResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UserResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        providers.sort_unstable();
        f.debug_struct("UserResolver")
            .field("providers", &providers)
            .finish_non_exhaustive()
    }
}
