//! Shared in-memory user store with a check-then-act `register`.
//!
//! Two implementations of [`UserRegistry`] share the same two-step
//! registration: an existence check followed by an insertion, with a
//! [`PauseHook`] in between.
//!
//! - [`UnsyncRegistry`] takes a read guard for the check and a separate
//!   write guard for the insert. Each step is memory-safe, but another
//!   request can slip in between them and both end up inserting.
//! - [`SyncRegistry`] holds one [`tokio::sync::Mutex`] guard across the
//!   check, the hook and the insert, so at most one registration of a
//!   username succeeds.
//!
//! Usernames are kept in an insertion-ordered list rather than a set, so
//! a lost race shows up as a duplicated entry and [`UserRegistry::size`]
//! grows past the number of distinct names.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use super::Username;
use super::pause::{NoPause, PauseHook};
use crate::error::RaceError;

/// Which registration strategy a registry uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryVariant {
    /// Check and insert are separate critical sections.
    Unsynchronized,
    /// One lock spans check and insert.
    Synchronized,
}

impl RegistryVariant {
    /// Returns the snake_case name used in logs and configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unsynchronized => "unsynchronized",
            Self::Synchronized => "synchronized",
        }
    }
}

impl fmt::Display for RegistryVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistryVariant {
    type Err = RaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unsynchronized" | "unsync" => Ok(Self::Unsynchronized),
            "synchronized" | "sync" => Ok(Self::Synchronized),
            other => Err(RaceError::InvalidConfig(format!(
                "unknown registry variant: {other}"
            ))),
        }
    }
}

/// In-memory registry of usernames shared by concurrent request handlers.
///
/// No operation fails. The outcome of a race is read back through
/// [`size`](Self::size) and [`usernames`](Self::usernames).
pub trait UserRegistry: Send + Sync {
    /// Registers `username` if it is not already present.
    ///
    /// Returns `true` when this call stored the username and `false`
    /// (without mutation) when the check found it already registered.
    fn register(&self, username: &Username) -> impl Future<Output = bool> + Send;

    /// Returns `true` if `username` has been stored.
    fn contains(&self, username: &Username) -> impl Future<Output = bool> + Send;

    /// Returns the number of stored entries.
    fn size(&self) -> impl Future<Output = usize> + Send;

    /// Returns a snapshot of the stored entries in insertion order.
    fn usernames(&self) -> impl Future<Output = Vec<Username>> + Send;

    /// Returns the registration strategy of this registry.
    fn variant(&self) -> RegistryVariant;
}

/// Registry whose `register` is a plain check-then-act.
///
/// Between [`contains`](UserRegistry::contains) and the insertion no
/// guard is held, so two concurrent registrations of the same username
/// can both succeed.
#[derive(Debug, Default)]
pub struct UnsyncRegistry<P = NoPause> {
    users: RwLock<Vec<Username>>,
    pause: P,
}

impl UnsyncRegistry {
    /// Creates an empty registry with no pause between check and insert.
    #[must_use]
    pub fn new() -> Self {
        Self::with_pause(NoPause)
    }
}

impl<P: PauseHook> UnsyncRegistry<P> {
    /// Creates an empty registry that runs `pause` between check and
    /// insert.
    #[must_use]
    pub fn with_pause(pause: P) -> Self {
        Self {
            users: RwLock::new(Vec::new()),
            pause,
        }
    }
}

impl<P: PauseHook> UserRegistry for UnsyncRegistry<P> {
    async fn register(&self, username: &Username) -> bool {
        if self.contains(username).await {
            tracing::debug!(%username, variant = "unsynchronized", "already registered");
            return false;
        }
        tracing::debug!(%username, variant = "unsynchronized", "username free, inserting");
        self.pause.between_check_and_insert(username).await;

        self.users.write().await.push(username.clone());
        true
    }

    async fn contains(&self, username: &Username) -> bool {
        self.users.read().await.contains(username)
    }

    async fn size(&self) -> usize {
        self.users.read().await.len()
    }

    async fn usernames(&self) -> Vec<Username> {
        self.users.read().await.clone()
    }

    fn variant(&self) -> RegistryVariant {
        RegistryVariant::Unsynchronized
    }
}

/// Registry whose `register` is serialized by a single mutex.
///
/// The guard is taken before the existence check and released after the
/// insertion, so the pause hook runs inside the critical section.
#[derive(Debug, Default)]
pub struct SyncRegistry<P = NoPause> {
    users: Mutex<Vec<Username>>,
    pause: P,
}

impl SyncRegistry {
    /// Creates an empty registry with no pause between check and insert.
    #[must_use]
    pub fn new() -> Self {
        Self::with_pause(NoPause)
    }
}

impl<P: PauseHook> SyncRegistry<P> {
    /// Creates an empty registry that runs `pause` between check and
    /// insert, while the lock is held.
    #[must_use]
    pub fn with_pause(pause: P) -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            pause,
        }
    }
}

impl<P: PauseHook> UserRegistry for SyncRegistry<P> {
    async fn register(&self, username: &Username) -> bool {
        let mut users = self.users.lock().await;
        if users.contains(username) {
            tracing::debug!(%username, variant = "synchronized", "already registered");
            return false;
        }
        tracing::debug!(%username, variant = "synchronized", "username free, inserting");
        self.pause.between_check_and_insert(username).await;

        users.push(username.clone());
        true
    }

    async fn contains(&self, username: &Username) -> bool {
        self.users.lock().await.contains(username)
    }

    async fn size(&self) -> usize {
        self.users.lock().await.len()
    }

    async fn usernames(&self) -> Vec<Username> {
        self.users.lock().await.clone()
    }

    fn variant(&self) -> RegistryVariant {
        RegistryVariant::Synchronized
    }
}
