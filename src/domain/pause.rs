//! Injectable pause between the existence check and the insertion.
//!
//! Both registry variants call [`PauseHook::between_check_and_insert`]
//! after deciding that a username is free and before storing it. The hook
//! widens the check-then-act window on demand, so a test can reproduce
//! the lost update without relying on scheduler luck.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Barrier;

use super::Username;

/// Hook run inside `register`, between the check and the insert.
pub trait PauseHook: Send + Sync {
    /// Suspends the calling registration for as long as the hook decides.
    fn between_check_and_insert(&self, username: &Username) -> impl Future<Output = ()> + Send;
}

/// Hook that returns immediately: the natural interleaving.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPause;

impl PauseHook for NoPause {
    async fn between_check_and_insert(&self, _username: &Username) {}
}

/// Hook that sleeps for a fixed duration.
///
/// Makes the race likely under the unsynchronized registry, but the
/// outcome still depends on when each contender gets scheduled.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl PauseHook for FixedDelay {
    async fn between_check_and_insert(&self, username: &Username) {
        tracing::trace!(%username, delay = ?self.0, "pausing before insert");
        tokio::time::sleep(self.0).await;
    }
}

/// Hook that holds every contender until all of them have passed the
/// existence check, or until `window` elapses.
///
/// Under the unsynchronized registry all contenders meet at the barrier
/// with the username still absent, then all insert: the duplicate is
/// deterministic. Under the synchronized registry only the lock holder
/// reaches the barrier; it waits out `window` alone and proceeds.
///
/// A `Rendezvous` is meant for a single scenario. A wait that times out
/// still counts as an arrival at the barrier.
#[derive(Debug)]
pub struct Rendezvous {
    barrier: Barrier,
    window: Duration,
}

impl Rendezvous {
    /// Creates a rendezvous for `parties` contenders.
    #[must_use]
    pub fn new(parties: usize, window: Duration) -> Self {
        Self {
            barrier: Barrier::new(parties),
            window,
        }
    }

    /// Returns the longest time a contender waits for the others.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }
}

impl PauseHook for Rendezvous {
    async fn between_check_and_insert(&self, username: &Username) {
        match tokio::time::timeout(self.window, self.barrier.wait()).await {
            Ok(_) => tracing::trace!(%username, "rendezvous complete"),
            Err(_) => tracing::debug!(
                %username,
                window = ?self.window,
                "rendezvous window elapsed, proceeding alone"
            ),
        }
    }
}
