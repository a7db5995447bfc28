//! Race harness: concurrent signups for one username.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinSet;

use crate::domain::{
    EventBus, FixedDelay, NoPause, PauseHook, RegistryVariant, Rendezvous, SyncRegistry,
    UnsyncRegistry, UserRegistry, Username,
};
use crate::error::RaceError;
use crate::handler::RequestHandler;

/// Pause injected between the existence check and the insertion when the
/// harness builds the registry itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PausePolicy {
    /// No pause: the natural interleaving.
    None,
    /// Sleep for the given duration ([`FixedDelay`]).
    Delay(Duration),
    /// Wait for every contender, at most the given window ([`Rendezvous`]).
    Rendezvous(Duration),
}

/// Final registry state after every contender has finished.
#[derive(Debug, Clone, Serialize)]
pub struct RaceOutcome {
    /// Strategy of the registry the race ran against.
    pub variant: RegistryVariant,
    /// Username every contender tried to claim.
    pub username: Username,
    /// Number of concurrent handlers.
    pub contenders: usize,
    /// `size()` of the registry once all handlers completed.
    pub final_size: usize,
    /// Registry contents in insertion order.
    pub registered: Vec<Username>,
}

impl RaceOutcome {
    /// Returns how many stored entries repeat an earlier one.
    #[must_use]
    pub fn duplicates(&self) -> usize {
        let distinct: HashSet<&Username> = self.registered.iter().collect();
        self.registered.len().saturating_sub(distinct.len())
    }

    /// Returns `true` if every username is stored at most once.
    #[must_use]
    pub fn invariant_holds(&self) -> bool {
        self.duplicates() == 0
    }
}

/// Runs a fixed number of concurrent request handlers that all register
/// the same username.
#[derive(Debug, Clone)]
pub struct RaceHarness {
    username: Username,
    contenders: usize,
    events: Option<EventBus>,
}

impl RaceHarness {
    /// Creates a harness for `contenders` handlers racing on `username`.
    ///
    /// # Errors
    ///
    /// Returns [`RaceError::InvalidScenario`] if fewer than two
    /// contenders are requested.
    pub fn new(username: Username, contenders: usize) -> Result<Self, RaceError> {
        if contenders < 2 {
            return Err(RaceError::InvalidScenario(format!(
                "a race needs at least 2 contenders, got {contenders}"
            )));
        }
        Ok(Self {
            username,
            contenders,
            events: None,
        })
    }

    /// Attaches an event bus handed to every spawned handler.
    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Returns the contested username.
    #[must_use]
    pub const fn username(&self) -> &Username {
        &self.username
    }

    /// Returns the number of concurrent handlers.
    #[must_use]
    pub const fn contenders(&self) -> usize {
        self.contenders
    }

    /// Runs every contender against `registry` and reports its final
    /// state.
    ///
    /// All handlers are spawned before any is awaited. The harness collects
    /// them in completion order and reads the registry only once every
    /// handler has finished.
    ///
    /// # Errors
    ///
    /// Returns [`RaceError::HandlerFailed`] if a handler task panicked or
    /// was cancelled.
    pub async fn run<R>(&self, registry: Arc<R>) -> Result<RaceOutcome, RaceError>
    where
        R: UserRegistry + 'static,
    {
        let variant = registry.variant();
        tracing::info!(
            username = %self.username,
            contenders = self.contenders,
            %variant,
            "starting race"
        );

        let mut handlers = JoinSet::new();
        for _ in 0..self.contenders {
            let mut handler = RequestHandler::new(self.username.clone(), Arc::clone(&registry));
            if let Some(bus) = &self.events {
                handler = handler.with_events(bus.clone());
            }
            handlers.spawn(handler.run());
        }

        while let Some(joined) = handlers.join_next().await {
            joined?;
        }

        let outcome = RaceOutcome {
            variant,
            username: self.username.clone(),
            contenders: self.contenders,
            final_size: registry.size().await,
            registered: registry.usernames().await,
        };

        if outcome.invariant_holds() {
            tracing::info!(%variant, final_size = outcome.final_size, "race finished");
        } else {
            tracing::warn!(
                %variant,
                final_size = outcome.final_size,
                duplicates = outcome.duplicates(),
                "race finished with duplicate registrations"
            );
        }
        Ok(outcome)
    }

    /// Builds a fresh, empty registry of `variant` with the pause described
    /// by `pause`, then runs the race against it.
    ///
    /// # Errors
    ///
    /// Returns [`RaceError::HandlerFailed`] if a handler task panicked or
    /// was cancelled.
    pub async fn run_variant(
        &self,
        variant: RegistryVariant,
        pause: PausePolicy,
    ) -> Result<RaceOutcome, RaceError> {
        match pause {
            PausePolicy::None => self.run_with_pause(variant, NoPause).await,
            PausePolicy::Delay(delay) => self.run_with_pause(variant, FixedDelay(delay)).await,
            PausePolicy::Rendezvous(window) => {
                self.run_with_pause(variant, Rendezvous::new(self.contenders, window))
                    .await
            }
        }
    }

    async fn run_with_pause<P>(
        &self,
        variant: RegistryVariant,
        pause: P,
    ) -> Result<RaceOutcome, RaceError>
    where
        P: PauseHook + 'static,
    {
        match variant {
            RegistryVariant::Unsynchronized => {
                self.run(Arc::new(UnsyncRegistry::with_pause(pause))).await
            }
            RegistryVariant::Synchronized => {
                self.run(Arc::new(SyncRegistry::with_pause(pause))).await
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn gugu() -> Username {
        let Ok(name) = Username::new("gugu") else {
            panic!("valid username");
        };
        name
    }

    fn harness(contenders: usize) -> RaceHarness {
        let Ok(harness) = RaceHarness::new(gugu(), contenders) else {
            panic!("valid scenario");
        };
        harness
    }

    async fn outcome(
        harness: &RaceHarness,
        variant: RegistryVariant,
        pause: PausePolicy,
    ) -> RaceOutcome {
        let Ok(outcome) = harness.run_variant(variant, pause).await else {
            panic!("race failed");
        };
        outcome
    }

    #[test]
    fn rejects_fewer_than_two_contenders() {
        assert!(matches!(
            RaceHarness::new(gugu(), 1),
            Err(RaceError::InvalidScenario(_))
        ));
        assert!(matches!(
            RaceHarness::new(gugu(), 0),
            Err(RaceError::InvalidScenario(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unsynchronized_rendezvous_registers_gugu_twice() {
        let harness = harness(2);
        let outcome = outcome(
            &harness,
            RegistryVariant::Unsynchronized,
            PausePolicy::Rendezvous(Duration::from_secs(5)),
        )
        .await;

        assert_eq!(outcome.final_size, 2);
        assert_eq!(outcome.duplicates(), 1);
        assert!(!outcome.invariant_holds());
        assert_eq!(outcome.registered, vec![gugu(), gugu()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn synchronized_registers_gugu_once_under_every_pause() {
        let harness = harness(2);
        for pause in [
            PausePolicy::None,
            PausePolicy::Delay(Duration::from_millis(10)),
            PausePolicy::Rendezvous(Duration::from_millis(50)),
        ] {
            let outcome = outcome(&harness, RegistryVariant::Synchronized, pause).await;
            assert_eq!(outcome.final_size, 1, "pause {pause:?}");
            assert!(outcome.invariant_holds());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn synchronized_holds_over_many_runs() {
        let harness = harness(2);
        for _ in 0..100 {
            let outcome = outcome(&harness, RegistryVariant::Synchronized, PausePolicy::None).await;
            assert_eq!(outcome.final_size, 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unsynchronized_delay_can_lose_the_race() {
        let harness = harness(2);
        let mut lost = false;
        for _ in 0..20 {
            let outcome = outcome(
                &harness,
                RegistryVariant::Unsynchronized,
                PausePolicy::Delay(Duration::from_millis(25)),
            )
            .await;
            assert!(outcome.final_size == 1 || outcome.final_size == 2);
            if outcome.final_size == 2 {
                lost = true;
                break;
            }
        }
        assert!(lost, "duplicate registration never observed");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn rendezvous_scales_to_more_contenders() {
        let harness = harness(4);
        let unsync = outcome(
            &harness,
            RegistryVariant::Unsynchronized,
            PausePolicy::Rendezvous(Duration::from_secs(5)),
        )
        .await;
        assert_eq!(unsync.final_size, 4);
        assert_eq!(unsync.duplicates(), 3);

        let sync = outcome(
            &harness,
            RegistryVariant::Synchronized,
            PausePolicy::Rendezvous(Duration::from_millis(30)),
        )
        .await;
        assert_eq!(sync.final_size, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn run_accepts_caller_built_registry() {
        let registry = Arc::new(SyncRegistry::new());
        let harness = harness(2);
        let Ok(outcome) = harness.run(Arc::clone(&registry)).await else {
            panic!("race failed");
        };
        assert_eq!(outcome.variant, RegistryVariant::Synchronized);
        assert_eq!(outcome.final_size, registry.size().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn events_report_one_acceptance_per_stored_entry() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let harness = harness(2).with_events(bus);

        let unsync = outcome(
            &harness,
            RegistryVariant::Unsynchronized,
            PausePolicy::Rendezvous(Duration::from_secs(5)),
        )
        .await;
        let sync = outcome(&harness, RegistryVariant::Synchronized, PausePolicy::None).await;

        let mut accepted = 0;
        for _ in 0..4 {
            let Ok(event) = rx.recv().await else {
                panic!("missing event");
            };
            assert_eq!(event.username(), &gugu());
            if event.is_accepted() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, unsync.final_size + sync.final_size);
    }

    #[test]
    fn outcome_serializes_variant_in_snake_case() {
        let outcome = RaceOutcome {
            variant: RegistryVariant::Synchronized,
            username: gugu(),
            contenders: 2,
            final_size: 1,
            registered: vec![gugu()],
        };
        let Ok(value) = serde_json::to_value(&outcome) else {
            panic!("serialization failed");
        };
        assert_eq!(
            value.get("variant").and_then(|v| v.as_str()),
            Some("synchronized")
        );
        assert_eq!(value.get("final_size").and_then(|v| v.as_u64()), Some(1));
    }
}
