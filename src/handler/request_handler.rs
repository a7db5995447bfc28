//! Simulated signup request.
//!
//! A [`RequestHandler`] carries one [`Username`] and a shared reference to
//! the registry. Running it performs exactly one registration attempt;
//! nothing is returned, the outcome is only visible in the registry (and,
//! when attached, on the [`EventBus`]).

use std::sync::Arc;

use crate::domain::{EventBus, RegistrationEvent, RequestId, UserRegistry, Username};

/// Transient handler for a single signup request.
#[derive(Debug)]
pub struct RequestHandler<R> {
    request_id: RequestId,
    username: Username,
    registry: Arc<R>,
    events: Option<EventBus>,
}

impl<R: UserRegistry> RequestHandler<R> {
    /// Creates a handler that will try to register `username` in
    /// `registry`.
    #[must_use]
    pub fn new(username: Username, registry: Arc<R>) -> Self {
        Self {
            request_id: RequestId::new(),
            username,
            registry,
            events: None,
        }
    }

    /// Attaches an event bus that receives the outcome of [`run`](Self::run).
    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Returns the identifier minted for this request.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the username this request tries to claim.
    #[must_use]
    pub const fn username(&self) -> &Username {
        &self.username
    }

    /// Performs the registration attempt and consumes the handler.
    pub async fn run(self) {
        let Self {
            request_id,
            username,
            registry,
            events,
        } = self;

        let accepted = registry.register(&username).await;
        if accepted {
            tracing::info!(%request_id, %username, "signup accepted");
        } else {
            tracing::info!(%request_id, %username, "signup rejected: username taken");
        }

        if let Some(bus) = events {
            let _ = bus.publish(RegistrationEvent::from_outcome(
                request_id, username, accepted,
            ));
        }
    }
}
