//! Domain layer: usernames, the shared user registry, and events.
//!
//! The registry is the only shared mutable state in a race scenario.
//! The pause hook lets a scenario widen the window between the
//! registry's existence check and its insertion.

pub mod event_bus;
pub mod pause;
pub mod registration_event;
pub mod request_id;
pub mod user_registry;
pub mod username;

pub use event_bus::EventBus;
pub use pause::{FixedDelay, NoPause, PauseHook, Rendezvous};
pub use registration_event::RegistrationEvent;
pub use request_id::RequestId;
pub use user_registry::{RegistryVariant, SyncRegistry, UnsyncRegistry, UserRegistry};
pub use username::Username;
