//! # signup-race
//!
//! A check-then-act race testbed: simulated signup requests racing to
//! register the same username in a shared in-memory registry.
//!
//! The registry's `register` is two steps, an existence check and an
//! insertion. Without a lock spanning both, two concurrent requests can
//! each see the name as free and both store it. An injectable pause
//! between the steps makes that interleaving reproducible on demand.
//!
//! ## Architecture
//!
//! ```text
//! RaceHarness (harness/)
//!     │  spawns N tasks, waits for all
//!     ├── RequestHandler (handler/)
//!     │       │  one register() per request
//!     │       └── EventBus (domain/)
//!     │
//!     └── UserRegistry (domain/)
//!             ├── UnsyncRegistry  check │ pause │ insert
//!             └── SyncRegistry    [check  pause  insert] under one mutex
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use signup_race::domain::{RegistryVariant, Username};
//! use signup_race::harness::{PausePolicy, RaceHarness};
//!
//! # async fn demo() -> Result<(), signup_race::error::RaceError> {
//! let harness = RaceHarness::new(Username::new("gugu")?, 2)?;
//! let outcome = harness
//!     .run_variant(
//!         RegistryVariant::Unsynchronized,
//!         PausePolicy::Rendezvous(Duration::from_secs(1)),
//!     )
//!     .await?;
//! assert_eq!(outcome.final_size, 2);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod handler;
pub mod harness;
