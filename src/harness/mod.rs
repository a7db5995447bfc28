//! Orchestration layer: runs racing request handlers and reports the
//! final registry state.
//!
//! [`RaceHarness`] spawns the contenders, waits for all of them, and
//! turns the registry contents into a [`RaceOutcome`].

pub mod race_harness;

pub use race_harness::{PausePolicy, RaceHarness, RaceOutcome};
