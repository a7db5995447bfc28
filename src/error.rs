//! Error types for the race testbed.
//!
//! Registry and handler operations are total: a lost race is not an
//! error but a duplicated entry, detected afterwards through
//! [`crate::domain::UserRegistry::size`]. [`RaceError`] only covers the
//! fallible edges around them: building values, configuring a scenario,
//! and joining the spawned handler tasks.

/// Error enum for scenario setup and orchestration.
#[derive(Debug, thiserror::Error)]
pub enum RaceError {
    /// Username was empty or whitespace only.
    #[error("invalid username: {0:?}")]
    InvalidUsername(String),

    /// Scenario parameters cannot produce a race.
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    /// A configuration value could not be interpreted.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A spawned request handler panicked or was cancelled.
    #[error("request handler failed: {0}")]
    HandlerFailed(#[from] tokio::task::JoinError),
}

impl RaceError {
    /// Returns a stable numeric code for this variant.
    ///
    /// | Range     | Category      |
    /// |-----------|---------------|
    /// | 1000–1999 | Validation    |
    /// | 3000–3999 | Orchestration |
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidUsername(_) => 1001,
            Self::InvalidScenario(_) => 1002,
            Self::InvalidConfig(_) => 1003,
            Self::HandlerFailed(_) => 3001,
        }
    }
}
