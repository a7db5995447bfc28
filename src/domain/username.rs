//! Registration key for the user registry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RaceError;

/// Immutable username, the key a signup request tries to claim.
///
/// Surrounding whitespace is trimmed at construction; an empty result is
/// rejected. Two usernames are equal when their trimmed text is equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Creates a username from the given text.
    ///
    /// # Errors
    ///
    /// Returns [`RaceError::InvalidUsername`] if the text is empty or
    /// contains only whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self, RaceError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RaceError::InvalidUsername(name));
        }
        if trimmed.len() == name.len() {
            Ok(Self(name))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    /// Returns the username text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Username {
    type Err = RaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Username {
    type Error = RaceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(username: Username) -> Self {
        username.0
    }
}
