//! Events describing the outcome of each signup attempt.
//!
//! A [`crate::handler::RequestHandler`] publishes one [`RegistrationEvent`]
//! through the [`super::EventBus`] after its `register` call returns.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{RequestId, Username};

/// Outcome of a single registration attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum RegistrationEvent {
    /// The registry stored the username for this request.
    Accepted {
        /// Request that made the attempt.
        request_id: RequestId,
        /// Username the request tried to claim.
        username: Username,
        /// Completion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The registry found the username already taken.
    Rejected {
        /// Request that made the attempt.
        request_id: RequestId,
        /// Username the request tried to claim.
        username: Username,
        /// Completion timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl RegistrationEvent {
    /// Builds the event matching a `register` result.
    #[must_use]
    pub fn from_outcome(request_id: RequestId, username: Username, accepted: bool) -> Self {
        let timestamp = Utc::now();
        if accepted {
            Self::Accepted {
                request_id,
                username,
                timestamp,
            }
        } else {
            Self::Rejected {
                request_id,
                username,
                timestamp,
            }
        }
    }

    /// Returns the request this event belongs to.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        match self {
            Self::Accepted { request_id, .. } | Self::Rejected { request_id, .. } => *request_id,
        }
    }

    /// Returns the username the request tried to claim.
    #[must_use]
    pub const fn username(&self) -> &Username {
        match self {
            Self::Accepted { username, .. } | Self::Rejected { username, .. } => username,
        }
    }

    /// Returns `true` for [`RegistrationEvent::Accepted`].
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}
