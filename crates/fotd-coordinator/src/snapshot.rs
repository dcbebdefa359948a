//! What a coordinator exposes to its host: the cached flavor plus enough
//! bookkeeping to show how fresh it is and why the last update failed.

use chrono::{DateTime, Utc};
use thiserror::Error;

use fotd_core::{ErrorKind, FlavorError, FlavorInfo};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Fetching,
}

/// Why an update did not replace the cached flavor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateFailure {
    /// Credentials were rejected. Scheduled updates stop until a manual
    /// refresh succeeds.
    #[error("reauthorization required: {message}")]
    ReauthRequired { message: String },

    /// Anything else. The next scheduled tick tries again.
    #[error("update failed: {message}")]
    Transient { kind: ErrorKind, message: String },

    /// The host shut down while the fetch was in flight.
    #[error("update cancelled by shutdown")]
    Cancelled,
}

impl UpdateFailure {
    /// Maps a provider error onto the coordinator's failure classes.
    #[must_use]
    pub fn classify(err: &FlavorError) -> Self {
        match err {
            FlavorError::Authentication(_) => UpdateFailure::ReauthRequired {
                message: err.to_string(),
            },
            FlavorError::Communication(_)
            | FlavorError::LocationNotFound { .. }
            | FlavorError::FlavorNotAvailable { .. }
            | FlavorError::Config(_) => UpdateFailure::Transient {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }

    /// A failure the taxonomy does not describe (a panicking provider task,
    /// for instance), treated as a transient communication failure.
    #[must_use]
    pub fn unclassified(message: impl Into<String>) -> Self {
        UpdateFailure::Transient {
            kind: ErrorKind::Communication,
            message: message.into(),
        }
    }

    /// Error kind behind the failure, when one is known.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            UpdateFailure::ReauthRequired { .. } => Some(ErrorKind::Authentication),
            UpdateFailure::Transient { kind, .. } => Some(*kind),
            UpdateFailure::Cancelled => None,
        }
    }
}

/// Point-in-time view of one coordinator.
///
/// `flavor` and `last_success` only ever change together, on a successful
/// fetch. Failures touch `last_attempt`, `last_error` and `needs_reauth`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlavorSnapshot {
    pub flavor: Option<FlavorInfo>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_error: Option<UpdateFailure>,
    pub phase: Phase,
    pub needs_reauth: bool,
}

impl FlavorSnapshot {
    /// `true` once any fetch has succeeded.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.flavor.is_some()
    }

    pub(crate) fn record_success(&mut self, flavor: FlavorInfo, at: DateTime<Utc>) {
        self.flavor = Some(flavor);
        self.last_success = Some(at);
        self.last_error = None;
        self.needs_reauth = false;
        self.phase = Phase::Idle;
    }

    pub(crate) fn record_failure(&mut self, failure: &UpdateFailure) {
        self.phase = Phase::Idle;
        match failure {
            UpdateFailure::Cancelled => {}
            UpdateFailure::ReauthRequired { .. } => {
                self.needs_reauth = true;
                self.last_error = Some(failure.clone());
            }
            UpdateFailure::Transient { .. } => {
                self.last_error = Some(failure.clone());
            }
        }
    }
}
