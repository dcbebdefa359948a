//! Typed failure kinds shared by every provider and by the coordinator.
//!
//! The tree mirrors the provider contract:
//!
//! ```text
//! FlavorError
//! ├── Communication(CommunicationError)
//! │   ├── Timeout
//! │   ├── RateLimited
//! │   ├── Network
//! │   ├── UnexpectedStatus
//! │   ├── Malformed
//! │   └── RetriesExhausted ── boxes the last transient error
//! ├── Authentication
//! ├── LocationNotFound
//! ├── FlavorNotAvailable
//! └── Config(ProviderConfigError)
//! ```
//!
//! The provider-facing types are `Clone` so one fetch outcome can be handed
//! to all callers awaiting the same in-flight refresh.

use thiserror::Error;

/// Flat view of the taxonomy, used where callers only need the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Timeout,
    RateLimited,
    Network,
    /// Any other communication failure (bad status, malformed body).
    Communication,
    Authentication,
    LocationNotFound,
    FlavorNotAvailable,
    Config,
}

/// Root error for anything a flavor provider can report.
#[derive(Debug, Clone, Error)]
pub enum FlavorError {
    #[error(transparent)]
    Communication(#[from] CommunicationError),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("location \"{location_id}\" not found")]
    LocationNotFound { location_id: String },

    #[error("no flavor published for location \"{location_id}\": {reason}")]
    FlavorNotAvailable { location_id: String, reason: String },

    #[error(transparent)]
    Config(#[from] ProviderConfigError),
}

impl FlavorError {
    #[must_use]
    pub fn location_not_found(location_id: &str) -> Self {
        FlavorError::LocationNotFound {
            location_id: location_id.to_owned(),
        }
    }

    #[must_use]
    pub fn flavor_not_available(location_id: &str, reason: impl Into<String>) -> Self {
        FlavorError::FlavorNotAvailable {
            location_id: location_id.to_owned(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn malformed(context: impl Into<String>, reason: impl Into<String>) -> Self {
        FlavorError::Communication(CommunicationError::Malformed {
            context: context.into(),
            reason: reason.into(),
        })
    }

    /// The most specific kind of this error. Exhausted retries report the
    /// kind of the last underlying failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlavorError::Communication(e) => e.kind(),
            FlavorError::Authentication(_) => ErrorKind::Authentication,
            FlavorError::LocationNotFound { .. } => ErrorKind::LocationNotFound,
            FlavorError::FlavorNotAvailable { .. } => ErrorKind::FlavorNotAvailable,
            FlavorError::Config(_) => ErrorKind::Config,
        }
    }

    /// HTTP status carried by the innermost communication error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            FlavorError::Communication(e) => e.root().status(),
            _ => None,
        }
    }

    /// Rewrites an upstream 404 into [`FlavorError::LocationNotFound`].
    ///
    /// Used on requests whose URL embeds the store id, where "page not
    /// found" means the store does not exist.
    #[must_use]
    pub fn not_found_as_location(self, location_id: &str) -> Self {
        if self.status() == Some(404) {
            FlavorError::location_not_found(location_id)
        } else {
            self
        }
    }
}

/// Network and transport layer failures.
#[derive(Debug, Clone, Error)]
pub enum CommunicationError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("rate limited by {url}{}", retry_hint(.retry_after_secs))]
    RateLimited {
        url: String,
        retry_after_secs: Option<u64>,
    },

    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("malformed response for {context}: {reason}")]
    Malformed { context: String, reason: String },

    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<CommunicationError>,
    },
}

impl CommunicationError {
    /// Peels off [`CommunicationError::RetriesExhausted`] wrappers.
    #[must_use]
    pub fn root(&self) -> &CommunicationError {
        match self {
            CommunicationError::RetriesExhausted { last, .. } => last.root(),
            other => other,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            CommunicationError::Timeout { .. } => ErrorKind::Timeout,
            CommunicationError::RateLimited { .. } => ErrorKind::RateLimited,
            CommunicationError::Network { .. } => ErrorKind::Network,
            _ => ErrorKind::Communication,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            CommunicationError::UnexpectedStatus { status, .. } => Some(*status),
            CommunicationError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Returns `true` when another attempt may succeed.
    ///
    /// Transient: timeouts, connection failures, 429, 408 and 5xx.
    /// Everything else (other 4xx, unparseable bodies) fails the same way
    /// on every attempt.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            CommunicationError::Timeout { .. }
            | CommunicationError::RateLimited { .. }
            | CommunicationError::Network { .. } => true,
            CommunicationError::UnexpectedStatus { status, .. } => {
                *status == 408 || (500..600).contains(status)
            }
            CommunicationError::Malformed { .. } | CommunicationError::RetriesExhausted { .. } => {
                false
            }
        }
    }
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    retry_after_secs.map_or_else(String::new, |s| format!(" (retry after {s}s)"))
}

/// A provider option that is present but unusable, or required and absent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderConfigError {
    #[error("missing required provider option \"{0}\"")]
    Missing(String),

    #[error("invalid provider option \"{key}\": {reason}")]
    Invalid { key: String, reason: String },
}

/// Process configuration and stores file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read stores file {path}: {source}")]
    StoresFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse stores file: {0}")]
    StoresFileParse(#[from] serde_yaml::Error),

    #[error("unknown provider \"{id}\"; expected one of: {expected}")]
    UnknownProvider { id: String, expected: String },

    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> CommunicationError {
        CommunicationError::Network {
            url: "https://example.com".to_owned(),
            message: "connection reset".to_owned(),
        }
    }

    #[test]
    fn exhausted_retries_report_root_kind() {
        let err = FlavorError::Communication(CommunicationError::RetriesExhausted {
            attempts: 3,
            last: Box::new(network()),
        });
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("3 attempts"));
    }

    #[test]
    fn server_errors_are_transient_client_errors_are_not() {
        let status = |status| CommunicationError::UnexpectedStatus {
            status,
            url: "u".to_owned(),
        };
        assert!(status(500).is_transient());
        assert!(status(503).is_transient());
        assert!(status(408).is_transient());
        assert!(!status(400).is_transient());
        assert!(!status(403).is_transient());
        assert!(!status(404).is_transient());
    }

    #[test]
    fn malformed_is_not_transient() {
        let FlavorError::Communication(err) = FlavorError::malformed("ctx", "bad json") else {
            panic!("expected communication error");
        };
        assert!(!err.is_transient());
        assert_eq!(err.kind(), ErrorKind::Communication);
    }

    #[test]
    fn not_found_as_location_only_rewrites_404() {
        let not_found = FlavorError::Communication(CommunicationError::UnexpectedStatus {
            status: 404,
            url: "https://example.com/restaurants/x".to_owned(),
        });
        assert!(matches!(
            not_found.not_found_as_location("x"),
            FlavorError::LocationNotFound { ref location_id } if location_id == "x"
        ));

        let server = FlavorError::Communication(CommunicationError::UnexpectedStatus {
            status: 500,
            url: "u".to_owned(),
        });
        assert_eq!(server.not_found_as_location("x").kind(), ErrorKind::Communication);
    }

    #[test]
    fn rate_limited_message_includes_hint() {
        let err = CommunicationError::RateLimited {
            url: "https://example.com".to_owned(),
            retry_after_secs: Some(12),
        };
        assert!(err.to_string().contains("retry after 12s"));
        assert_eq!(err.status(), Some(429));
    }
}
