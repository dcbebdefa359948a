//! The uniform contract every store chain implements.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use fotd_core::{FlavorError, FlavorInfo, LocationInfo, ProviderId};

/// Number of days returned by `get_upcoming_flavors` when the caller does
/// not choose.
pub const DEFAULT_UPCOMING_DAYS: usize = 7;

/// A scheduled flavor: the day it is served and what is served.
pub type UpcomingFlavor = (NaiveDate, FlavorInfo);

/// Optional abilities a provider advertises up front, so callers can check
/// support instead of guessing from an empty result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// `get_upcoming_flavors` returns real data.
    pub upcoming_flavors: bool,
    /// The chain has a small hard-wired store list; an empty search term
    /// lists all of it.
    pub fixed_catalog: bool,
}

/// One store chain's client.
///
/// Implementations own their own rate limiter and borrow the shared HTTP
/// client. They must raise the most specific [`FlavorError`] they can and
/// never return a placeholder value in place of an error.
#[async_trait]
pub trait FlavorProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Stable lowercase registry key.
    fn provider_id(&self) -> &'static str {
        self.id().as_str()
    }

    fn provider_name(&self) -> &'static str {
        self.id().display_name()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Finds stores by city, zip or address. Zero matches is `Ok(vec![])`.
    ///
    /// # Errors
    ///
    /// [`FlavorError::LocationNotFound`] when the upstream rejects the query
    /// itself, communication errors for transport failures.
    async fn search_locations(
        &self,
        search_term: &str,
        state: Option<&str>,
    ) -> Result<Vec<LocationInfo>, FlavorError>;

    /// # Errors
    ///
    /// [`FlavorError::LocationNotFound`] when the id is well-formed but the
    /// upstream has no such store.
    async fn get_location_by_id(&self, location_id: &str) -> Result<LocationInfo, FlavorError>;

    /// Today's flavor. The returned name is never empty.
    ///
    /// # Errors
    ///
    /// [`FlavorError::FlavorNotAvailable`] when the store exists but nothing
    /// is published for today.
    async fn get_current_flavor(&self, location_id: &str) -> Result<FlavorInfo, FlavorError>;

    /// Flavors from today onward, ascending by date, at most `days` entries.
    ///
    /// Returns an empty list unless [`Capabilities::upcoming_flavors`] is set.
    ///
    /// # Errors
    ///
    /// Same as [`FlavorProvider::get_current_flavor`].
    async fn get_upcoming_flavors(
        &self,
        _location_id: &str,
        _days: usize,
    ) -> Result<Vec<UpcomingFlavor>, FlavorError> {
        Ok(Vec::new())
    }

    /// Health probe. Never fails; any error is logged and reported as `false`.
    async fn test_connection(&self, location_id: &str) -> bool {
        match self.get_current_flavor(location_id).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(
                    provider = self.provider_id(),
                    location_id,
                    error = %e,
                    "connection test failed"
                );
                false
            }
        }
    }
}

/// Keeps entries dated `today` or later, sorted ascending, one per day,
/// truncated to `days`.
#[must_use]
pub fn select_upcoming(
    mut entries: Vec<UpcomingFlavor>,
    today: NaiveDate,
    days: usize,
) -> Vec<UpcomingFlavor> {
    entries.retain(|(date, _)| *date >= today);
    entries.sort_by_key(|(date, _)| *date);
    entries.dedup_by_key(|(date, _)| *date);
    entries.truncate(days);
    entries
}
