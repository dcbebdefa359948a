//! Polling lifecycle and cache for one (provider, location) pair.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use fotd_core::{FlavorInfo, UpdateInterval};
use fotd_providers::FlavorProvider;

use crate::snapshot::{FlavorSnapshot, Phase, UpdateFailure};

/// Result of one fetch, shared by every caller that awaited it.
pub type RefreshOutcome = Result<FlavorInfo, UpdateFailure>;

type InFlight = Shared<BoxFuture<'static, RefreshOutcome>>;

const SUBSCRIBER_BUFFER: usize = 16;

/// Owns one provider session and one cached flavor.
///
/// Cheap to clone; clones share the same cache, in-flight fetch and
/// subscriber list.
#[derive(Clone)]
pub struct FlavorCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    provider: Arc<dyn FlavorProvider>,
    location_id: String,
    interval: Duration,
    state: watch::Sender<FlavorSnapshot>,
    updates: broadcast::Sender<FlavorSnapshot>,
    in_flight: Mutex<Option<InFlight>>,
    shutdown: CancellationToken,
}

impl FlavorCoordinator {
    /// `shutdown` is the host's token. The coordinator listens on a child
    /// token, so [`FlavorCoordinator::shutdown`] stops only this one.
    #[must_use]
    pub fn new(
        provider: Arc<dyn FlavorProvider>,
        location_id: impl Into<String>,
        interval: UpdateInterval,
        shutdown: &CancellationToken,
    ) -> Self {
        let location_id = location_id.into();
        let name = format!("flavor_coordinator_{}_{location_id}", provider.provider_id());
        let (state, _) = watch::channel(FlavorSnapshot::default());
        let (updates, _) = broadcast::channel(SUBSCRIBER_BUFFER);

        Self {
            inner: Arc::new(Inner {
                name,
                provider,
                location_id,
                interval: interval.as_duration(),
                state,
                updates,
                in_flight: Mutex::new(None),
                shutdown: shutdown.child_token(),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<dyn FlavorProvider> {
        &self.inner.provider
    }

    #[must_use]
    pub fn location_id(&self) -> &str {
        &self.inner.location_id
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Current cache entry and status.
    #[must_use]
    pub fn snapshot(&self) -> FlavorSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Notifications fired only when a fetch succeeds. Dropping the
    /// subscription unsubscribes.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.inner.updates.subscribe(),
        }
    }

    /// Fetches now, or joins the fetch already in flight.
    ///
    /// Does not move the polling schedule.
    ///
    /// # Errors
    ///
    /// Returns the classified failure; the cached flavor is left as it was.
    pub async fn refresh(&self) -> RefreshOutcome {
        if self.inner.shutdown.is_cancelled() {
            return Err(UpdateFailure::Cancelled);
        }

        let fetch = {
            let mut slot = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(existing) = slot.as_ref() {
                tracing::debug!(coordinator = %self.inner.name, "joining in-flight refresh");
                existing.clone()
            } else {
                let started = spawn_fetch(Arc::clone(&self.inner));
                *slot = Some(started.clone());
                started
            }
        };
        fetch.await
    }

    /// The setup-time fetch. Same as [`FlavorCoordinator::refresh`] with an
    /// extra log line so hosts can decide whether a failure aborts setup.
    ///
    /// # Errors
    ///
    /// Same as [`FlavorCoordinator::refresh`].
    pub async fn first_refresh(&self) -> RefreshOutcome {
        let outcome = self.refresh().await;
        match &outcome {
            Ok(flavor) => tracing::info!(
                coordinator = %self.inner.name,
                flavor = flavor.name(),
                "initial flavor loaded"
            ),
            Err(failure) => tracing::warn!(
                coordinator = %self.inner.name,
                error = %failure,
                "initial refresh failed"
            ),
        }
        outcome
    }

    /// Polls on the configured interval until shutdown.
    ///
    /// The first tick fires one interval after the call. Ticks are skipped
    /// while reauthorization is required. Manual refreshes do not shift
    /// the schedule; ticks missed while a fetch runs are dropped.
    pub async fn run(&self) {
        let period = self.inner.interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let span = tracing::info_span!("coordinator", name = %self.inner.name);
        async {
            tracing::debug!(interval_secs = period.as_secs(), "polling started");
            loop {
                tokio::select! {
                    () = self.inner.shutdown.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let paused = self.inner.state.borrow().needs_reauth;
                if paused {
                    tracing::debug!("reauthorization required, skipping scheduled refresh");
                    continue;
                }
                // Outcome is already recorded in the snapshot.
                let _ = self.refresh().await;
            }
            tracing::debug!("polling stopped");
        }
        .instrument(span)
        .await;
    }

    /// Runs [`FlavorCoordinator::run`] on its own task.
    #[must_use]
    pub fn spawn(&self) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.run().await })
    }

    /// Stops polling and abandons any in-flight fetch. The cache keeps its
    /// last value.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }
}

impl std::fmt::Debug for FlavorCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlavorCoordinator")
            .field("name", &self.inner.name)
            .field("interval", &self.inner.interval)
            .finish_non_exhaustive()
    }
}

/// Starts the fetch on its own task so it completes even if every caller
/// stops waiting, and wraps its handle in a future all callers can share.
fn spawn_fetch(inner: Arc<Inner>) -> InFlight {
    let handle = tokio::spawn(inner.fetch());
    async move {
        handle.await.unwrap_or_else(|join| {
            Err(UpdateFailure::unclassified(format!("refresh task failed: {join}")))
        })
    }
    .boxed()
    .shared()
}

impl Inner {
    async fn fetch(self: Arc<Self>) -> RefreshOutcome {
        self.state.send_modify(|s| {
            s.phase = Phase::Fetching;
            s.last_attempt = Some(Utc::now());
        });
        tracing::debug!(coordinator = %self.name, "fetching current flavor");

        // The provider call runs on its own task so a panic surfaces as a
        // JoinError instead of tearing down the fetch.
        let provider = Arc::clone(&self.provider);
        let location_id = self.location_id.clone();
        let mut call =
            tokio::spawn(async move { provider.get_current_flavor(&location_id).await });

        let outcome = tokio::select! {
            () = self.shutdown.cancelled() => {
                call.abort();
                Err(UpdateFailure::Cancelled)
            }
            joined = &mut call => match joined {
                Ok(Ok(flavor)) => Ok(flavor),
                Ok(Err(err)) => Err(UpdateFailure::classify(&err)),
                Err(join) => Err(UpdateFailure::unclassified(format!(
                    "provider task failed: {join}"
                ))),
            },
        };

        self.record(&outcome);
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        outcome
    }

    fn record(&self, outcome: &RefreshOutcome) {
        match outcome {
            Ok(flavor) => {
                let now = Utc::now();
                self.state
                    .send_modify(|s| s.record_success(flavor.clone(), now));
                tracing::info!(coordinator = %self.name, flavor = flavor.name(), "flavor updated");
                // No receivers is fine.
                let _ = self.updates.send(self.state.borrow().clone());
            }
            Err(failure) => {
                self.state.send_modify(|s| s.record_failure(failure));
                match failure {
                    UpdateFailure::ReauthRequired { .. } => tracing::error!(
                        coordinator = %self.name,
                        error = %failure,
                        "provider rejected credentials; scheduled updates paused"
                    ),
                    UpdateFailure::Transient { .. } => tracing::warn!(
                        coordinator = %self.name,
                        error = %failure,
                        "flavor update failed; keeping cached value"
                    ),
                    UpdateFailure::Cancelled => {
                        tracing::debug!(coordinator = %self.name, "refresh abandoned at shutdown");
                    }
                }
            }
        }
    }
}

/// Success notifications from one coordinator.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<FlavorSnapshot>,
}

impl Subscription {
    /// Next successful snapshot, or `None` once the coordinator is gone.
    ///
    /// A subscriber that falls behind skips to the newest notifications.
    pub async fn recv(&mut self) -> Option<FlavorSnapshot> {
        loop {
            match self.rx.recv().await {
                Ok(snapshot) => return Some(snapshot),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
