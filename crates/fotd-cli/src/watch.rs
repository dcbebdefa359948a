//! `fotd watch`: one coordinator per configured store, polled until the
//! process is told to stop.
//!
//! Each successful update prints one JSON sensor line on stdout. SIGHUP
//! refreshes every store immediately; Ctrl-C and SIGTERM shut down.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use fotd_coordinator::{FlavorCoordinator, FlavorSnapshot};
use fotd_core::{AppConfig, StoreConfig};
use fotd_providers::{build_shared_client, create_provider};

use crate::sensor::SensorView;

struct Watched {
    store: StoreConfig,
    coordinator: FlavorCoordinator,
}

impl Watched {
    fn emit(&self, snapshot: &FlavorSnapshot) {
        let view = SensorView::from_snapshot(
            &self.store.name,
            self.store.provider.display_name(),
            &self.store.location_id,
            snapshot,
        );
        match serde_json::to_string(&view) {
            Ok(line) => println!("{line}"),
            Err(e) => {
                tracing::error!(store = %self.store.key(), error = %e, "failed to render sensor");
            }
        }
    }
}

pub(crate) async fn run(config: &AppConfig, stores_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = stores_path.unwrap_or_else(|| config.stores_path.clone());
    let stores = fotd_core::load_stores(&path, config.default_update_interval)
        .with_context(|| format!("failed to load stores from {}", path.display()))?;
    if stores.stores.is_empty() {
        anyhow::bail!("no stores configured in {}", path.display());
    }

    let client = build_shared_client(
        &config.user_agent,
        config.http_timeout_secs,
        config.http_connect_timeout_secs,
    )
    .context("failed to build HTTP client")?;

    let shutdown = CancellationToken::new();
    let watched: Vec<Arc<Watched>> = stores
        .stores
        .into_iter()
        .map(|store| {
            tracing::debug!(
                store = %store.key(),
                name = %store.name,
                interval_minutes = store.update_interval.minutes(),
                "configured store"
            );
            let provider = create_provider(store.provider, client.clone(), store.options.clone());
            let coordinator = FlavorCoordinator::new(
                provider,
                store.location_id.clone(),
                store.update_interval,
                &shutdown,
            );
            Arc::new(Watched { store, coordinator })
        })
        .collect();

    tracing::info!(stores = watched.len(), "starting flavor watch");

    // Handlers go in before any network call so a signal during the first
    // refresh takes the clean shutdown path.
    let mut hangup = Hangup::new().context("failed to install SIGHUP handler")?;
    let stop_signal = shutdown_signal();
    tokio::pin!(stop_signal);

    // Setup failures are reported but do not stop the others; the schedule
    // retries them.
    let coordinators: Vec<FlavorCoordinator> =
        watched.iter().map(|w| w.coordinator.clone()).collect();
    if !first_refresh_all(&coordinators, &mut stop_signal).await {
        shutdown.cancel();
        tracing::info!("flavor watch stopped before the first update completed");
        return Ok(());
    }
    for w in &watched {
        w.emit(&w.coordinator.snapshot());
    }

    let mut tasks: Vec<JoinHandle<()>> = Vec::with_capacity(watched.len() * 2);
    for w in &watched {
        tasks.push(w.coordinator.spawn());

        let printer = Arc::clone(w);
        let mut updates = w.coordinator.subscribe();
        let stop = shutdown.clone();
        tasks.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = stop.cancelled() => break,
                    next = updates.recv() => match next {
                        Some(snapshot) => printer.emit(&snapshot),
                        None => break,
                    },
                }
            }
        }));
    }

    loop {
        tokio::select! {
            () = &mut stop_signal => break,
            () = hangup.recv() => {
                tracing::info!("SIGHUP received, refreshing all stores");
                for w in &watched {
                    let coordinator = w.coordinator.clone();
                    tokio::spawn(async move {
                        let _ = coordinator.refresh().await;
                    });
                }
            }
        }
    }

    shutdown.cancel();
    for task in tasks {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "watch task ended abnormally");
        }
    }
    tracing::info!("flavor watch stopped");
    Ok(())
}

/// Runs every coordinator's first refresh unless `stop` resolves first.
///
/// Returns `false` when stopped. Fetches still in flight are left for the
/// caller to cancel.
pub(crate) async fn first_refresh_all(
    coordinators: &[FlavorCoordinator],
    stop: impl Future<Output = ()>,
) -> bool {
    tokio::select! {
        biased;
        () = stop => false,
        _ = join_all(coordinators.iter().map(|c| c.first_refresh())) => true,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping coordinators");
}

/// SIGHUP listener. Never fires on platforms without it.
struct Hangup {
    #[cfg(unix)]
    signal: tokio::signal::unix::Signal,
}

impl Hangup {
    fn new() -> std::io::Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            signal: tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup())?,
        })
    }

    #[cfg(unix)]
    async fn recv(&mut self) {
        if self.signal.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }

    #[cfg(not(unix))]
    #[allow(clippy::unused_async)]
    async fn recv(&mut self) {
        std::future::pending::<()>().await;
    }
}
