//! Client-side sync engine.
//!
//! Keeps the local store and the remote store convergent: one pull near
//! process start hydrates local state, then every observed mutation arms a
//! debounce timer and the coalesced snapshot is pushed when it fires. All
//! failures are surfaced as status, never thrown into the caller; the app
//! must keep working fully offline.

pub mod client;
pub mod debounce;
mod merge;
pub mod snapshot;

pub use client::{HttpSyncClient, SyncApi, SyncError, SyncResult};
pub use debounce::DebounceTimer;
pub use merge::merge_remote;
pub use snapshot::{SyncSettings, SyncSnapshot};

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::store::LocalStore;

/// Default debounce window between the last observed mutation and a push.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(3);

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Delay after the last observed mutation before a push is issued.
    pub debounce: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl SyncConfig {
    /// Override the debounce window.
    #[must_use]
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// Coarse per-operation sync state surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    Syncing,
    Synced,
    Error,
}

/// Sync status: state plus the telemetry a status indicator renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncStatus {
    pub state: SyncState,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub message: Option<String>,
}

/// Orchestrates pull-on-start, debounced pushes, and manual triggers.
pub struct SyncEngine<A> {
    store: LocalStore,
    api: A,
    debounce: Duration,
    status: watch::Sender<SyncStatus>,
    // At most one push may be in flight at a time, including manual ones.
    push_guard: tokio::sync::Mutex<()>,
}

impl<A: SyncApi> SyncEngine<A> {
    #[must_use]
    pub fn new(store: LocalStore, api: A, config: SyncConfig) -> Self {
        let (status, _) = watch::channel(SyncStatus::default());
        Self {
            store,
            api,
            debounce: config.debounce,
            status,
            push_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Subscribe to status updates.
    #[must_use]
    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Run the engine event loop; drive it in a background task for the
    /// lifetime of the process.
    ///
    /// On start: best-effort schema migration, then exactly one pull. The
    /// hydration mutations from that pull never arm the debounce timer, so
    /// nothing is pushed before the server has had a chance to seed local
    /// state. Afterwards every observed mutation arms (or re-arms) the
    /// timer and the fully-coalesced snapshot is pushed when it fires.
    pub async fn run(&self) {
        if let Err(error) = self.api.migrate().await {
            tracing::warn!(%error, "schema migration failed; continuing local-only");
        }

        let mut revisions = self.store.subscribe();
        if let Err(error) = self.pull_and_merge().await {
            tracing::warn!(%error, "initial pull failed; continuing with local state");
        }
        // The pull's own store mutations are already settled; mark them seen
        // so hydration never triggers a push.
        revisions.mark_unchanged();

        let mut timer = DebounceTimer::new(self.debounce);
        loop {
            tokio::select! {
                changed = revisions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    timer.arm(Instant::now());
                }
                () = wait_until(timer.deadline()), if timer.is_armed() => {
                    timer.cancel();
                    if let Err(error) = self.push_snapshot().await {
                        tracing::warn!(%error, "push failed; will retry on next local change");
                    }
                }
            }
        }
    }

    /// Manual push trigger ("sync now").
    pub async fn sync_now(&self) -> SyncResult<()> {
        self.push_snapshot().await
    }

    /// Manual pull trigger; merges the remote snapshot into the store.
    pub async fn pull_now(&self) -> SyncResult<()> {
        self.pull_and_merge().await
    }

    async fn pull_and_merge(&self) -> SyncResult<()> {
        self.transition(SyncState::Syncing, None);
        match self.api.pull().await {
            Ok(remote) => {
                self.store.apply_remote(remote);
                self.transition(SyncState::Synced, None);
                Ok(())
            }
            Err(error) => {
                self.transition(SyncState::Error, Some(error.to_string()));
                Err(error)
            }
        }
    }

    async fn push_snapshot(&self) -> SyncResult<()> {
        let _in_flight = self.push_guard.lock().await;
        self.transition(SyncState::Syncing, None);
        // Snapshot after acquiring the guard so the payload reflects the
        // fully-coalesced end state of any burst of edits.
        let payload = self.store.sync_snapshot();
        match self.api.push(&payload).await {
            Ok(()) => {
                self.transition(SyncState::Synced, None);
                Ok(())
            }
            Err(error) => {
                self.transition(SyncState::Error, Some(error.to_string()));
                Err(error)
            }
        }
    }

    fn transition(&self, state: SyncState, message: Option<String>) {
        self.status.send_modify(|status| {
            if state == SyncState::Synced {
                status.last_synced_at = Some(Utc::now());
            }
            status.state = state;
            status.message = message;
        });
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
