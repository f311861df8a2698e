//! Sync component.
//!
//! Handles periodic synchronization with the remote quote source.

use std::sync::Arc;

use eyre::Result;
use quoter_client::settings::SyncSettings;
use quoter_client::sync::{self, HttpRemote, RemoteSource};
use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

use crate::{
    daemon::{Component, DaemonHandle},
    events::DaemonEvent,
};

/// Upper bound for the backed-off period, before jitter.
const MAX_BACKOFF_SECS: f64 = 60.0 * 30.0;

/// Commands that can be sent to the sync task.
enum SyncCommand {
    /// Trigger an immediate sync.
    ForceSync,
    /// Settings changed; pick up the new period.
    Reload,
    /// Stop the sync loop.
    Stop,
}

/// Sync component - handles periodic server synchronization.
///
/// This component:
/// - Runs a sync cycle on start and then on a fixed interval
/// - Never runs two cycles at once; missed ticks are skipped
/// - Optionally backs off exponentially on failures
/// - Responds to ForceSync events for immediate sync
/// - Emits SyncStarted/SyncCompleted/SyncFailed events
pub struct SyncComponent {
    remote: Option<Arc<dyn RemoteSource>>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
    command_tx: Option<mpsc::Sender<SyncCommand>>,
}

impl SyncComponent {
    /// Create a sync component talking to the configured HTTP endpoint.
    pub fn new() -> Self {
        Self {
            remote: None,
            task_handle: None,
            command_tx: None,
        }
    }

    /// Create a sync component with a specific remote source.
    pub fn with_remote(remote: Arc<dyn RemoteSource>) -> Self {
        Self {
            remote: Some(remote),
            task_handle: None,
            command_tx: None,
        }
    }

    async fn send(&self, cmd: SyncCommand) {
        if let Some(tx) = &self.command_tx {
            let _ = tx.send(cmd).await;
        }
    }
}

impl Default for SyncComponent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Component for SyncComponent {
    fn name(&self) -> &'static str {
        "sync"
    }

    async fn start(&mut self, handle: DaemonHandle) -> Result<()> {
        let settings = handle.settings().await.sync.clone();

        if !settings.enabled {
            tracing::info!("sync disabled in settings, not starting sync loop");
            return Ok(());
        }

        let remote = match &self.remote {
            Some(remote) => remote.clone(),
            None => {
                let remote: Arc<dyn RemoteSource> = Arc::new(HttpRemote::new(
                    settings.endpoint.clone(),
                    settings.request_timeout(),
                )?);
                self.remote = Some(remote.clone());
                remote
            }
        };

        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        self.command_tx = Some(cmd_tx);

        // Spawn the sync loop with its own copy of the handle
        self.task_handle = Some(tokio::spawn(sync_loop(handle, remote, cmd_rx)));

        tracing::info!(
            endpoint = %settings.endpoint,
            frequency = settings.frequency,
            policy = %settings.policy,
            "sync component started"
        );
        Ok(())
    }

    async fn handle_event(&mut self, event: &DaemonEvent) -> Result<()> {
        match event {
            DaemonEvent::ForceSync => {
                tracing::info!("force sync requested");
                self.send(SyncCommand::ForceSync).await;
            }
            DaemonEvent::SettingsReloaded => self.send(SyncCommand::Reload).await,
            _ => {}
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.send(SyncCommand::Stop).await;
        if let Some(handle) = self.task_handle.take() {
            // Give the task a moment to shut down gracefully
            let _ = tokio::time::timeout(std::time::Duration::from_secs(5), handle).await;
        }
        tracing::info!("sync component stopped");
        Ok(())
    }
}

/// The main sync loop.
///
/// The first tick of the interval fires immediately, so a cycle runs as soon
/// as the daemon starts.
async fn sync_loop(
    handle: DaemonHandle,
    remote: Arc<dyn RemoteSource>,
    mut cmd_rx: mpsc::Receiver<SyncCommand>,
) {
    tracing::info!("sync loop starting");

    let mut ticker = new_ticker(&handle.settings().await.sync);

    // Don't back off by more than 30 mins (with a random jitter of up to 1 min)
    let max_interval: f64 = MAX_BACKOFF_SECS + rand::thread_rng().gen_range(0.0..60.0);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                do_sync_tick(&handle, remote.as_ref(), &mut ticker, max_interval).await;
            }
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SyncCommand::ForceSync) => {
                        tracing::info!("executing force sync");
                        do_sync_tick(&handle, remote.as_ref(), &mut ticker, max_interval).await;
                    }
                    Some(SyncCommand::Reload) => {
                        let settings = handle.settings().await.sync.clone();
                        tracing::info!(frequency = settings.frequency, "sync settings reloaded");
                        ticker = new_ticker(&settings);
                        // Don't sync again straight away just because settings changed
                        ticker.reset();
                    }
                    Some(SyncCommand::Stop) | None => {
                        tracing::info!("sync loop stopping");
                        break;
                    }
                }
            }
        }
    }
}

fn new_ticker(settings: &SyncSettings) -> time::Interval {
    let mut ticker = time::interval(settings.period());

    // Without this, a slow cycle would be followed by a burst of catch-up
    // cycles.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Execute a single sync cycle.
async fn do_sync_tick(
    handle: &DaemonHandle,
    remote: &dyn RemoteSource,
    ticker: &mut time::Interval,
    max_interval: f64,
) {
    // Clone settings since we need them across await points
    let settings = handle.settings().await.sync.clone();

    tracing::info!("sync tick");
    handle.emit(DaemonEvent::SyncStarted);

    match sync::sync(handle.store(), remote, &settings).await {
        Err(e) => {
            tracing::error!("sync tick failed with {e}");

            handle.emit(DaemonEvent::SyncFailed {
                error: e.to_string(),
            });

            if settings.backoff {
                let mut rng = rand::thread_rng();
                let mut new_interval = ticker.period().as_secs_f64() * rng.gen_range(2.0..2.2);

                if new_interval > max_interval {
                    new_interval = max_interval;
                }

                *ticker = time::interval(time::Duration::from_secs(new_interval as u64));
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                ticker.reset_after(time::Duration::from_secs(new_interval as u64));

                tracing::error!("backing off, next sync tick in {new_interval}");
            }
        }
        Ok(outcome) => {
            tracing::info!(
                fetched = outcome.fetched,
                added = outcome.added,
                pushed = outcome.pushed,
                "sync complete"
            );

            handle.emit(DaemonEvent::SyncCompleted {
                fetched: outcome.fetched,
                added: outcome.added,
                pushed: outcome.pushed,
            });

            // Reset backoff on success
            if ticker.period() != settings.period() {
                *ticker = new_ticker(&settings);
                ticker.reset();
            }
        }
    }
}
