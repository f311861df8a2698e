//! The daemon: a shared quote store, an event bus, and the components
//! reacting to it.
//!
//! [`DaemonBuilder`] assembles a [`Daemon`]; components receive a
//! [`DaemonHandle`] on start and talk to each other only through
//! [`DaemonEvent`]s.

use std::sync::Arc;

use eyre::{Context, Result};
use quoter_client::{QuoteStore, Settings};
use tokio::sync::{Mutex, RwLock, broadcast};

use crate::events::DaemonEvent;

// ============================================================================
// DaemonState
// ============================================================================

/// Shared state owned by the daemon.
///
/// The state is wrapped in an `Arc` and accessed via [`DaemonHandle`].
pub struct DaemonState {
    // Event bus
    event_tx: broadcast::Sender<DaemonEvent>,

    // Configuration (mutable - can be reloaded)
    settings: RwLock<Settings>,

    // The quote collection, shared by every component
    store: Arc<Mutex<QuoteStore>>,
}

// ============================================================================
// DaemonHandle
// ============================================================================

/// Cloneable access to the event bus, the settings and the quote store.
///
/// # Example
///
/// ```ignore
/// // Emit an event
/// handle.emit(DaemonEvent::ForceSync);
///
/// // Access settings
/// let settings = handle.settings().await;
/// let period = settings.sync.period();
///
/// // Mutate the collection
/// handle.store().lock().await.append(quote)?;
/// ```
#[derive(Clone)]
pub struct DaemonHandle {
    state: Arc<DaemonState>,
}

impl DaemonHandle {
    // ---- Events ----

    /// Emit an event to the daemon's event bus.
    ///
    /// This is fire-and-forget - if no receivers are listening, the event is
    /// dropped.
    pub fn emit(&self, event: DaemonEvent) {
        if let Err(e) = self.state.event_tx.send(event) {
            tracing::warn!("failed to emit event (no receivers?): {e}");
        }
    }

    /// Subscribe to the event bus.
    ///
    /// Returns a receiver that will receive all events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<DaemonEvent> {
        self.state.event_tx.subscribe()
    }

    /// Request graceful shutdown of the daemon.
    pub fn shutdown(&self) {
        self.emit(DaemonEvent::ShutdownRequested);
    }

    // ---- Configuration ----

    /// Get the current settings.
    ///
    /// This acquires a read lock on the settings. Clone them if you need to
    /// hold onto them across await points.
    pub async fn settings(&self) -> tokio::sync::RwLockReadGuard<'_, Settings> {
        self.state.settings.read().await
    }

    /// Reload settings from disk and emit a SettingsReloaded event.
    pub async fn reload_settings(&self) -> Result<()> {
        let new_settings = Settings::new()?;
        self.replace_settings(new_settings).await;
        Ok(())
    }

    /// Swap in new settings and emit a SettingsReloaded event.
    pub async fn replace_settings(&self, settings: Settings) {
        *self.state.settings.write().await = settings;
        self.emit(DaemonEvent::SettingsReloaded);
        tracing::info!("settings reloaded");
    }

    // ---- Store ----

    /// Get the shared quote store.
    pub fn store(&self) -> &Arc<Mutex<QuoteStore>> {
        &self.state.store
    }
}

impl std::fmt::Debug for DaemonHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaemonHandle").finish_non_exhaustive()
    }
}

// ============================================================================
// Component Trait
// ============================================================================

/// A daemon component that handles a specific domain.
///
/// # Lifecycle
///
/// 1. **Construction**: Component is created (usually via `new()`)
/// 2. **Start**: `start()` is called with a [`DaemonHandle`]
/// 3. **Running**: `handle_event()` is called for each event on the bus
/// 4. **Shutdown**: `stop()` is called for cleanup
#[async_trait::async_trait]
pub trait Component: Send + Sync {
    /// Human-readable name for logging and debugging.
    fn name(&self) -> &'static str;

    /// Called once at startup.
    ///
    /// Store the handle if you need to emit events or access daemon resources
    /// later.
    async fn start(&mut self, handle: DaemonHandle) -> Result<()>;

    /// Handle an incoming event.
    ///
    /// Events emitted here will be processed in subsequent event loop
    /// iterations.
    async fn handle_event(&mut self, event: &DaemonEvent) -> Result<()>;

    /// Called on graceful shutdown.
    async fn stop(&mut self) -> Result<()>;
}

// ============================================================================
// Daemon
// ============================================================================

/// The main daemon orchestrator.
///
/// # Event Loop
///
/// 1. Wait for an event on the bus
/// 2. Dispatch the event to all components (in registration order)
/// 3. Components may emit new events in response
/// 4. Repeat until `ShutdownRequested` is received
///
/// Store change notifications are forwarded onto the bus as
/// [`DaemonEvent::QuotesChanged`] while components are running.
pub struct Daemon {
    components: Vec<Box<dyn Component>>,
    handle: DaemonHandle,
    forwarder: Option<tokio::task::JoinHandle<()>>,
    // Subscribed at build time so events emitted while components start are
    // not lost before the loop runs
    event_rx: Option<broadcast::Receiver<DaemonEvent>>,
}

impl Daemon {
    /// Create a new daemon builder.
    pub fn builder(settings: Settings) -> DaemonBuilder {
        DaemonBuilder::new(settings)
    }

    /// Get a clone of the daemon handle.
    pub fn handle(&self) -> DaemonHandle {
        self.handle.clone()
    }

    /// Start all components.
    ///
    /// This must be called before `run_event_loop()`.
    pub async fn start_components(&mut self) -> Result<()> {
        let changes = self.handle.store().lock().await.subscribe();
        self.forwarder = Some(tokio::spawn(forward_store_changes(
            self.handle.clone(),
            changes,
        )));

        for component in &mut self.components {
            tracing::info!(component = component.name(), "starting component");
            component
                .start(self.handle.clone())
                .await
                .with_context(|| format!("failed to start component: {}", component.name()))?;
        }
        Ok(())
    }

    /// Run the daemon event loop.
    ///
    /// This processes events until a ShutdownRequested event is received.
    pub async fn run_event_loop(&mut self) -> Result<()> {
        let mut event_rx = self
            .event_rx
            .take()
            .unwrap_or_else(|| self.handle.subscribe());
        loop {
            match event_rx.recv().await {
                Ok(DaemonEvent::ShutdownRequested) => {
                    tracing::info!("shutdown requested, stopping daemon");
                    break;
                }
                Ok(event) => {
                    tracing::debug!(?event, "processing event");
                    self.dispatch_event(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "event receiver lagged, some events were dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("event bus closed, stopping daemon");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Stop all components, in reverse registration order.
    pub async fn stop_components(&mut self) {
        for component in self.components.iter_mut().rev() {
            tracing::info!(component = component.name(), "stopping component");
            if let Err(e) = component.stop().await {
                tracing::error!(
                    component = component.name(),
                    error = ?e,
                    "error stopping component"
                );
            }
        }

        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }

        tracing::info!("all components stopped");
    }

    /// Start components, run the event loop and shut down.
    pub async fn run(mut self) -> Result<()> {
        self.start_components().await?;
        self.run_event_loop().await?;
        self.stop_components().await;
        tracing::info!("daemon stopped");
        Ok(())
    }

    async fn dispatch_event(&mut self, event: &DaemonEvent) {
        for component in &mut self.components {
            if let Err(e) = component.handle_event(event).await {
                tracing::error!(
                    component = component.name(),
                    error = ?e,
                    "error handling event"
                );
            }
        }
    }
}

async fn forward_store_changes(
    handle: DaemonHandle,
    mut changes: broadcast::Receiver<quoter_client::StoreChange>,
) {
    loop {
        match changes.recv().await {
            Ok(change) => handle.emit(DaemonEvent::QuotesChanged(change)),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(skipped = n, "store change receiver lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

// ============================================================================
// DaemonBuilder
// ============================================================================

/// Builder for constructing a [`Daemon`].
///
/// # Example
///
/// ```ignore
/// let daemon = Daemon::builder(settings)
///     .store(store)
///     .component(CategoryComponent::new())
///     .component(SyncComponent::new())
///     .build()?;
///
/// daemon.run().await?;
/// ```
pub struct DaemonBuilder {
    settings: Settings,
    store: Option<QuoteStore>,
    components: Vec<Box<dyn Component>>,
}

impl DaemonBuilder {
    /// Create a new daemon builder with the given settings.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            store: None,
            components: Vec::new(),
        }
    }

    /// Set the quote store.
    pub fn store(mut self, store: QuoteStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Register a component.
    ///
    /// Components are started in registration order and stopped in reverse order.
    pub fn component(mut self, component: impl Component + 'static) -> Self {
        self.components.push(Box::new(component));
        self
    }

    /// Build the daemon.
    ///
    /// Without an explicit store, the one configured in settings is opened.
    pub fn build(self) -> Result<Daemon> {
        let store = match self.store {
            Some(store) => store,
            None => self.settings.open_store(),
        };

        // Create the event bus
        let (event_tx, event_rx) = broadcast::channel(64);

        let state = Arc::new(DaemonState {
            event_tx,
            settings: RwLock::new(self.settings),
            store: Arc::new(Mutex::new(store)),
        });

        Ok(Daemon {
            components: self.components,
            handle: DaemonHandle { state },
            forwarder: None,
            event_rx: Some(event_rx),
        })
    }
}
