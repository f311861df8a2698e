//! Daemon events.
//!
//! Events are the primary communication mechanism within the daemon.
//! Components emit events to notify others of state changes, and handle
//! events to react to changes elsewhere in the system.

use quoter_client::{CategoryFilter, StoreChange};

/// Events that flow through the daemon's event bus.
///
/// Events are broadcast to all components. Each component decides which
/// events it cares about in its `handle_event` implementation.
#[derive(Debug, Clone)]
pub enum DaemonEvent {
    // ---- Store ----
    /// The quote collection changed (load, add, import or sync).
    QuotesChanged(StoreChange),

    /// The user picked a category in the filter control.
    CategorySelected(CategoryFilter),

    // ---- Sync ----
    /// A sync cycle is starting.
    SyncStarted,

    /// Sync completed successfully.
    SyncCompleted {
        /// Remote items fetched in this cycle.
        fetched: usize,
        /// Remote quotes merged into the collection.
        added: usize,
        /// Local quotes pushed to the remote.
        pushed: usize,
    },

    /// Sync failed.
    SyncFailed {
        /// Error message describing what went wrong.
        error: String,
    },

    /// Request an immediate sync (external trigger).
    ForceSync,

    /// Settings have changed, components should reload if needed.
    SettingsReloaded,

    // ---- Lifecycle ----
    /// Request graceful shutdown of the daemon.
    ShutdownRequested,
}
