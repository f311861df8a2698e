use eyre::Result;
use quoter_client::{QuoteStore, Settings};

pub mod components;
pub mod daemon;
pub mod events;

// Re-export core daemon types for convenience
pub use daemon::{Component, Daemon, DaemonBuilder, DaemonHandle};
pub use events::DaemonEvent;

// Re-export components
pub use components::{CategoryComponent, SyncComponent};

/// Boot the daemon with the standard components (category, sync) and run the
/// event loop until a shutdown signal arrives.
pub async fn boot(settings: Settings, store: QuoteStore) -> Result<()> {
    let mut daemon = Daemon::builder(settings)
        .store(store)
        .component(CategoryComponent::new())
        .component(SyncComponent::new())
        .build()?;

    let handle = daemon.handle();

    daemon.start_components().await?;

    // Spawn signal handler to emit ShutdownRequested on Ctrl+C/SIGTERM
    let signal_handle = handle.clone();
    tokio::spawn(async move {
        if let Err(e) = shutdown_signal().await {
            tracing::error!("failed to listen for shutdown signal: {e}");
            return;
        }
        tracing::info!("received shutdown signal");
        signal_handle.shutdown();
    });

    daemon.run_event_loop().await?;

    daemon.stop_components().await;

    tracing::info!("daemon shut down complete");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = signal(SignalKind::terminate())?;
    let mut int = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = term.recv() => {},
        _ = int.recv() => {},
    }
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
