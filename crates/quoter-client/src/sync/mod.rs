//! Server sync.
//!
//! One sync cycle fetches a batch from the remote, maps each item to a quote
//! in the `"Server"` category, folds the batch into the store under the
//! configured [`MergePolicy`], and optionally pushes the local collection
//! back out. Scheduling lives with the caller: the daemon runs cycles on a
//! timer, the CLI runs a single one.

use tokio::sync::Mutex;

use crate::error::Result;
use crate::quote::Quote;
use crate::settings::SyncSettings;
use crate::store::QuoteStore;

mod policy;
mod remote;

pub use policy::MergePolicy;
#[cfg(feature = "sync")]
pub use remote::HttpRemote;
pub use remote::{RemotePost, RemoteSource};

/// Result of a completed sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOutcome {
    /// Remote items kept after truncating to the batch size.
    pub fetched: usize,
    /// Remote quotes that made it into the collection.
    pub added: usize,
    /// Local quotes pushed to the remote, zero when pushing is disabled.
    pub pushed: usize,
}

/// Fetch one batch from the remote, mapped to quotes.
pub async fn fetch_batch(remote: &dyn RemoteSource, batch_size: usize) -> Result<Vec<Quote>> {
    let posts = remote.fetch().await?;
    Ok(posts
        .into_iter()
        .take(batch_size)
        .map(RemotePost::into_quote)
        .collect())
}

/// Run one sync cycle.
///
/// The store lock is only held while merging, never across the network, so
/// other mutations can interleave with the fetch. The merge starts from the
/// persisted collection, not the in-memory copy. A failed fetch leaves the
/// store untouched. A failed push is logged and does not undo the merge.
pub async fn sync(
    store: &Mutex<QuoteStore>,
    remote: &dyn RemoteSource,
    settings: &SyncSettings,
) -> Result<SyncOutcome> {
    let batch = fetch_batch(remote, settings.batch_size).await?;
    let fetched = batch.len();

    let (added, local) = {
        let mut store = store.lock().await;
        // Another process may have written since this store last loaded
        store.load();
        let added = settings.policy.apply(&mut store, batch)?;
        let local = settings.push.then(|| store.quotes().to_vec());
        (added, local)
    };

    tracing::info!(fetched, added, policy = %settings.policy, "merged remote quotes");

    let mut pushed = 0;
    if let Some(local) = local {
        match remote.push(&local).await {
            Ok(()) => pushed = local.len(),
            Err(e) => tracing::error!("failed to push local quotes: {e}"),
        }
    }

    Ok(SyncOutcome {
        fetched,
        added,
        pushed,
    })
}
